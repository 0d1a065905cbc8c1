//! Traffic-classification condition trees
//!
//! This module holds the node model, the JSON wire codec, the canonical
//! expression renderer and parser, the tree editor and the packet evaluator.

mod ast;
pub mod cache;
pub mod codec;
pub mod editor;
mod evaluator;
pub mod parser;
mod render;
pub mod validate;

#[cfg(test)]
mod property_tests;

pub use ast::*;
pub use cache::{check_expression, get_or_parse};
pub use codec::{decode, decode_str, encode};
pub use editor::{LeafEdit, NodePath, TreeEditor};
pub use evaluator::*;
pub use parser::{parse, validate_expression};
pub use render::*;
pub use validate::{validate_cidr, validate_dscp, DSCP_MAX};
