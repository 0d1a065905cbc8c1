//! Traffic Class Core - condition trees for IPv4 traffic classification
//!
//! This crate provides the condition model, its JSON wire codec, the class
//! expression grammar, a tree editor and traffic class editing sessions,
//! with optional Python bindings via PyO3.

pub mod condition;
pub mod config;
pub mod error;
pub mod traffic_class;

#[cfg(feature = "python")]
mod python;

pub use condition::{Condition, Ipv4Predicate, Tag};
pub use config::{ConsoleConfig, RawFormat};
pub use error::{ClassError, Result, ValidationError};
pub use traffic_class::{MemoryStore, TrafficClass, TrafficClassSession, TrafficClassStore};
