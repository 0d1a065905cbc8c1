//! Raw-text formats for editing a condition as plain text

use crate::condition::{self, render_root, Condition};
use crate::config::RawFormat;
use crate::error::{ClassError, Result};
use serde_json::Value;

/// Converts between raw editor text and the wire form of a condition
pub trait RawTextParser {
    /// Parse raw text into the JSON wire form
    fn parse_wire(&self, text: &str) -> Result<Value>;

    /// Text shown when raw editing starts on `root`
    fn snapshot(&self, root: Option<&Condition>) -> Result<String>;

    /// Parse raw text all the way to a tree
    fn parse_condition(&self, text: &str) -> Result<Condition> {
        condition::decode(&self.parse_wire(text)?)
    }
}

/// The class expression grammar, e.g. `ALL(src=10.0.0.0/8,dscp=0x2e)`
#[derive(Debug, Clone, Copy, Default)]
pub struct ExpressionParser;

impl RawTextParser for ExpressionParser {
    fn parse_wire(&self, text: &str) -> Result<Value> {
        condition::encode(&condition::parse(text)?)
    }

    fn snapshot(&self, root: Option<&Condition>) -> Result<String> {
        Ok(render_root(root))
    }
}

/// The JSON wire form written as YAML
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlWireParser;

impl RawTextParser for YamlWireParser {
    fn parse_wire(&self, text: &str) -> Result<Value> {
        serde_yaml::from_str::<Value>(text).map_err(|e| ClassError::Parse(e.to_string()))
    }

    fn snapshot(&self, root: Option<&Condition>) -> Result<String> {
        match root {
            Some(root) => {
                let wire = condition::encode(root)?;
                serde_yaml::to_string(&wire).map_err(|e| ClassError::Encode(e.to_string()))
            }
            None => Ok(String::new()),
        }
    }
}

pub fn parser_for(format: RawFormat) -> Box<dyn RawTextParser + Send + Sync> {
    match format {
        RawFormat::Expression => Box::new(ExpressionParser),
        RawFormat::Yaml => Box::new(YamlWireParser),
    }
}
