//! Console configuration
//!
//! Loaded from JSON or YAML files, or from a Python dict when the `python`
//! feature is enabled.

use crate::condition::MAX_CLASS_DEPTH;
use crate::error::{ClassError, Result};
use serde::Deserialize;
use std::path::Path;

/// Text format used while a class condition is edited raw
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RawFormat {
    /// Class expression grammar, sent to the backend as `CondStr`
    #[default]
    Expression,
    /// YAML rendering of the JSON wire form, parsed locally
    Yaml,
}

impl std::str::FromStr for RawFormat {
    type Err = ClassError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "expression" => Ok(RawFormat::Expression),
            "yaml" => Ok(RawFormat::Yaml),
            other => Err(ClassError::Config(format!("unknown raw format: {}", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ConsoleConfig {
    #[serde(default)]
    pub raw_format: RawFormat,
    /// Limit on nested class references during evaluation
    #[serde(default = "default_max_class_depth")]
    pub max_class_depth: usize,
}

fn default_max_class_depth() -> usize {
    MAX_CLASS_DEPTH
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            raw_format: RawFormat::default(),
            max_class_depth: default_max_class_depth(),
        }
    }
}

impl ConsoleConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| ClassError::Config(e.to_string()))
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| ClassError::Config(e.to_string()))
    }

    /// Load from a file; `.yaml` / `.yml` are read as YAML, anything else as JSON
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ClassError::Config(format!("failed to read {}: {}", path.display(), e)))?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml_str(&content),
            _ => Self::from_json_str(&content),
        }
    }
}

#[cfg(feature = "python")]
mod py {
    use super::*;
    use pyo3::types::{PyAnyMethods, PyDict, PyDictMethods};
    use pyo3::Bound;

    impl ConsoleConfig {
        /// Read the config from a Python dict, keeping defaults for missing keys
        pub fn from_py_dict(dict: &Bound<'_, PyDict>) -> pyo3::PyResult<Self> {
            let mut config = ConsoleConfig::default();

            if let Some(value) = dict.get_item("raw_format")? {
                if !value.is_none() {
                    let text: String = value.extract()?;
                    config.raw_format = text.parse()?;
                }
            }

            if let Some(value) = dict.get_item("max_class_depth")? {
                if !value.is_none() {
                    config.max_class_depth = value.extract()?;
                }
            }

            Ok(config)
        }
    }
}
