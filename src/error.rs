//! Error types for traffic-class conditions

use crate::condition::{ClassId, Tag};
use thiserror::Error;

/// Leaf value rejected by the CIDR / DSCP / class-reference checks
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid IPv4 CIDR: {0:?}")]
    InvalidCidr(String),

    #[error("invalid DSCP, expected 0x-prefixed hex: {0:?}")]
    InvalidDscp(String),

    #[error("DSCP value {0} out of range [0, 64]")]
    DscpOutOfRange(u64),

    #[error("traffic class {0} cannot reference itself")]
    SelfReference(ClassId),
}

/// Main error type for condition handling
#[derive(Error, Debug)]
pub enum ClassError {
    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Encode error: {0}")]
    Encode(String),

    #[error("Incomplete condition: NOT without operand at {0}")]
    IncompleteCondition(String),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Node {0} cannot hold children")]
    NotAContainer(Tag),

    #[error("NOT operand is already set")]
    OperandOccupied,

    #[error("Index {index} out of range for {len} children")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Leaf edit for {expected} applied to {found}")]
    LeafMismatch { expected: &'static str, found: Tag },

    #[error("Structured edits are disabled while raw editing")]
    RawMode,

    #[error("Traffic class not found: {0}")]
    NotFound(ClassId),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Config error: {0}")]
    Config(String),
}

#[cfg(feature = "python")]
impl From<ClassError> for pyo3::PyErr {
    fn from(err: ClassError) -> pyo3::PyErr {
        use pyo3::exceptions::{PyKeyError, PyRuntimeError, PyValueError};
        match err {
            ClassError::NotFound(id) => PyKeyError::new_err(format!("Traffic class not found: {}", id)),
            ClassError::Persistence(msg) => {
                PyRuntimeError::new_err(format!("Persistence error: {}", msg))
            }
            other => PyValueError::new_err(other.to_string()),
        }
    }
}

/// Result type alias for condition handling
pub type Result<T> = std::result::Result<T, ClassError>;
