//! Error types for the typed JSON state model
//!
//! Every validation failure raised by the wrapper, container, and registry
//! machinery falls into one of five kinds:
//! - Shape/type mismatches (wrong JSON type, wrong array length)
//! - Semantically invalid values (malformed uint64 string, bad enum member)
//! - Unknown discriminants (no registered handler for a `type` value)
//! - Mutation of read-only instances
//! - Removal of absent elements

use serde_json::Value;
use thiserror::Error;

/// Error type shared by the state-model crates
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    /// Value does not match the expected JSON shape or type
    #[error("expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },

    /// Value has the right shape but is semantically invalid
    #[error("invalid value: {0}")]
    InvalidValue(String),

    /// Discriminant string has no registered handler
    #[error("unknown {family} type: {name:?}")]
    UnknownType { family: &'static str, name: String },

    /// Mutation attempted on a read-only instance or one of its descendants
    #[error("object is read-only")]
    ReadOnly,

    /// Element to remove does not exist
    #[error("not found: {0}")]
    NotFound(String),
}

impl StateError {
    /// Type mismatch against an observed JSON value
    pub fn type_mismatch(expected: impl Into<String>, actual: &Value) -> Self {
        StateError::TypeMismatch {
            expected: expected.into(),
            actual: value_type_name(actual).to_string(),
        }
    }

    /// Required field absent from a JSON mapping
    pub fn missing_field(key: &str) -> Self {
        StateError::InvalidValue(format!("missing required field {key:?}"))
    }

    /// Registry lookup miss for a discriminant
    pub fn unknown_type(family: &'static str, name: impl Into<String>) -> Self {
        StateError::UnknownType {
            family,
            name: name.into(),
        }
    }
}

/// Result type alias for state-model operations
pub type StateResult<T> = Result<T, StateError>;

/// Human-readable name for a JSON value's shape, used in error messages
pub fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
