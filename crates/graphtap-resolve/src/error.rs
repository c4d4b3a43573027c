//! Error types for entity resolution
//!
//! Resolution itself is lenient and never fails; these errors are only
//! surfaced by [`EntityResolver::try_resolve`](crate::EntityResolver::try_resolve)
//! when a payload does not have the graph layout at all.

use serde_json::Value;

/// Payload-level shape errors
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// Top-level payload is not an object
    #[error("payload is not an object: found {found}")]
    NotAnObject { found: &'static str },

    /// `included` is present but not an array
    #[error("malformed pool: 'included' is {found}, expected array")]
    MalformedPool { found: &'static str },
}

impl ResolveError {
    /// Create not-an-object error from the offending value
    pub fn not_an_object(value: &Value) -> Self {
        Self::NotAnObject {
            found: json_kind(value),
        }
    }

    /// Create malformed pool error from the offending value
    pub fn malformed_pool(value: &Value) -> Self {
        Self::MalformedPool {
            found: json_kind(value),
        }
    }
}

/// Name of a JSON value's kind
#[must_use]
pub fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
