//! Error types for the capture pipeline
//!
//! The core path (correlate, classify, dedup, resolve, publish) never fails.
//! Errors come from three places only:
//! - configuration loading and validation
//! - host transports, whose errors are handed back to the host unchanged
//! - body decoding, which yields no capture

use graphtap_classify::ClassifyError;
use std::path::PathBuf;

/// Pipeline construction and lifecycle errors
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Configuration rejected
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Processing loop already running
    #[error("pipeline already started")]
    AlreadyStarted,

    /// Processing loop task failed
    #[error("pipeline task failed: {0}")]
    TaskFailed(String),
}

/// Configuration loading and validation errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error reading or writing a config file
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// TOML syntax or type error
    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// TOML encoding error
    #[error("cannot encode TOML: {0}")]
    Encode(#[from] toml::ser::Error),

    /// A value is out of range
    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    /// Classifier tables rejected
    #[error("classifier tables: {0}")]
    Tables(#[from] ClassifyError),
}

impl ConfigError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create invalid value error
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Errors of the host transports being observed
///
/// Observers return these to the host exactly as the wrapped transport
/// produced them.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// Network-level failure
    #[error("network error: {0}")]
    Network(String),

    /// Request aborted by the caller
    #[error("request aborted")]
    Aborted,

    /// Request timed out
    #[error("request timed out")]
    Timeout,
}

/// Response body decoding errors
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// Body is not valid JSON
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Body is not valid UTF-8
    #[error("invalid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// Body stream failed
    #[error("body transport failed: {0}")]
    Transport(#[from] TransportError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        let err = ConfigError::invalid("dedup.window_ms", "must be greater than zero");
        assert_eq!(
            err.to_string(),
            "invalid value for dedup.window_ms: must be greater than zero"
        );
        let err: PipelineError = err.into();
        assert!(err.to_string().starts_with("configuration error"));
    }

    #[test]
    fn decode_error_from_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: DecodeError = json_err.into();
        assert!(err.to_string().starts_with("invalid JSON"));
    }

    #[test]
    fn transport_error_display() {
        assert_eq!(TransportError::Aborted.to_string(), "request aborted");
        let err: DecodeError = TransportError::Timeout.into();
        assert_eq!(err.to_string(), "body transport failed: request timed out");
    }
}
