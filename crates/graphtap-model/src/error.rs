//! Error types for the model crate

/// Errors raised while parsing model values from text
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// Dedup key had the wrong number of bytes
    #[error("invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    /// Dedup key was not valid hex
    #[error("hex decode error: {0}")]
    HexDecode(#[from] hex::FromHexError),

    /// Unknown category name
    #[error("unknown category: '{0}'")]
    UnknownCategory(String),

    /// Unknown hook origin name
    #[error("unknown hook origin: '{0}'")]
    UnknownHookOrigin(String),

    /// Unknown match stage name
    #[error("unknown match stage: '{0}'")]
    UnknownMatchStage(String),
}
