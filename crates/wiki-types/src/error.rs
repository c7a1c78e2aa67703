use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    #[error("invalid byte length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("invalid blob key {key:?}: {reason}")]
    InvalidKey { key: String, reason: String },

    #[error("invalid username {name:?}: {reason}")]
    InvalidUsername { name: String, reason: String },
}
