use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    #[error("invalid byte length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("invalid did url: {0}")]
    InvalidDid(String),

    #[error("unknown network: {0}")]
    UnknownNetwork(String),

    #[error("name too long for a 32-byte field: {0}")]
    NameTooLong(String),
}
