use ethr_ledger::GatewayError;
use ethr_types::Document;
use thiserror::Error;

/// Errors produced while resolving a `did:ethr` identifier.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("unsupported network: identifier names chain {requested}, ledger is chain {configured}")]
    UnsupportedNetwork { requested: u64, configured: u64 },

    #[error("ledger unavailable: {0}")]
    LedgerUnavailable(#[from] GatewayError),

    #[error("malformed attribute encoding in {name}: {reason}")]
    MalformedAttributeEncoding { name: String, reason: String },

    /// The identity was deactivated. Carries the minimal document so callers
    /// can still return it alongside the signal.
    #[error("deactivated")]
    Deactivated(Box<Document>),

    #[error("configuration error: {0}")]
    Config(String),
}

impl ResolveError {
    pub fn is_deactivated(&self) -> bool {
        matches!(self, ResolveError::Deactivated(_))
    }
}

pub type Result<T> = std::result::Result<T, ResolveError>;
