use ethr_types::Address;

/// Errors produced by ledger gateway operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    #[error("ledger unavailable: {0}")]
    Unavailable(String),

    #[error("no registry deployed at {0}")]
    UnknownRegistry(Address),

    #[error("{caller} is not the owner of {identity}")]
    Unauthorized { identity: Address, caller: Address },

    #[error("invalid registry write: {0}")]
    InvalidWrite(String),

    #[error("ledger state lock poisoned")]
    LockPoisoned,

    #[error("invalid ledger fixture: {0}")]
    Fixture(String),
}
