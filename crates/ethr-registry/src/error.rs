use ethr_resolver::ResolveError;
use thiserror::Error;

/// Errors raised by the method registry and its cache.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("invalid did url: {0}")]
    InvalidDidUrl(String),

    #[error("unknown did method: '{0}'")]
    UnknownMethod(String),

    #[error("a resolver for method '{0}' is already registered")]
    DuplicateMethod(String),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("lock poisoned")]
    LockPoisoned,
}

pub type Result<T> = std::result::Result<T, RegistryError>;
