//! DID method registry.
//!
//! [`Registry`] parses a DID URL, dispatches it to the [`MethodResolver`]
//! registered for its method, optionally through a [`DocumentCache`], and
//! reports the outcome as a [`ResolutionResult`] with error codes in its
//! metadata. [`EthrResolver`](ethr_resolver::EthrResolver) is a
//! [`MethodResolver`] for `did:ethr`.

pub mod cache;
pub mod error;
pub mod method;
pub mod registry;

pub use cache::{DocumentCache, NO_CACHE_PARAM};
pub use error::{RegistryError, Result};
pub use method::MethodResolver;
pub use registry::{
    DocumentMetadata, ErrorCode, Registry, ResolutionMetadata, ResolutionResult,
};
