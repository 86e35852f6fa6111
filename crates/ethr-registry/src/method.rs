use ethr_ledger::LedgerGateway;
use ethr_resolver::{EthrResolver, ResolveError};
use ethr_types::{Did, Document};

/// A resolver for a single DID method.
pub trait MethodResolver: Send + Sync {
    /// The method name this resolver handles, e.g. `ethr`.
    fn method(&self) -> &str;

    fn resolve(&self, did: &Did) -> Result<Document, ResolveError>;
}

impl<G: LedgerGateway> MethodResolver for EthrResolver<G> {
    fn method(&self) -> &str {
        "ethr"
    }

    fn resolve(&self, did: &Did) -> Result<Document, ResolveError> {
        self.resolve_parsed(did)
    }
}
