use std::collections::HashMap;

use ethr_resolver::ResolveError;
use ethr_types::{Did, Document};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::cache::DocumentCache;
use crate::error::{RegistryError, Result};
use crate::method::MethodResolver;

/// Resolution error codes reported in [`ResolutionMetadata`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorCode {
    InvalidDidUrl,
    InvalidDid,
    Deactivated,
    InternalError,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::InvalidDidUrl => "invalid-did-url",
            ErrorCode::InvalidDid => "invalid-did",
            ErrorCode::Deactivated => "deactivated",
            ErrorCode::InternalError => "internal-error",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorCode>,
    /// Human-readable detail for `error`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub deactivated: bool,
}

/// Outcome of resolving a DID URL through the [`Registry`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionResult {
    pub resolution_metadata: ResolutionMetadata,
    pub document: Option<Document>,
    pub document_metadata: DocumentMetadata,
}

impl ResolutionResult {
    fn failed(code: ErrorCode, err: &RegistryError) -> Self {
        Self {
            resolution_metadata: ResolutionMetadata {
                error: Some(code),
                message: Some(err.to_string()),
            },
            document: None,
            document_metadata: DocumentMetadata::default(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.resolution_metadata.error.is_none()
    }
}

/// Dispatches DID URLs to the resolver registered for their method.
#[derive(Default)]
pub struct Registry {
    resolvers: HashMap<String, Box<dyn MethodResolver>>,
    cache: Option<DocumentCache>,
}

impl Registry {
    /// An empty registry without caching.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable the document cache.
    pub fn with_cache(mut self) -> Self {
        self.cache = Some(DocumentCache::new());
        self
    }

    pub fn register(&mut self, resolver: impl MethodResolver + 'static) -> Result<()> {
        let method = resolver.method().to_string();
        if self.resolvers.contains_key(&method) {
            return Err(RegistryError::DuplicateMethod(method));
        }
        debug!(method = %method, "registered did method");
        self.resolvers.insert(method, Box::new(resolver));
        Ok(())
    }

    /// Registered method names, sorted.
    pub fn methods(&self) -> Vec<&str> {
        let mut methods: Vec<_> = self.resolvers.keys().map(String::as_str).collect();
        methods.sort_unstable();
        methods
    }

    pub fn cache(&self) -> Option<&DocumentCache> {
        self.cache.as_ref()
    }

    /// Resolve a DID URL, reporting failures through the resolution metadata.
    pub fn resolve(&self, did_url: &str) -> ResolutionResult {
        match self.resolve_document(did_url) {
            Ok(document) => ResolutionResult {
                resolution_metadata: ResolutionMetadata::default(),
                document: Some(document),
                document_metadata: DocumentMetadata::default(),
            },
            Err(RegistryError::Resolve(ResolveError::Deactivated(document))) => {
                info!(did = did_url, "resolved deactivated identity");
                ResolutionResult {
                    resolution_metadata: ResolutionMetadata {
                        error: Some(ErrorCode::Deactivated),
                        message: None,
                    },
                    document: Some(*document),
                    document_metadata: DocumentMetadata { deactivated: true },
                }
            }
            Err(err) => {
                debug!(did = did_url, error = %err, "resolution failed");
                let code = match err {
                    RegistryError::InvalidDidUrl(_) | RegistryError::UnknownMethod(_) => {
                        ErrorCode::InvalidDidUrl
                    }
                    RegistryError::Resolve(_) => ErrorCode::InvalidDid,
                    RegistryError::DuplicateMethod(_) | RegistryError::LockPoisoned => {
                        ErrorCode::InternalError
                    }
                };
                ResolutionResult::failed(code, &err)
            }
        }
    }

    /// Resolve a DID URL, returning the document or the underlying error.
    pub fn resolve_document(&self, did_url: &str) -> Result<Document> {
        let did = Did::parse(did_url).map_err(|e| RegistryError::InvalidDidUrl(e.to_string()))?;
        let resolver = self
            .resolvers
            .get(&did.method)
            .ok_or_else(|| RegistryError::UnknownMethod(did.method.clone()))?;
        match &self.cache {
            Some(cache) => cache.get_or_resolve(&did, || resolver.resolve(&did)),
            None => Ok(resolver.resolve(&did)?),
        }
    }
}
