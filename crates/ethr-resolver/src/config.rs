use std::path::Path;

use ethr_types::Address;
use serde::{Deserialize, Serialize};

use crate::error::ResolveError;

/// Address of the DID registry contract on public networks.
pub const DEFAULT_REGISTRY_ADDRESS: Address = Address::from_bytes([
    0xdc, 0xa7, 0xef, 0x03, 0xe9, 0x8e, 0x0d, 0xc2, 0xb8, 0x55, 0xbe, 0x64, 0x7c, 0x39, 0xab, 0xe9,
    0x84, 0xfc, 0xf2, 0x1b,
]);

/// Order in which events that share one block are replayed.
///
/// The ledger does not define an order for logically simultaneous writes, so
/// a set and a revoke of the same slot in one block can net out either way.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchOrder {
    /// The order the gateway returned them in.
    #[default]
    Retrieval,
    /// Reverse of the gateway order.
    Reversed,
}

/// Configuration for [`EthrResolver`](crate::EthrResolver).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Address of the DID registry contract the walker reads from.
    pub registry_address: Address,
    /// Network assumed when an identifier carries no network segment.
    pub default_network: String,
    pub batch_order: BatchOrder,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            registry_address: DEFAULT_REGISTRY_ADDRESS,
            default_network: "dev".into(),
            batch_order: BatchOrder::Retrieval,
        }
    }
}

impl ResolverConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, ResolveError> {
        toml::from_str(raw).map_err(|e| ResolveError::Config(e.to_string()))
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ResolveError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ResolveError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&raw)
    }

    pub fn with_registry(mut self, registry_address: Address) -> Self {
        self.registry_address = registry_address;
        self
    }

    pub fn with_batch_order(mut self, batch_order: BatchOrder) -> Self {
        self.batch_order = batch_order;
        self
    }
}
