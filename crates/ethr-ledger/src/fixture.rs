//! JSON ledger fixtures.
//!
//! A fixture describes a registry deployment and the blocks of writes to
//! replay into an [`InMemoryRegistry`]:
//!
//! ```json
//! {
//!   "chain_id": 1337,
//!   "registry": "0xdca7ef03e98e0dc2b855be647c39abe984fcf21b",
//!   "genesis_time": 1700000000,
//!   "blocks": [
//!     { "writes": [
//!       { "op": "set_attribute", "caller": "0x…", "identity": "0x…",
//!         "name": "did/svc/HubService", "value": "68747470733a2f2f…", "validity": 86400 }
//!     ] }
//!   ]
//! }
//! ```

use std::path::Path;

use ethr_types::Address;
use serde::{Deserialize, Serialize};

use crate::error::GatewayError;
use crate::memory::InMemoryRegistry;

/// One registry write.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum RegistryWrite {
    ChangeOwner {
        caller: Address,
        identity: Address,
        owner: Address,
    },
    AddDelegate {
        caller: Address,
        identity: Address,
        delegate_type: String,
        delegate: Address,
        validity: u64,
    },
    RevokeDelegate {
        caller: Address,
        identity: Address,
        delegate_type: String,
        delegate: Address,
    },
    SetAttribute {
        caller: Address,
        identity: Address,
        name: String,
        value: String,
        validity: u64,
    },
    RevokeAttribute {
        caller: Address,
        identity: Address,
        name: String,
        value: String,
    },
}

/// Writes sealed together into one block.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixtureBlock {
    /// Seconds to advance the registry clock before applying the writes.
    #[serde(default)]
    pub advance: u64,
    #[serde(default)]
    pub writes: Vec<RegistryWrite>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerFixture {
    pub chain_id: u64,
    pub registry: Address,
    /// Timestamp of the first block; the system time when absent.
    #[serde(default)]
    pub genesis_time: Option<u64>,
    #[serde(default)]
    pub blocks: Vec<FixtureBlock>,
}

impl LedgerFixture {
    pub fn from_json_str(raw: &str) -> Result<Self, GatewayError> {
        serde_json::from_str(raw).map_err(|e| GatewayError::Fixture(e.to_string()))
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, GatewayError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| GatewayError::Fixture(format!("{}: {e}", path.display())))?;
        Self::from_json_str(&raw)
    }

    /// Replay every block into a fresh registry, mining after each block.
    pub fn into_registry(self) -> Result<InMemoryRegistry, GatewayError> {
        let registry = match self.genesis_time {
            Some(t) => InMemoryRegistry::with_timestamp(self.chain_id, self.registry, t),
            None => InMemoryRegistry::new(self.chain_id, self.registry),
        };
        for block in self.blocks {
            registry.advance_time(block.advance)?;
            for write in block.writes {
                apply(&registry, write)?;
            }
            registry.mine()?;
        }
        Ok(registry)
    }
}

fn apply(registry: &InMemoryRegistry, write: RegistryWrite) -> Result<(), GatewayError> {
    match write {
        RegistryWrite::ChangeOwner {
            caller,
            identity,
            owner,
        } => registry.change_owner(caller, identity, owner),
        RegistryWrite::AddDelegate {
            caller,
            identity,
            delegate_type,
            delegate,
            validity,
        } => registry.add_delegate(caller, identity, &delegate_type, delegate, validity),
        RegistryWrite::RevokeDelegate {
            caller,
            identity,
            delegate_type,
            delegate,
        } => registry.revoke_delegate(caller, identity, &delegate_type, delegate),
        RegistryWrite::SetAttribute {
            caller,
            identity,
            name,
            value,
            validity,
        } => registry.set_attribute(caller, identity, &name, value.as_bytes(), validity),
        RegistryWrite::RevokeAttribute {
            caller,
            identity,
            name,
            value,
        } => registry.revoke_attribute(caller, identity, &name, value.as_bytes()),
    }
}
