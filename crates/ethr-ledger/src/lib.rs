//! Ledger gateway boundary for `did:ethr` resolution.
//!
//! This crate provides:
//! - The [`LedgerGateway`] trait, the blocking read boundary onto the DID registry
//! - [`InMemoryRegistry`], a registry simulation for tests and embedding
//! - [`LedgerFixture`], JSON descriptions of registry histories

pub mod error;
pub mod fixture;
pub mod memory;
pub mod traits;

pub use error::GatewayError;
pub use fixture::{FixtureBlock, LedgerFixture, RegistryWrite};
pub use memory::InMemoryRegistry;
pub use traits::LedgerGateway;
