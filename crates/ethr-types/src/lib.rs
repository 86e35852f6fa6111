//! Foundation types for `did:ethr` resolution.
//!
//! Every other crate in the workspace depends on `ethr-types`.
//!
//! # Key Types
//!
//! - [`Address`]: 20-byte ledger account, rendered in EIP-55 checksum form
//! - [`Did`]: Parsed DID URL (method, id, parameters, query, fragment)
//! - [`ChangeEvent`]: Registry event with its `previous_change` pointer
//! - [`ChangePointer`]: Block reference chaining an identity's events
//! - [`Document`]: Resolved DID document and its fragments

pub mod address;
pub mod did;
pub mod document;
pub mod error;
pub mod event;
pub mod multibase;
pub mod network;

pub use address::{Address, ADDRESS_HEX_LEN};
pub use did::{Did, DidParam};
pub use document::{
    Authentication, Document, Service, VerificationMethod, DID_CONTEXT,
    SECP256K1_RECOVERY_CONTEXT,
};
pub use error::TypeError;
pub use event::{AttributeValue, Bytes32, ChangeEvent, ChangeKind, ChangePointer};
pub use network::{chain_id_for, KNOWN_NETWORKS};
