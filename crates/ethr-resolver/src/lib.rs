//! `did:ethr` resolution engine.
//!
//! Resolution runs in four stages:
//! - [`codec`] turns the method-specific id into an on-ledger identity
//! - [`ChangeLogWalker`] follows the identity's change pointers back through
//!   the registry and returns the events oldest first
//! - [`Replayer`] folds the events into ordered slots, applying expiry and
//!   revocation
//! - [`DocumentAssembler`] combines controller, embedded key and slots into a
//!   [`Document`](ethr_types::Document)
//!
//! [`EthrResolver`] drives all four against a [`LedgerGateway`](ethr_ledger::LedgerGateway).

pub mod assemble;
pub mod clock;
pub mod codec;
pub mod config;
pub mod error;
pub mod replay;
pub mod resolver;
pub mod slots;
pub mod walker;

pub use assemble::DocumentAssembler;
pub use clock::{Clock, FixedClock, SystemClock};
pub use codec::{interpret_identifier, parse_target, EmbeddedKey, Identity, ResolutionTarget};
pub use config::{BatchOrder, ResolverConfig, DEFAULT_REGISTRY_ADDRESS};
pub use error::{ResolveError, Result};
pub use replay::{AttributeName, ReplayOutcome, Replayer};
pub use resolver::EthrResolver;
pub use slots::{SlotIndex, SlotKey};
pub use walker::{ChangeLog, ChangeLogWalker};
