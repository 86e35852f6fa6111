use ethr_ledger::LedgerGateway;
use ethr_types::{Address, ChangeEvent, ChangePointer};
use tracing::debug;

use crate::codec::EmbeddedKey;
use crate::config::BatchOrder;
use crate::error::Result;

/// The chronological history of one identity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChangeLog {
    /// Current owner of the identity.
    pub controller: Address,
    /// Events oldest first.
    pub events: Vec<ChangeEvent>,
    /// The identifier's embedded key, if it survived ownership changes.
    pub embedded_key: Option<EmbeddedKey>,
    /// Blocks visited, newest first.
    pub batches: Vec<ChangePointer>,
}

/// Walks an identity's change pointers backwards through the registry.
///
/// Every step depends on the batch fetched by the previous one, so the walk
/// is strictly sequential.
pub struct ChangeLogWalker<'a, G: ?Sized> {
    gateway: &'a G,
    registry: Address,
    order: BatchOrder,
}

impl<'a, G: LedgerGateway + ?Sized> ChangeLogWalker<'a, G> {
    pub fn new(gateway: &'a G, registry: Address, order: BatchOrder) -> Self {
        Self {
            gateway,
            registry,
            order,
        }
    }

    pub fn walk(&self, identity: Address, embedded_key: Option<EmbeddedKey>) -> Result<ChangeLog> {
        let controller = self.gateway.current_controller(&self.registry, &identity)?;
        let mut pointer = self
            .gateway
            .last_change(&self.registry, &identity)?
            .into_option();

        let mut embedded_key = embedded_key;
        if pointer.is_some() && controller != identity && embedded_key.is_some() {
            debug!(%identity, %controller, "ownership moved; dropping embedded key");
            embedded_key = None;
        }

        let mut fetched: Vec<Vec<ChangeEvent>> = Vec::new();
        let mut batches = Vec::new();
        while let Some(current) = pointer {
            let mut batch = self.gateway.events_at(&self.registry, &identity, current)?;
            debug!(block = current.0, events = batch.len(), "fetched change batch");

            // Entries that point at their own block or later are ignored.
            pointer = batch
                .iter()
                .map(|e| e.previous_change)
                .filter(|p| *p < current)
                .min()
                .and_then(ChangePointer::into_option);

            if self.order == BatchOrder::Reversed {
                batch.reverse();
            }
            batches.push(current);
            fetched.push(batch);
        }

        let events = fetched.into_iter().rev().flatten().collect();
        Ok(ChangeLog {
            controller,
            events,
            embedded_key,
            batches,
        })
    }
}
