use std::sync::Arc;

use ethr_types::{Address, ChangeEvent, ChangePointer};

use crate::error::GatewayError;

/// Read boundary onto the DID registry contract.
///
/// Every call is a blocking, fallible round trip. Retries, timeouts and
/// transport concerns belong to the implementation; resolution aborts on the
/// first error.
pub trait LedgerGateway: Send + Sync {
    /// Chain id of the network this gateway is connected to.
    fn chain_id(&self) -> u64;

    /// Current owner of `identity`. An identity that never changed owner owns itself.
    fn current_controller(
        &self,
        registry: &Address,
        identity: &Address,
    ) -> Result<Address, GatewayError>;

    /// Block of the most recent change for `identity`, or the sentinel if none.
    fn last_change(
        &self,
        registry: &Address,
        identity: &Address,
    ) -> Result<ChangePointer, GatewayError>;

    /// All events for `identity` recorded in exactly `block`, in log order.
    fn events_at(
        &self,
        registry: &Address,
        identity: &Address,
        block: ChangePointer,
    ) -> Result<Vec<ChangeEvent>, GatewayError>;
}

impl<G: LedgerGateway + ?Sized> LedgerGateway for Arc<G> {
    fn chain_id(&self) -> u64 {
        (**self).chain_id()
    }

    fn current_controller(
        &self,
        registry: &Address,
        identity: &Address,
    ) -> Result<Address, GatewayError> {
        (**self).current_controller(registry, identity)
    }

    fn last_change(
        &self,
        registry: &Address,
        identity: &Address,
    ) -> Result<ChangePointer, GatewayError> {
        (**self).last_change(registry, identity)
    }

    fn events_at(
        &self,
        registry: &Address,
        identity: &Address,
        block: ChangePointer,
    ) -> Result<Vec<ChangeEvent>, GatewayError> {
        (**self).events_at(registry, identity, block)
    }
}
