use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use ethr_types::{Address, AttributeValue, Bytes32, ChangeEvent, ChangeKind, ChangePointer};
use tracing::debug;

use crate::error::GatewayError;
use crate::traits::LedgerGateway;

/// In-memory DID registry for tests, local demos, and embedding.
///
/// Mirrors the write surface of the on-chain registry contract. Writes land
/// in a pending block and become visible to readers once [`mine`] seals it,
/// the way a simulated chain commits transactions.
///
/// [`mine`]: InMemoryRegistry::mine
pub struct InMemoryRegistry {
    chain_id: u64,
    address: Address,
    inner: RwLock<RegistryState>,
}

#[derive(Clone, Default)]
struct Accounts {
    owners: HashMap<Address, Address>,
    changed: HashMap<Address, u64>,
}

impl Accounts {
    fn owner_of(&self, identity: &Address) -> Address {
        self.owners.get(identity).copied().unwrap_or(*identity)
    }
}

struct RegistryState {
    head: u64,
    timestamp: u64,
    live: Accounts,
    sealed: Accounts,
    logs: BTreeMap<u64, Vec<ChangeEvent>>,
}

impl InMemoryRegistry {
    /// A registry deployed at `address` on chain `chain_id`, clocked from the system time.
    pub fn new(chain_id: u64, address: Address) -> Self {
        let now = u64::try_from(chrono::Utc::now().timestamp()).unwrap_or(0);
        Self::with_timestamp(chain_id, address, now)
    }

    /// A registry whose pending block carries the given unix timestamp.
    pub fn with_timestamp(chain_id: u64, address: Address, timestamp: u64) -> Self {
        Self {
            chain_id,
            address,
            inner: RwLock::new(RegistryState {
                head: 0,
                timestamp,
                live: Accounts::default(),
                sealed: Accounts::default(),
                logs: BTreeMap::new(),
            }),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Number of the most recently sealed block.
    pub fn head(&self) -> Result<u64, GatewayError> {
        Ok(self.read()?.head)
    }

    /// Timestamp that will be stamped on the pending block.
    pub fn timestamp(&self) -> Result<u64, GatewayError> {
        Ok(self.read()?.timestamp)
    }

    pub fn advance_time(&self, seconds: u64) -> Result<(), GatewayError> {
        let mut state = self.write()?;
        state.timestamp = state.timestamp.saturating_add(seconds);
        Ok(())
    }

    /// Seal pending writes into the next block and return its number.
    pub fn mine(&self) -> Result<u64, GatewayError> {
        let mut state = self.write()?;
        state.head += 1;
        state.timestamp = state.timestamp.saturating_add(1);
        state.sealed = state.live.clone();
        let events = state.logs.get(&state.head).map_or(0, Vec::len);
        debug!(block = state.head, events, "sealed registry block");
        Ok(state.head)
    }

    pub fn change_owner(
        &self,
        caller: Address,
        identity: Address,
        new_owner: Address,
    ) -> Result<(), GatewayError> {
        let mut state = self.write()?;
        authorize(&state, caller, identity)?;
        state.live.owners.insert(identity, new_owner);
        record(&mut state, identity, ChangeKind::OwnerChanged { owner: new_owner });
        Ok(())
    }

    pub fn add_delegate(
        &self,
        caller: Address,
        identity: Address,
        delegate_type: &str,
        delegate: Address,
        validity: u64,
    ) -> Result<(), GatewayError> {
        let delegate_type = packed(delegate_type)?;
        let mut state = self.write()?;
        authorize(&state, caller, identity)?;
        let valid_to = state.timestamp.saturating_add(validity);
        record(
            &mut state,
            identity,
            ChangeKind::DelegateChanged {
                delegate_type,
                delegate,
                valid_to,
            },
        );
        Ok(())
    }

    /// Revocations are recorded with `valid_to = 0`.
    pub fn revoke_delegate(
        &self,
        caller: Address,
        identity: Address,
        delegate_type: &str,
        delegate: Address,
    ) -> Result<(), GatewayError> {
        let delegate_type = packed(delegate_type)?;
        let mut state = self.write()?;
        authorize(&state, caller, identity)?;
        record(
            &mut state,
            identity,
            ChangeKind::DelegateChanged {
                delegate_type,
                delegate,
                valid_to: 0,
            },
        );
        Ok(())
    }

    pub fn set_attribute(
        &self,
        caller: Address,
        identity: Address,
        name: &str,
        value: &[u8],
        validity: u64,
    ) -> Result<(), GatewayError> {
        let name = packed(name)?;
        let mut state = self.write()?;
        authorize(&state, caller, identity)?;
        let valid_to = state.timestamp.saturating_add(validity);
        record(
            &mut state,
            identity,
            ChangeKind::AttributeChanged {
                name,
                value: AttributeValue(value.to_vec()),
                valid_to,
            },
        );
        Ok(())
    }

    pub fn revoke_attribute(
        &self,
        caller: Address,
        identity: Address,
        name: &str,
        value: &[u8],
    ) -> Result<(), GatewayError> {
        let name = packed(name)?;
        let mut state = self.write()?;
        authorize(&state, caller, identity)?;
        record(
            &mut state,
            identity,
            ChangeKind::AttributeChanged {
                name,
                value: AttributeValue(value.to_vec()),
                valid_to: 0,
            },
        );
        Ok(())
    }

    /// Insert an event verbatim into a sealed block, bypassing authorization
    /// and pointer bookkeeping. Used to simulate inconsistent ledgers.
    ///
    /// Fails while writes are pending: raising the head past them would
    /// expose them before [`mine`](Self::mine).
    pub fn append_raw(&self, event: ChangeEvent) -> Result<(), GatewayError> {
        let mut state = self.write()?;
        let block = event.block.0;
        if block == 0 {
            return Err(GatewayError::InvalidWrite(
                "raw events cannot be placed in block 0".into(),
            ));
        }
        if state.logs.get(&(state.head + 1)).is_some_and(|logs| !logs.is_empty()) {
            return Err(GatewayError::InvalidWrite(
                "mine pending writes before appending raw events".into(),
            ));
        }
        let changed = state.sealed.changed.entry(event.identity).or_default();
        *changed = (*changed).max(block);
        let live_changed = state.live.changed.entry(event.identity).or_default();
        *live_changed = (*live_changed).max(block);
        state.head = state.head.max(block);
        state.logs.entry(block).or_default().push(event);
        Ok(())
    }

    fn check_registry(&self, registry: &Address) -> Result<(), GatewayError> {
        if *registry != self.address {
            return Err(GatewayError::UnknownRegistry(*registry));
        }
        Ok(())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, RegistryState>, GatewayError> {
        self.inner.read().map_err(|_| GatewayError::LockPoisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, RegistryState>, GatewayError> {
        self.inner.write().map_err(|_| GatewayError::LockPoisoned)
    }
}

fn packed(name: &str) -> Result<Bytes32, GatewayError> {
    Bytes32::from_name(name).map_err(|e| GatewayError::InvalidWrite(e.to_string()))
}

fn authorize(state: &RegistryState, caller: Address, identity: Address) -> Result<(), GatewayError> {
    if state.live.owner_of(&identity) != caller {
        return Err(GatewayError::Unauthorized { identity, caller });
    }
    Ok(())
}

/// Append an event to the pending block, linking it to the identity's previous change.
fn record(state: &mut RegistryState, identity: Address, kind: ChangeKind) {
    let block = state.head + 1;
    let previous_change = ChangePointer(state.live.changed.get(&identity).copied().unwrap_or(0));
    let logs = state.logs.entry(block).or_default();
    let log_index = logs.len() as u32;
    logs.push(ChangeEvent {
        identity,
        previous_change,
        block: ChangePointer(block),
        log_index,
        kind,
    });
    state.live.changed.insert(identity, block);
}

impl LedgerGateway for InMemoryRegistry {
    fn chain_id(&self) -> u64 {
        self.chain_id
    }

    fn current_controller(
        &self,
        registry: &Address,
        identity: &Address,
    ) -> Result<Address, GatewayError> {
        self.check_registry(registry)?;
        Ok(self.read()?.sealed.owner_of(identity))
    }

    fn last_change(
        &self,
        registry: &Address,
        identity: &Address,
    ) -> Result<ChangePointer, GatewayError> {
        self.check_registry(registry)?;
        let state = self.read()?;
        Ok(ChangePointer(
            state.sealed.changed.get(identity).copied().unwrap_or(0),
        ))
    }

    fn events_at(
        &self,
        registry: &Address,
        identity: &Address,
        block: ChangePointer,
    ) -> Result<Vec<ChangeEvent>, GatewayError> {
        self.check_registry(registry)?;
        let state = self.read()?;
        if block.0 > state.head {
            return Ok(Vec::new());
        }
        Ok(state
            .logs
            .get(&block.0)
            .map(|logs| {
                logs.iter()
                    .filter(|e| e.identity == *identity)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}
