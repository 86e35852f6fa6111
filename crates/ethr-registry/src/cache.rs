//! Document cache with per-key single-flight resolution.
//!
//! Each key owns its own slot mutex, so concurrent requests for the same DID
//! wait for the one resolution in flight while other keys proceed
//! independently. Only successful results are stored.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use ethr_resolver::ResolveError;
use ethr_types::{Did, Document};
use tracing::debug;

use crate::error::{RegistryError, Result};

/// DID URL parameter that bypasses the cache when set to `true`.
pub const NO_CACHE_PARAM: &str = "no-cache";

type Slot = Arc<Mutex<Option<Document>>>;

#[derive(Debug, Default)]
pub struct DocumentCache {
    slots: Mutex<HashMap<String, Slot>>,
}

impl DocumentCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached document for `did`, or run `resolve` and cache its result.
    pub fn get_or_resolve<F>(&self, did: &Did, resolve: F) -> Result<Document>
    where
        F: FnOnce() -> std::result::Result<Document, ResolveError>,
    {
        if bypasses_cache(did) {
            debug!(%did, "cache bypassed");
            return Ok(resolve()?);
        }

        let key = cache_key(did);
        let slot = {
            let mut slots = self.slots.lock().map_err(|_| RegistryError::LockPoisoned)?;
            Arc::clone(slots.entry(key.clone()).or_default())
        };

        let mut cached = slot.lock().map_err(|_| RegistryError::LockPoisoned)?;
        if let Some(doc) = cached.as_ref() {
            debug!(key = %key, "cache hit");
            return Ok(doc.clone());
        }
        debug!(key = %key, "cache miss");
        match resolve() {
            Ok(doc) => {
                *cached = Some(doc.clone());
                Ok(doc)
            }
            Err(err) => {
                drop(cached);
                self.discard_empty(&key, &slot)?;
                Err(err.into())
            }
        }
    }

    /// Drop `slot` from the map if it is still the entry for `key` and holds nothing.
    fn discard_empty(&self, key: &str, slot: &Slot) -> Result<()> {
        let mut slots = self.slots.lock().map_err(|_| RegistryError::LockPoisoned)?;
        let empty = match slots.get(key) {
            Some(current) if Arc::ptr_eq(current, slot) => current
                .lock()
                .map_err(|_| RegistryError::LockPoisoned)?
                .is_none(),
            _ => false,
        };
        if empty {
            slots.remove(key);
        }
        Ok(())
    }

    /// Drop the cached entry for `did`, if any.
    pub fn invalidate(&self, did: &Did) -> Result<()> {
        let mut slots = self.slots.lock().map_err(|_| RegistryError::LockPoisoned)?;
        slots.remove(&cache_key(did));
        Ok(())
    }

    /// Number of keys holding a resolved document.
    pub fn len(&self) -> Result<usize> {
        let slots = self.slots.lock().map_err(|_| RegistryError::LockPoisoned)?;
        let mut filled = 0;
        for slot in slots.values() {
            if slot.lock().map_err(|_| RegistryError::LockPoisoned)?.is_some() {
                filled += 1;
            }
        }
        Ok(filled)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

fn bypasses_cache(did: &Did) -> bool {
    did.param(NO_CACHE_PARAM) == Some("true")
}

/// The full DID URL with the `no-cache` parameter removed.
fn cache_key(did: &Did) -> String {
    let mut keyed = did.clone();
    keyed.params.retain(|p| p.name != NO_CACHE_PARAM);
    keyed.to_string()
}
