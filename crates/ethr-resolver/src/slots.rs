//! Insertion-ordered slot index used to accumulate document fragments during replay.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

/// Composite key identifying one logical slot across repeated add/revoke events:
/// registry event name, normalized name or delegate type, and the delegate
/// address or raw attribute value. The subject is kept as raw bytes so that
/// distinct non-UTF-8 values stay distinct.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SlotKey {
    pub event: &'static str,
    pub name: String,
    pub subject: Vec<u8>,
}

impl SlotKey {
    pub fn new(event: &'static str, name: impl Into<String>, subject: impl Into<Vec<u8>>) -> Self {
        Self {
            event,
            name: name.into(),
            subject: subject.into(),
        }
    }
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-", self.event, self.name)?;
        match std::str::from_utf8(&self.subject) {
            Ok(text) => f.write_str(text),
            Err(_) => write!(f, "0x{}", hex::encode(&self.subject)),
        }
    }
}

/// Mapping that remembers first-insertion order.
///
/// Upserting an existing key replaces its value in place without moving it;
/// removing a key drops the slot entirely, so a later upsert of the same key
/// lands at the end.
#[derive(Clone, Debug)]
pub struct SlotIndex<K, V> {
    order: Vec<K>,
    slots: HashMap<K, V>,
}

impl<K, V> Default for SlotIndex<K, V> {
    fn default() -> Self {
        Self {
            order: Vec::new(),
            slots: HashMap::new(),
        }
    }
}

impl<K: Clone + Eq + Hash, V> SlotIndex<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace; returns the previous value.
    pub fn upsert(&mut self, key: K, value: V) -> Option<V> {
        if let Some(slot) = self.slots.get_mut(&key) {
            return Some(std::mem::replace(slot, value));
        }
        self.order.push(key.clone());
        self.slots.insert(key, value);
        None
    }

    /// Remove a slot; a no-op when absent.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let value = self.slots.remove(key)?;
        self.order.retain(|k| k != key);
        Some(value)
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.slots.get(key)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.slots.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.order
            .iter()
            .filter_map(move |k| self.slots.get(k).map(|v| (k, v)))
    }

    /// Values in insertion order.
    pub fn into_values(mut self) -> Vec<V> {
        self.order
            .iter()
            .filter_map(|k| self.slots.remove(k))
            .collect()
    }
}
