//! In-memory keyed storage backed by [`DashMap`].
//!
//! Every mutating primitive is a single check-then-act on one shard entry,
//! so operations on the same key are linearizable while operations on
//! distinct keys only contend when they hash to the same shard.

use std::hash::Hash;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use thiserror::Error;

/// Failure of a conditional store operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("key is already present")]
    Occupied,

    #[error("key is not present")]
    Vacant,
}

/// Concurrent map with atomic conditional writes.
///
/// Values are handed out as clones; the store keeps the canonical copy.
pub struct MemoryStore<K, V>
where
    K: Eq + Hash,
{
    entries: DashMap<K, V>,
}

impl<K, V> MemoryStore<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    pub fn get(&self, key: &K) -> Option<V> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    /// Point-in-time copy of every stored value. Order is unspecified.
    pub fn snapshot(&self) -> Vec<V> {
        self.entries
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Inserts `value` only when `key` is absent.
    pub fn insert_new(&self, key: K, value: V) -> Result<V, StoreError> {
        match self.entries.entry(key) {
            Entry::Occupied(_) => Err(StoreError::Occupied),
            Entry::Vacant(slot) => {
                slot.insert(value.clone());
                Ok(value)
            }
        }
    }

    /// Replaces the value under `key` only when it is present.
    ///
    /// The shard lock is held across the presence check and the write, so a
    /// concurrent [`remove_existing`](Self::remove_existing) can never be
    /// undone by a replace that read the key before it vanished.
    pub fn replace_existing(&self, key: &K, value: V) -> Result<V, StoreError> {
        match self.entries.get_mut(key) {
            Some(mut current) => {
                *current = value.clone();
                Ok(value)
            }
            None => Err(StoreError::Vacant),
        }
    }

    /// Applies `change` to the value under `key` while holding its shard lock.
    ///
    /// `change` works on a copy that is written back only when it returns
    /// `Ok`, so a rejected change leaves the stored value untouched. The outer
    /// error is [`StoreError::Vacant`] when `key` is absent; the inner result
    /// is whatever `change` decided.
    pub fn modify<E, F>(&self, key: &K, change: F) -> Result<Result<V, E>, StoreError>
    where
        F: FnOnce(&mut V) -> Result<(), E>,
    {
        let mut current = self.entries.get_mut(key).ok_or(StoreError::Vacant)?;
        let mut next = current.clone();
        if let Err(err) = change(&mut next) {
            return Ok(Err(err));
        }
        *current = next.clone();
        Ok(Ok(next))
    }

    pub fn remove_existing(&self, key: &K) -> Result<V, StoreError> {
        self.entries
            .remove(key)
            .map(|(_, value)| value)
            .ok_or(StoreError::Vacant)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V> Default for MemoryStore<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}
