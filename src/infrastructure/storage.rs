//! In-memory storage for throttle state.
//!
//! Keys are spread over DashMap shards; each shard has its own lock, so
//! actions on unrelated keys rarely contend.

use crate::application::ports::Storage;
use dashmap::DashMap;
#[cfg(test)]
use dashmap::try_result::TryResult;
#[cfg(test)]
use std::borrow::Borrow;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;

/// Thread-safe sharded storage backed by DashMap.
#[derive(Debug)]
pub struct ShardedStorage<K, V>
where
    K: Eq + Hash,
{
    map: DashMap<K, V>,
}

impl<K, V> ShardedStorage<K, V>
where
    K: Eq + Hash,
{
    /// Create an empty storage.
    pub fn new() -> Self {
        Self {
            map: DashMap::new(),
        }
    }

    /// Create an empty storage sized for `capacity` keys.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            map: DashMap::with_capacity(capacity),
        }
    }

    /// Copy out the value for a key.
    #[cfg(test)]
    pub(crate) fn snapshot<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        V: Clone,
    {
        self.map.get(key).map(|entry| entry.value().clone())
    }

    /// Whether the shard holding `key` is currently write-locked.
    #[cfg(test)]
    pub(crate) fn is_shard_locked<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        matches!(self.map.try_get(key), TryResult::Locked)
    }
}

impl<K, V> Default for ShardedStorage<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Storage<K, V> for ShardedStorage<K, V>
where
    K: Hash + Eq + Clone + Send + Sync + Debug,
    V: Send + Sync + Debug,
{
    fn with_entry_mut<F, R>(&self, key: K, factory: impl FnOnce() -> V, accessor: F) -> R
    where
        F: FnOnce(&mut V) -> R,
    {
        // The entry guard holds the shard write lock until it drops.
        let mut value_ref = self.map.entry(key).or_insert_with(factory);
        accessor(&mut value_ref)
    }

    fn len(&self) -> usize {
        self.map.len()
    }

    fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    fn clear(&self) {
        self.map.clear()
    }

    fn retain<F>(&self, f: F)
    where
        F: FnMut(&K, &mut V) -> bool,
    {
        self.map.retain(f);
    }
}

// Shared handle: clones of a limiter point at the same map.
impl<K, V> Storage<K, V> for Arc<ShardedStorage<K, V>>
where
    K: Hash + Eq + Clone + Send + Sync + Debug,
    V: Send + Sync + Debug,
{
    fn with_entry_mut<F, R>(&self, key: K, factory: impl FnOnce() -> V, accessor: F) -> R
    where
        F: FnOnce(&mut V) -> R,
    {
        (**self).with_entry_mut(key, factory, accessor)
    }

    fn len(&self) -> usize {
        (**self).len()
    }

    fn is_empty(&self) -> bool {
        (**self).is_empty()
    }

    fn clear(&self) {
        (**self).clear()
    }

    fn retain<F>(&self, f: F)
    where
        F: FnMut(&K, &mut V) -> bool,
    {
        (**self).retain(f)
    }
}
