//! Central registry for per-key throttle state.
//!
//! The registry owns the storage and the clock. Every access reads the clock
//! once, after the entry is locked, and hands the entry and that instant to
//! the caller. Callers serialized on one key therefore see non-decreasing
//! instants.

use crate::application::ports::{Clock, Storage};
use crate::domain::policy::ThrottleEntry;
use std::cell::Cell;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Registry managing all throttle state.
///
/// Generic over the storage implementation. In production, use
/// `Arc<ShardedStorage<String, ThrottleEntry>>`.
#[derive(Debug, Clone)]
pub struct ThrottleRegistry<S>
where
    S: Storage<String, ThrottleEntry> + Clone,
{
    storage: S,
    clock: Arc<dyn Clock>,
}

impl<S> ThrottleRegistry<S>
where
    S: Storage<String, ThrottleEntry> + Clone,
{
    /// Create a new registry with storage and a clock.
    pub fn new(storage: S, clock: Arc<dyn Clock>) -> Self {
        Self { storage, clock }
    }

    /// Access or create the entry for a key with a callback.
    ///
    /// The callback receives the entry, the current instant, and whether the
    /// entry was created by this call. A created entry is already opened at
    /// the current instant with `window`.
    pub fn with_entry<F, R>(&self, key: &str, window: Duration, f: F) -> R
    where
        F: FnOnce(&mut ThrottleEntry, Instant, bool) -> R,
    {
        let opened_at = Cell::new(None);
        self.storage.with_entry_mut(
            key.to_string(),
            || {
                let now = self.clock.now();
                opened_at.set(Some(now));
                ThrottleEntry::open(now, window)
            },
            |entry| match opened_at.get() {
                Some(now) => f(entry, now, true),
                None => f(entry, self.clock.now(), false),
            },
        )
    }

    /// The clock used for all window arithmetic.
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Get the number of tracked keys.
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    /// Clear all tracked state.
    pub fn clear(&self) {
        self.storage.clear();
    }

    /// Remove entries for which the predicate returns false.
    ///
    /// The predicate receives the current instant as its third argument.
    pub fn cleanup<F>(&self, mut f: F)
    where
        F: FnMut(&String, &mut ThrottleEntry, Instant) -> bool,
    {
        let now = self.clock.now();
        self.storage.retain(|key, entry| f(key, entry, now));
    }
}
