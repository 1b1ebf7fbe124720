//! Window state storage.

use std::time::Instant;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use super::key::RateKey;
use super::policy::Policy;

/// Counting state for one key within one fixed window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    /// Requests counted against this window so far
    pub count: u64,
    /// Instant at which this window stops applying
    pub reset_at: Instant,
}

impl Window {
    /// Open a fresh window at `now`, counting the request that opened it.
    pub fn open(now: Instant, policy: &Policy) -> Self {
        Self {
            count: 1,
            reset_at: now + policy.window(),
        }
    }

    /// Whether this window still applies at `now`.
    ///
    /// A window is live strictly before its reset instant. At the instant
    /// itself it has expired, so a request arriving exactly then starts
    /// over with a fresh window.
    pub fn is_live(&self, now: Instant) -> bool {
        now < self.reset_at
    }
}

/// Concurrent map from rate keys to their current windows.
///
/// The map is sharded, so operations on different keys do not contend
/// beyond the shard level.
#[derive(Debug, Default)]
pub struct WindowStore {
    windows: DashMap<RateKey, Window>,
}

impl WindowStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            windows: DashMap::new(),
        }
    }

    /// Get a copy of the window for a key, if one is tracked.
    pub fn get(&self, key: &RateKey) -> Option<Window> {
        self.windows.get(key).map(|window| *window)
    }

    /// Insert or replace the window for a key.
    pub fn insert(&self, key: RateKey, window: Window) {
        self.windows.insert(key, window);
    }

    /// Remove the window for a key, returning it if one was tracked.
    pub fn remove(&self, key: &RateKey) -> Option<Window> {
        self.windows.remove(key).map(|(_, window)| window)
    }

    /// Atomically read, transform, and write back the window for a key.
    ///
    /// The closure sees the current window (or `None` when the key is not
    /// tracked) and returns the window to store plus a result to pass back
    /// to the caller. The key's entry stays locked for the whole call, so
    /// no other decision for the same key can interleave.
    pub fn read_modify_write<R>(
        &self,
        key: RateKey,
        op: impl FnOnce(Option<Window>) -> (Window, R),
    ) -> R {
        match self.windows.entry(key) {
            Entry::Occupied(mut entry) => {
                let (next, result) = op(Some(*entry.get()));
                *entry.get_mut() = next;
                result
            }
            Entry::Vacant(entry) => {
                let (next, result) = op(None);
                entry.insert(next);
                result
            }
        }
    }

    /// Remove every window that has expired as of `now`.
    ///
    /// Returns the number of windows removed. The sweep walks the map
    /// shard by shard rather than locking it whole, so decisions on other
    /// keys proceed while it runs. Under concurrent inserts the count is
    /// approximate.
    pub fn evict_expired(&self, now: Instant) -> usize {
        let before = self.windows.len();
        self.windows.retain(|_, window| window.is_live(now));
        before.saturating_sub(self.windows.len())
    }

    /// Get the number of tracked windows.
    pub fn len(&self) -> usize {
        self.windows.len()
    }

    /// Whether the store tracks no windows.
    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }
}
