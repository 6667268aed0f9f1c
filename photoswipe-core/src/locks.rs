//! Keyed async critical sections.
//!
//! [`KeyedLocks`] hands out one `tokio` mutex per key. It backs the
//! per-session refresh guard and the per-(session, title) album guard.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// A registry of async mutexes, one per key.
///
/// Entries nobody holds or waits on are pruned the next time a lock is taken,
/// so the registry only grows with the number of keys in use at once.
pub struct KeyedLocks<K> {
    locks: Mutex<HashMap<K, Arc<AsyncMutex<()>>>>,
}

impl<K: Eq + Hash + Clone> KeyedLocks<K> {
    pub fn new() -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Wait for exclusive access to `key`.
    ///
    /// The critical section lasts until the returned guard is dropped,
    /// including when the owning future is cancelled.
    pub async fn lock(&self, key: &K) -> OwnedMutexGuard<()> {
        let mutex = {
            let mut locks = self.locks.lock();
            locks.retain(|_, m| Arc::strong_count(m) > 1);
            locks.entry(key.clone()).or_default().clone()
        };
        mutex.lock_owned().await
    }

    /// Whether some task currently holds the lock for `key`.
    pub fn is_locked(&self, key: &K) -> bool {
        self.locks
            .lock()
            .get(key)
            .is_some_and(|m| m.try_lock().is_err())
    }

    /// Number of keys with a live lock entry.
    pub fn len(&self) -> usize {
        self.locks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K: Eq + Hash + Clone> Default for KeyedLocks<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> std::fmt::Debug for KeyedLocks<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyedLocks")
            .field("keys_count", &self.locks.lock().len())
            .finish()
    }
}
