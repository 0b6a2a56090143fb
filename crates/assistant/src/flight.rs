//! Per-key single-flight locks.
//!
//! The first task to miss on a key becomes the leader and computes the
//! value; tasks arriving while it runs wait on the same async mutex. When
//! a follower acquires the lock it learns (via [`KeyGuard::waited`]) that
//! another task ran first and should re-check the cache before computing.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};

use tokio::sync::{Mutex, OwnedMutexGuard};

type Table = Arc<StdMutex<HashMap<String, Arc<Mutex<()>>>>>;

/// A table of async mutexes keyed by cache key.
///
/// Entries exist only while some task holds or awaits them.
#[derive(Clone, Default)]
pub struct KeyedLocks {
    enabled: bool,
    table: Table,
}

impl KeyedLocks {
    /// `enabled = false` hands out no-op guards, so concurrent misses each
    /// compute independently.
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            table: Table::default(),
        }
    }

    /// Acquire the lock for `key`, waiting for the current holder if any.
    pub async fn lock(&self, key: &str) -> KeyGuard {
        if !self.enabled {
            return KeyGuard {
                _held: None,
                waited: false,
            };
        }

        let mutex = {
            let mut table = self.table.lock().unwrap_or_else(|e| e.into_inner());
            table.entry(key.to_string()).or_default().clone()
        };

        let (guard, waited) = match mutex.clone().try_lock_owned() {
            Ok(guard) => (guard, false),
            Err(_) => (mutex.clone().lock_owned().await, true),
        };

        KeyGuard {
            _held: Some(HeldLock {
                key: key.to_string(),
                table: self.table.clone(),
                mutex,
                guard: Some(guard),
            }),
            waited,
        }
    }

    /// Number of keys currently locked or awaited.
    pub fn len(&self) -> usize {
        self.table.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Holds a key's lock until dropped.
pub struct KeyGuard {
    _held: Option<HeldLock>,
    waited: bool,
}

impl KeyGuard {
    /// True if another task held the key when this guard was requested.
    pub fn waited(&self) -> bool {
        self.waited
    }
}

struct HeldLock {
    key: String,
    table: Table,
    mutex: Arc<Mutex<()>>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for HeldLock {
    fn drop(&mut self) {
        drop(self.guard.take());

        let mut table = self.table.lock().unwrap_or_else(|e| e.into_inner());
        // One reference in the table, one here: nobody else is waiting
        if Arc::strong_count(&self.mutex) == 2 {
            table.remove(&self.key);
        }
    }
}
