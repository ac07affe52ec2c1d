//! Per-key async locks serializing read-modify-write cycles on one record.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::error::{BlacklistError, Result};

/// Lazily creates one lock per key and hands out the same lock for repeated
/// lookups. Entries are dropped again once nobody holds or waits on them.
#[derive(Clone, Default)]
pub struct KeyedLocks {
    locks: Arc<Mutex<HashMap<String, Arc<AsyncMutex<()>>>>>,
}

/// Held while a key is locked. Releases on drop.
pub struct KeyGuard {
    key: String,
    locks: Arc<Mutex<HashMap<String, Arc<AsyncMutex<()>>>>>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until `key` is free, then hold it until the guard drops.
    pub async fn acquire(&self, key: &str) -> Result<KeyGuard> {
        let lock = {
            let mut locks = self
                .locks
                .lock()
                .map_err(|_| BlacklistError::LockPoisoned("keyed lock map"))?;
            locks
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };
        let guard = lock.lock_owned().await;
        Ok(KeyGuard {
            key: key.to_string(),
            locks: Arc::clone(&self.locks),
            guard: Some(guard),
        })
    }

    /// Number of keys currently tracked.
    pub fn tracked(&self) -> usize {
        self.locks.lock().map(|l| l.len()).unwrap_or(0)
    }
}

impl Drop for KeyGuard {
    fn drop(&mut self) {
        // Release first so a waiter can proceed even if the map is poisoned.
        drop(self.guard.take());
        if let Ok(mut locks) = self.locks.lock() {
            // Only the map still references the lock: nobody is waiting.
            if locks
                .get(&self.key)
                .map_or(false, |lock| Arc::strong_count(lock) == 1)
            {
                locks.remove(&self.key);
            }
        }
    }
}
