//! Concurrent string store with TTL-driven eviction.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, Weak};

use tokio::sync::mpsc::Receiver;
use tracing::debug;

use crate::expiry::{unix_now, ExpiryQueue};

type Entries = Arc<RwLock<HashMap<String, String>>>;

/// Shared handle to the in-memory key space. Cloning is cheap; every clone
/// operates on the same map and the same expiry queue.
#[derive(Clone)]
pub struct Store {
    entries: Entries,
    expiry: ExpiryQueue,
}

impl Store {
    pub fn new() -> Store {
        let entries: Entries = Arc::new(RwLock::new(HashMap::new()));
        let (expiry, evictions) = ExpiryQueue::new();
        tokio::spawn(evict(Arc::downgrade(&entries), evictions));
        Store { entries, expiry }
    }

    /// Returns the current value for `key`, if any.
    pub fn load(&self, key: &str) -> Option<String> {
        self.entries.read().unwrap().get(key).cloned()
    }

    /// Unconditionally inserts or overwrites `key`. Any pending expiry for
    /// the key is dropped; a plain write starts a fresh, unlimited lifetime.
    pub fn store(&self, key: &str, value: String) {
        self.expiry.cancel(key);
        self.entries.write().unwrap().insert(key.to_string(), value);
    }

    /// Stores `key` and schedules it to expire `ttl_secs` seconds from now.
    pub fn store_with_ttl(&self, key: &str, value: String, ttl_secs: i64) {
        self.entries.write().unwrap().insert(key.to_string(), value);
        self.expiry
            .schedule(key, unix_now().saturating_add_signed(ttl_secs));
    }

    /// Removes `key`, reporting whether it was present.
    pub fn delete(&self, key: &str) -> bool {
        self.expiry.cancel(key);
        self.entries.write().unwrap().remove(key).is_some()
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies evictions emitted by the expiry sweeper. Holds only a weak map
/// reference: tearing down the store ends this task and, through the dropped
/// channel, the sweeper.
async fn evict(entries: Weak<RwLock<HashMap<String, String>>>, mut evictions: Receiver<String>) {
    while let Some(key) = evictions.recv().await {
        let Some(entries) = entries.upgrade() else {
            return;
        };
        if entries.write().unwrap().remove(&key).is_some() {
            debug!(key = %key, "evicted expired key");
        }
    }
}
