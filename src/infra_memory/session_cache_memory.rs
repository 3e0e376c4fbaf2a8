use crate::domain_model::SessionKey;
use crate::domain_port::*;
use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

#[derive(Debug, Default)]
pub struct MemorySessionCache {
    entries: Mutex<HashSet<String>>,
    deletes: Mutex<Vec<SessionKey>>,
    failures_left: AtomicU32,
    disconnected: AtomicBool,
}

impl MemorySessionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, key: &SessionKey) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.0.clone());
        }
    }

    pub fn contains(&self, key: &SessionKey) -> bool {
        self.entries
            .lock()
            .map(|e| e.contains(&key.0))
            .unwrap_or(false)
    }

    /// The next `n` deletes fail as if the node were unreachable.
    pub fn fail_next(&self, n: u32) {
        self.failures_left.store(n, Ordering::SeqCst);
    }

    /// Every delete attempt, failed ones included.
    pub fn deletes(&self) -> Vec<SessionKey> {
        self.deletes.lock().map(|d| d.clone()).unwrap_or_default()
    }

    pub fn is_disconnected(&self) -> bool {
        self.disconnected.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl SessionCache for MemorySessionCache {
    async fn delete(&self, key: &SessionKey) -> Result<u64, CacheError> {
        if let Ok(mut deletes) = self.deletes.lock() {
            deletes.push(key.clone());
        }
        if self.is_disconnected() {
            return Err(CacheError::Unavailable("cache disconnected".to_string()));
        }
        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(CacheError::Unavailable("simulated node outage".to_string()));
        }
        let removed = self
            .entries
            .lock()
            .map_err(|e| CacheError::Command(format!("poisoned: {e}")))?
            .remove(&key.0);
        Ok(u64::from(removed))
    }

    async fn disconnect(&self) {
        self.disconnected.store(true, Ordering::SeqCst);
    }
}
