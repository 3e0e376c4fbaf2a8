use crate::domain_model::*;
use crate::domain_port::*;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Default)]
pub struct MemoryUserStore {
    users: Mutex<HashMap<String, bool>>,
    updates: Mutex<Vec<(String, bool)>>,
    fail_updates: AtomicBool,
    closed: AtomicBool,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(self, identifier: &str, is_admin: bool) -> Self {
        if let Ok(mut users) = self.users.lock() {
            users.insert(identifier.to_string(), is_admin);
        }
        self
    }

    /// Every later `update_privilege` fails with a query error.
    pub fn fail_updates(&self) {
        self.fail_updates.store(true, Ordering::SeqCst);
    }

    pub fn is_admin(&self, identifier: &str) -> Option<bool> {
        self.users.lock().ok()?.get(identifier).copied()
    }

    /// Successful writes, in order.
    pub fn updates(&self) -> Vec<(String, bool)> {
        self.updates.lock().map(|u| u.clone()).unwrap_or_default()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn users(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, bool>>, StoreError> {
        self.users
            .lock()
            .map_err(|e| StoreError::Query(format!("poisoned: {e}")))
    }
}

#[async_trait::async_trait]
impl UserStore for MemoryUserStore {
    async fn lookup(&self, identifier: &Identifier) -> Result<Option<UserRecord>, StoreError> {
        if self.is_closed() {
            return Err(StoreError::Connection("store closed".to_string()));
        }
        Ok(self
            .users()?
            .get(identifier.as_str())
            .map(|&is_admin| UserRecord {
                identifier: identifier.clone(),
                is_admin,
            }))
    }

    async fn update_privilege(
        &self,
        identifier: &Identifier,
        is_admin: bool,
    ) -> Result<(), StoreError> {
        if self.is_closed() {
            return Err(StoreError::Connection("store closed".to_string()));
        }
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(StoreError::Query("simulated write failure".to_string()));
        }
        match self.users()?.get_mut(identifier.as_str()) {
            Some(flag) => *flag = is_admin,
            None => return Err(StoreError::Query(format!("no row for {identifier}"))),
        }
        if let Ok(mut updates) = self.updates.lock() {
            updates.push((identifier.to_string(), is_admin));
        }
        Ok(())
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}
