use crate::domain_model::*;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Store unreachable or credentials rejected. Fatal to the worker.
    #[error("store connection error: {0}")]
    Connection(String),
    /// A statement failed after the connection was established.
    #[error("store query error: {0}")]
    Query(String),
}

/// Persistent identity store holding one record per identifier.
#[async_trait::async_trait]
pub trait UserStore: Send + Sync {
    /// A missing row is `Ok(None)`, never an error.
    async fn lookup(&self, identifier: &Identifier) -> Result<Option<UserRecord>, StoreError>;

    /// Attempted exactly once; no retry happens here.
    async fn update_privilege(
        &self,
        identifier: &Identifier,
        is_admin: bool,
    ) -> Result<(), StoreError>;

    /// Releases the connection. Safe to call more than once.
    async fn close(&self);
}
