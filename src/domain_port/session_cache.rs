use crate::domain_model::SessionKey;

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cache unavailable: {0}")]
    Unavailable(String),
    #[error("cache command failed: {0}")]
    Command(String),
}

/// Distributed session cache. Only deletion is ever needed here; entry
/// values belong to whichever subsystem issued the session.
#[async_trait::async_trait]
pub trait SessionCache: Send + Sync {
    /// Returns the number of removed entries; an absent key yields 0.
    async fn delete(&self, key: &SessionKey) -> Result<u64, CacheError>;

    /// Drops every node connection. Safe to call more than once.
    async fn disconnect(&self);
}
