use crate::domain_model::*;
use crate::domain_port::CacheError;
use std::time::Duration;

use super::PromptError;

/// How the session cache reacted once the store was updated.
#[derive(Debug)]
pub enum Invalidation {
    /// The delete went through; `removed` is 0 when no entry existed.
    Deleted { key: SessionKey, removed: u64 },
    /// Every attempt failed. The store holds the new flag but a stale
    /// session may survive until the cache expires it.
    Pending { key: SessionKey, error: CacheError },
}

#[derive(Debug)]
pub enum UpdateOutcome {
    NotFound(Identifier),
    Updated {
        record: UserRecord,
        invalidation: Invalidation,
    },
}

impl UpdateOutcome {
    /// Updated, but the cache still may hold the old privilege level.
    pub fn is_degraded(&self) -> bool {
        matches!(
            self,
            UpdateOutcome::Updated {
                invalidation: Invalidation::Pending { .. },
                ..
            }
        )
    }
}

/// Failures reported to the operator. None of them stop the worker pool.
#[derive(Debug, thiserror::Error)]
pub enum UpdateError {
    #[error("failed to read or write user record: {0}")]
    Query(String),
    #[error("prompt failed: {0}")]
    Prompt(#[from] PromptError),
}

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    /// Delay before attempt `n + 1`, doubling from `backoff`.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = 1u32 << attempt.saturating_sub(1).min(16);
        self.backoff.saturating_mul(factor)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            attempts: 3,
            backoff: Duration::from_millis(100),
        }
    }
}
