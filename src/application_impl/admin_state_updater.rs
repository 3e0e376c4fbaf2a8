use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use crate::logger::*;
use futures_util::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

/// One operator session: lookup, confirm, persist, then invalidate the
/// cached session of the user.
///
/// The updater owns its clients for exactly one session. [`run`] releases
/// both of them on every path, a panicking step included.
///
/// [`run`]: AdminStateUpdater::run
pub struct AdminStateUpdater {
    store: Arc<dyn UserStore>,
    cache: Arc<dyn SessionCache>,
    secret: SessionSecret,
    retry: RetryPolicy,
}

impl AdminStateUpdater {
    pub fn new(
        store: Arc<dyn UserStore>,
        cache: Arc<dyn SessionCache>,
        secret: SessionSecret,
        retry: RetryPolicy,
    ) -> Self {
        AdminStateUpdater {
            store,
            cache,
            secret,
            retry,
        }
    }

    pub async fn run(self, prompter: &mut dyn Prompter) -> Result<UpdateOutcome, UpdateError> {
        let result = AssertUnwindSafe(self.update(prompter)).catch_unwind().await;
        self.release().await;
        match result {
            Ok(outcome) => outcome,
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }

    async fn update(&self, prompter: &mut dyn Prompter) -> Result<UpdateOutcome, UpdateError> {
        let identifier = prompter.identifier().await?;

        let record = self
            .store
            .lookup(&identifier)
            .await
            .map_err(|e| UpdateError::Query(e.to_string()))?;
        let Some(record) = record else {
            info!(%identifier, "user not found");
            return Ok(UpdateOutcome::NotFound(identifier));
        };
        info!(%identifier, is_admin = record.is_admin, "found user");

        let is_admin = prompter.confirm_admin(record.is_admin).await?;

        self.store
            .update_privilege(&identifier, is_admin)
            .await
            .map_err(|e| UpdateError::Query(e.to_string()))?;
        info!(%identifier, is_admin, "admin state updated");

        let key = derive_session_key(&self.secret, &identifier);
        let invalidation = self.invalidate(key).await;

        Ok(UpdateOutcome::Updated {
            record: UserRecord {
                identifier,
                is_admin,
            },
            invalidation,
        })
    }

    async fn invalidate(&self, key: SessionKey) -> Invalidation {
        let attempts = self.retry.attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.cache.delete(&key).await {
                Ok(removed) => {
                    info!(%key, removed, "session invalidated");
                    return Invalidation::Deleted { key, removed };
                }
                Err(error) if attempt >= attempts => {
                    error!(%key, attempt, %error, "session invalidation gave up");
                    return Invalidation::Pending { key, error };
                }
                Err(error) => {
                    let delay = self.retry.delay_after(attempt);
                    warn!(%key, attempt, %error, ?delay, "session invalidation failed, retrying");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    async fn release(&self) {
        self.store.close().await;
        self.cache.disconnect().await;
        debug!("clients released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra_memory::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    struct ScriptedPrompter {
        identifier: &'static str,
        answers: VecDeque<bool>,
        offered: Vec<bool>,
    }

    impl ScriptedPrompter {
        fn new(identifier: &'static str, answers: &[bool]) -> Self {
            ScriptedPrompter {
                identifier,
                answers: answers.iter().copied().collect(),
                offered: Vec::new(),
            }
        }
    }

    #[async_trait::async_trait]
    impl Prompter for ScriptedPrompter {
        async fn identifier(&mut self) -> Result<Identifier, PromptError> {
            Identifier::parse(self.identifier).ok_or(PromptError::Closed)
        }

        async fn confirm_admin(&mut self, current: bool) -> Result<bool, PromptError> {
            self.offered.push(current);
            self.answers.pop_front().ok_or(PromptError::Closed)
        }
    }

    fn secret() -> SessionSecret {
        SessionSecret::new(b"test-secret").unwrap()
    }

    fn no_wait(attempts: u32) -> RetryPolicy {
        RetryPolicy {
            attempts,
            backoff: Duration::ZERO,
        }
    }

    fn updater(
        store: &Arc<MemoryUserStore>,
        cache: &Arc<MemorySessionCache>,
        retry: RetryPolicy,
    ) -> AdminStateUpdater {
        AdminStateUpdater::new(store.clone(), cache.clone(), secret(), retry)
    }

    #[tokio::test]
    async fn promotes_user_and_deletes_derived_key() {
        let store = Arc::new(MemoryUserStore::new().with_user("a@b.com", false));
        let cache = Arc::new(MemorySessionCache::new());
        let key = derive_session_key(&secret(), &Identifier::parse("a@b.com").unwrap());
        cache.insert(&key);

        let mut prompter = ScriptedPrompter::new("a@b.com", &[true]);
        let outcome = updater(&store, &cache, no_wait(3))
            .run(&mut prompter)
            .await
            .unwrap();

        assert_eq!(prompter.offered, vec![false]);
        assert_eq!(store.is_admin("a@b.com"), Some(true));
        assert_eq!(cache.deletes(), vec![key.clone()]);
        assert!(!cache.contains(&key));
        match outcome {
            UpdateOutcome::Updated {
                record,
                invalidation: Invalidation::Deleted { key: deleted, removed },
            } => {
                assert!(record.is_admin);
                assert_eq!(deleted, key);
                assert_eq!(removed, 1);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert!(store.is_closed());
        assert!(cache.is_disconnected());
    }

    #[tokio::test]
    async fn absent_user_is_a_no_op() {
        let store = Arc::new(MemoryUserStore::new().with_user("a@b.com", false));
        let cache = Arc::new(MemorySessionCache::new());

        let mut prompter = ScriptedPrompter::new("ghost@x.com", &[true]);
        let outcome = updater(&store, &cache, no_wait(3))
            .run(&mut prompter)
            .await
            .unwrap();

        assert!(matches!(outcome, UpdateOutcome::NotFound(ref id) if id.as_str() == "ghost@x.com"));
        assert!(prompter.offered.is_empty());
        assert!(store.updates().is_empty());
        assert!(cache.deletes().is_empty());
        assert!(store.is_closed());
        assert!(cache.is_disconnected());
    }

    #[tokio::test]
    async fn failed_update_skips_invalidation_and_still_releases() {
        let store = Arc::new(MemoryUserStore::new().with_user("a@b.com", true));
        store.fail_updates();
        let cache = Arc::new(MemorySessionCache::new());

        let mut prompter = ScriptedPrompter::new("a@b.com", &[false]);
        let result = updater(&store, &cache, no_wait(3)).run(&mut prompter).await;

        assert!(matches!(result, Err(UpdateError::Query(_))));
        assert_eq!(store.is_admin("a@b.com"), Some(true));
        assert!(cache.deletes().is_empty());
        assert!(store.is_closed());
        assert!(cache.is_disconnected());
    }

    #[tokio::test]
    async fn cache_outage_degrades_but_keeps_the_update() {
        let store = Arc::new(MemoryUserStore::new().with_user("a@b.com", false));
        let cache = Arc::new(MemorySessionCache::new());
        cache.fail_next(u32::MAX);

        let mut prompter = ScriptedPrompter::new("a@b.com", &[true]);
        let outcome = updater(&store, &cache, no_wait(3))
            .run(&mut prompter)
            .await
            .unwrap();

        assert!(outcome.is_degraded());
        assert_eq!(store.is_admin("a@b.com"), Some(true));
        assert_eq!(cache.deletes().len(), 3);
        assert!(store.is_closed());
        assert!(cache.is_disconnected());
    }

    #[tokio::test]
    async fn transient_cache_failure_is_retried() {
        let store = Arc::new(MemoryUserStore::new().with_user("a@b.com", false));
        let cache = Arc::new(MemorySessionCache::new());
        cache.fail_next(1);

        let mut prompter = ScriptedPrompter::new("a@b.com", &[true]);
        let outcome = updater(&store, &cache, no_wait(3))
            .run(&mut prompter)
            .await
            .unwrap();

        assert!(!outcome.is_degraded());
        assert_eq!(cache.deletes().len(), 2);
    }

    #[tokio::test]
    async fn zero_attempts_still_tries_once() {
        let store = Arc::new(MemoryUserStore::new().with_user("a@b.com", false));
        let cache = Arc::new(MemorySessionCache::new());

        let mut prompter = ScriptedPrompter::new("a@b.com", &[false]);
        updater(&store, &cache, no_wait(0))
            .run(&mut prompter)
            .await
            .unwrap();

        assert_eq!(cache.deletes().len(), 1);
    }

    #[tokio::test]
    async fn closed_prompt_reports_and_releases() {
        let store = Arc::new(MemoryUserStore::new().with_user("a@b.com", false));
        let cache = Arc::new(MemorySessionCache::new());

        let mut prompter = ScriptedPrompter::new("a@b.com", &[]);
        let result = updater(&store, &cache, no_wait(3)).run(&mut prompter).await;

        assert!(matches!(result, Err(UpdateError::Prompt(PromptError::Closed))));
        assert!(store.updates().is_empty());
        assert!(store.is_closed());
        assert!(cache.is_disconnected());
    }

    struct PanickingStore {
        closed: AtomicBool,
    }

    #[async_trait::async_trait]
    impl UserStore for PanickingStore {
        async fn lookup(&self, _: &Identifier) -> Result<Option<UserRecord>, StoreError> {
            panic!("lookup exploded");
        }

        async fn update_privilege(&self, _: &Identifier, _: bool) -> Result<(), StoreError> {
            Ok(())
        }

        async fn close(&self) {
            self.closed.store(true, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn panic_in_a_step_still_releases_clients() {
        let store = Arc::new(PanickingStore {
            closed: AtomicBool::new(false),
        });
        let cache = Arc::new(MemorySessionCache::new());
        let updater =
            AdminStateUpdater::new(store.clone(), cache.clone(), secret(), no_wait(1));

        let handle = tokio::spawn(async move {
            let mut prompter = ScriptedPrompter::new("a@b.com", &[true]);
            updater.run(&mut prompter).await
        });

        assert!(handle.await.unwrap_err().is_panic());
        assert!(store.closed.load(Ordering::SeqCst));
        assert!(cache.is_disconnected());
    }
}
