use admin_flag::application_impl::*;
use admin_flag::application_port::*;
use admin_flag::domain_model::*;
use admin_flag::infra_memory::*;
use std::sync::Arc;
use std::time::Duration;

const SECRET: &[u8] = b"integration-secret";

fn key_for(identifier: &str) -> SessionKey {
    let secret = SessionSecret::new(SECRET).unwrap();
    derive_session_key(&secret, &Identifier::parse(identifier).unwrap())
}

async fn session(
    store: &Arc<MemoryUserStore>,
    cache: &Arc<MemorySessionCache>,
    input: &'static str,
) -> (Result<UpdateOutcome, UpdateError>, String) {
    let updater = AdminStateUpdater::new(
        store.clone(),
        cache.clone(),
        SessionSecret::new(SECRET).unwrap(),
        RetryPolicy {
            attempts: 2,
            backoff: Duration::from_millis(1),
        },
    );
    let mut prompter = LinePrompter::new(input.as_bytes(), Vec::new());
    let result = updater.run(&mut prompter).await;
    let (_, transcript) = prompter.into_inner();
    (result, String::from_utf8(transcript).unwrap())
}

#[tokio::test]
async fn operator_promotes_existing_user() {
    let store = Arc::new(MemoryUserStore::new().with_user("a@b.com", false));
    let cache = Arc::new(MemorySessionCache::new());
    cache.insert(&key_for("a@b.com"));

    let (result, transcript) = session(&store, &cache, "a@b.com\nyes\n").await;

    assert!(matches!(result, Ok(UpdateOutcome::Updated { .. })));
    assert!(transcript.contains("[no]"));
    assert_eq!(store.updates(), vec![("a@b.com".to_string(), true)]);
    assert_eq!(cache.deletes(), vec![key_for("a@b.com")]);
    assert!(!cache.contains(&key_for("a@b.com")));
    assert!(store.is_closed() && cache.is_disconnected());
}

#[tokio::test]
async fn operator_keeps_default_answer() {
    let store = Arc::new(MemoryUserStore::new().with_user("root@b.com", true));
    let cache = Arc::new(MemorySessionCache::new());

    let (result, transcript) = session(&store, &cache, "root@b.com\n\n").await;

    assert!(transcript.contains("[yes]"));
    // Persisted and invalidated even though nothing changed.
    assert_eq!(store.updates(), vec![("root@b.com".to_string(), true)]);
    match result {
        Ok(UpdateOutcome::Updated {
            invalidation: Invalidation::Deleted { removed, .. },
            ..
        }) => assert_eq!(removed, 0),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn unknown_user_touches_nothing() {
    let store = Arc::new(MemoryUserStore::new().with_user("a@b.com", false));
    let cache = Arc::new(MemorySessionCache::new());

    let (result, transcript) = session(&store, &cache, "ghost@x.com\nyes\n").await;

    assert!(matches!(result, Ok(UpdateOutcome::NotFound(_))));
    assert!(!transcript.contains("admin?"));
    assert!(store.updates().is_empty());
    assert!(cache.deletes().is_empty());
    assert!(store.is_closed() && cache.is_disconnected());
}

#[tokio::test]
async fn cache_network_error_still_reaches_cleanup() {
    let store = Arc::new(MemoryUserStore::new().with_user("a@b.com", false));
    let cache = Arc::new(MemorySessionCache::new());
    cache.fail_next(u32::MAX);

    let (result, _) = session(&store, &cache, "a@b.com\nyes\n").await;

    let outcome = result.unwrap();
    assert!(outcome.is_degraded());
    assert_eq!(store.is_admin("a@b.com"), Some(true));
    assert_eq!(cache.deletes(), vec![key_for("a@b.com"); 2]);
    assert!(store.is_closed() && cache.is_disconnected());
}

#[tokio::test]
async fn operator_walks_away_mid_session() {
    let store = Arc::new(MemoryUserStore::new().with_user("a@b.com", false));
    let cache = Arc::new(MemorySessionCache::new());

    let (result, _) = session(&store, &cache, "a@b.com\nperhaps\n").await;

    assert!(matches!(result, Err(UpdateError::Prompt(PromptError::Closed))));
    assert!(store.updates().is_empty());
    assert!(cache.deletes().is_empty());
    assert!(store.is_closed() && cache.is_disconnected());
}
