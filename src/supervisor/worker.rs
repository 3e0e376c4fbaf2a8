use crate::application_impl::*;
use crate::application_port::*;
use crate::domain_model::SessionSecret;
use crate::domain_port::*;
use crate::infra_postgres::*;
use crate::infra_redis::*;
use crate::logger::*;
use crate::settings::{Db, Settings};
use anyhow::{Result, anyhow};
use sqlx::postgres::PgConnectOptions;
use std::sync::Arc;
use std::time::Duration;
use tracing::Instrument;

fn connect_options(db: &Db) -> PgConnectOptions {
    PgConnectOptions::new()
        .host(&db.host)
        .port(db.port)
        .username(&db.user)
        .password(db.password.expose())
        .database(&db.name)
}

/// Runs one operator session in this process.
///
/// `Err` only when the store cannot be reached or the settings are
/// unusable; every other failure is reported and the worker still exits
/// cleanly.
pub async fn run_worker(settings: &Settings, index: usize, run_id: Option<&str>) -> Result<()> {
    let span = info_span!("worker", index, pid = std::process::id(), run_id);
    async move {
        let secret = settings.session_secret()?;
        let schema = settings.user_schema()?;
        let retry = RetryPolicy {
            attempts: settings.invalidation.attempts,
            backoff: Duration::from_millis(settings.invalidation.backoff),
        };

        let store = PostgresUserStore::connect(
            connect_options(&settings.db),
            &schema,
            Duration::from_millis(settings.db.connect.timeout),
        );
        let cache = RedisClusterSessionCache::connect(settings.cache_nodes());
        let mut prompter = LinePrompter::stdio();
        run_session(store, cache, secret, retry, &mut prompter).await
    }
    .instrument(span)
    .await
}

/// Connects the store, then the cache, then drives one session.
///
/// The store is connected before anything is asked; if that fails the
/// cache is never touched and the prompter is never used.
pub async fn run_session<S, C>(
    connect_store: impl Future<Output = Result<S, StoreError>>,
    connect_cache: impl Future<Output = Result<C, CacheError>>,
    secret: SessionSecret,
    retry: RetryPolicy,
    prompter: &mut dyn Prompter,
) -> Result<()>
where
    S: UserStore + 'static,
    C: SessionCache + 'static,
{
    let store = match connect_store.await {
        Ok(store) => store,
        Err(e) => {
            error!(error = %e, "database connection error");
            return Err(anyhow!(e));
        }
    };

    // Unreachable nodes do not fail here; only a node list that
    // `Settings::validate` would already have refused does.
    let cache = match connect_cache.await {
        Ok(cache) => cache,
        Err(e) => {
            error!(error = %e, "session cache configuration error");
            store.close().await;
            return Err(anyhow!(e));
        }
    };

    let updater = AdminStateUpdater::new(Arc::new(store), Arc::new(cache), secret, retry);
    report(updater.run(prompter).await);
    Ok(())
}

fn report(result: Result<UpdateOutcome, UpdateError>) {
    match result {
        Ok(UpdateOutcome::NotFound(identifier)) => {
            info!(%identifier, "user not found with the provided identifier");
        }
        Ok(UpdateOutcome::Updated {
            record,
            invalidation: Invalidation::Deleted { key, removed },
        }) => {
            info!(
                identifier = %record.identifier,
                is_admin = record.is_admin,
                session = %key,
                removed,
                "admin state updated and session invalidated"
            );
        }
        Ok(UpdateOutcome::Updated {
            record,
            invalidation: Invalidation::Pending { key, error },
        }) => {
            warn!(
                identifier = %record.identifier,
                is_admin = record.is_admin,
                session = %key,
                %error,
                "admin state updated but the old session may stay cached until it expires"
            );
        }
        Err(e) => error!(error = %e, "error updating admin state"),
    }
}
