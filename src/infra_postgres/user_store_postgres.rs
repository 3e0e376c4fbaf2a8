use super::UserSchema;
use crate::domain_model::*;
use crate::domain_port::*;
use crate::logger::*;
use sqlx::PgPool;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use std::time::Duration;

pub struct PostgresUserStore {
    pool: PgPool,
    lookup_sql: String,
    update_sql: String,
}

impl PostgresUserStore {
    /// Opens the single connection this worker uses. Failing here, or not
    /// succeeding within `timeout`, is fatal for the worker.
    pub async fn connect(
        options: PgConnectOptions,
        schema: &UserSchema,
        timeout: Duration,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(timeout)
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        info!("connected to the identity store");

        Ok(PostgresUserStore {
            pool,
            lookup_sql: format!(
                "SELECT {flag} FROM {table} WHERE {id} = $1",
                flag = schema.flag,
                table = schema.table,
                id = schema.identifier,
            ),
            update_sql: format!(
                "UPDATE {table} SET {flag} = $1 WHERE {id} = $2",
                table = schema.table,
                flag = schema.flag,
                id = schema.identifier,
            ),
        })
    }
}

#[async_trait::async_trait]
impl UserStore for PostgresUserStore {
    async fn lookup(&self, identifier: &Identifier) -> Result<Option<UserRecord>, StoreError> {
        // A NULL flag reads as "not admin".
        let flag: Option<Option<bool>> = sqlx::query_scalar(&self.lookup_sql)
            .bind(identifier.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::Query(format!("lookup {identifier}: {e}")))?;

        Ok(flag.map(|is_admin| UserRecord {
            identifier: identifier.clone(),
            is_admin: is_admin.unwrap_or(false),
        }))
    }

    async fn update_privilege(
        &self,
        identifier: &Identifier,
        is_admin: bool,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(&self.update_sql)
            .bind(is_admin)
            .bind(identifier.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Query(format!("update {identifier}: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Query(format!(
                "update {identifier}: record disappeared"
            )));
        }
        Ok(())
    }

    async fn close(&self) {
        if !self.pool.is_closed() {
            self.pool.close().await;
            info!("identity store connection closed");
        }
    }
}
