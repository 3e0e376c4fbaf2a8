use crate::domain_model::SessionKey;
use crate::domain_port::*;
use crate::logger::*;
use redis::cluster::ClusterClient;
use redis::cluster_async::ClusterConnection;
use redis::{AsyncCommands, IntoConnectionInfo, RedisWrite, ToRedisArgs};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;

/// Session cache spread over a Redis cluster.
///
/// Construction never fails on an unreachable topology: the connection is
/// retried on each delete, and node errors are logged as they are seen.
pub struct RedisClusterSessionCache {
    client: ClusterClient,
    conn: Mutex<Option<ClusterConnection>>,
    disconnected: AtomicBool,
}

impl RedisClusterSessionCache {
    /// `redis://host:port/` for each seed node.
    pub fn node_urls(host: &str, ports: &[u16]) -> Vec<String> {
        ports
            .iter()
            .map(|port| format!("redis://{host}:{port}/"))
            .collect()
    }

    /// Rejects node URLs the client could never connect to.
    pub fn check_nodes(nodes: &[String]) -> Result<(), CacheError> {
        for node in nodes {
            node.as_str()
                .into_connection_info()
                .map_err(|e| CacheError::Unavailable(format!("{node}: {e}")))?;
        }
        Ok(())
    }

    /// Only a malformed node list is an error.
    pub async fn connect(nodes: Vec<String>) -> Result<Self, CacheError> {
        if nodes.is_empty() {
            return Err(CacheError::Unavailable("no cache nodes configured".to_string()));
        }
        let client = ClusterClient::new(nodes.clone())
            .map_err(|e| CacheError::Unavailable(e.to_string()))?;
        let cache = RedisClusterSessionCache {
            client,
            conn: Mutex::new(None),
            disconnected: AtomicBool::new(false),
        };

        match cache.connection().await {
            Ok(_) => info!(?nodes, "connected to the session cache"),
            Err(e) => warn!(?nodes, error = %e, "session cache not reachable yet"),
        }
        Ok(cache)
    }

    async fn connection(&self) -> Result<ClusterConnection, CacheError> {
        if self.disconnected.load(Ordering::SeqCst) {
            return Err(CacheError::Unavailable("cache disconnected".to_string()));
        }
        let mut guard = self.conn.lock().await;
        if let Some(conn) = guard.as_ref() {
            return Ok(conn.clone());
        }
        let conn = self
            .client
            .get_async_connection()
            .await
            .map_err(|e| CacheError::Unavailable(e.to_string()))?;
        *guard = Some(conn.clone());
        Ok(conn)
    }
}

impl ToRedisArgs for SessionKey {
    fn write_redis_args<W>(&self, out: &mut W)
    where
        W: ?Sized + RedisWrite,
    {
        out.write_arg(self.0.as_bytes())
    }
}

#[async_trait::async_trait]
impl SessionCache for RedisClusterSessionCache {
    async fn delete(&self, key: &SessionKey) -> Result<u64, CacheError> {
        let mut conn = self.connection().await?;
        let removed: u64 = conn.del(key).await.map_err(|e| {
            error!(%key, error = %e, "cache delete failed");
            CacheError::Command(e.to_string())
        })?;
        Ok(removed)
    }

    async fn disconnect(&self) {
        if !self.disconnected.swap(true, Ordering::SeqCst) {
            self.conn.lock().await.take();
            info!("session cache disconnected");
        }
    }
}
