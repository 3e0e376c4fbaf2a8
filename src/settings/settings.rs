use crate::domain_model::SessionSecret;
use crate::infra_postgres::UserSchema;
use crate::infra_redis::RedisClusterSessionCache;
use anyhow::{Result, anyhow};
use config::{Config, Environment, File};
use serde::de::{self, Deserializer, SeqAccess, Unexpected, Visitor};
use serde::Deserialize;
use std::fmt;

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub db: Db,
    pub redis: Redis,
    #[serde(default)]
    pub secret: Secret,
    pub log: Log,
    pub invalidation: Invalidation,
    pub workers: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct Db {
    pub user: String,
    pub password: Redacted,
    pub host: String,
    pub port: u16,
    pub name: String,
    pub table: String,
    pub identifier: String, // column holding the identifier
    pub flag: String,       // boolean admin column
    pub connect: Connect,
}

#[derive(Debug, Deserialize)]
pub struct Connect {
    pub timeout: u64, // milliseconds
}

#[derive(Debug, Deserialize)]
pub struct Redis {
    pub host: String,
    #[serde(deserialize_with = "port_list")]
    pub ports: Vec<u16>,
}

/// Accepts a TOML array, a single number, or a comma-separated string, so
/// `REDIS_PORTS=7000` and `REDIS_PORTS=7000,7001` both load.
fn port_list<'de, D>(deserializer: D) -> Result<Vec<u16>, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(PortList)
}

struct PortList;

impl<'de> Visitor<'de> for PortList {
    type Value = Vec<u16>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a port, a list of ports, or comma-separated ports")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        u16::try_from(v)
            .map(|port| vec![port])
            .map_err(|_| E::invalid_value(Unexpected::Unsigned(v), &self))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        match u64::try_from(v) {
            Ok(v) => self.visit_u64(v),
            Err(_) => Err(E::invalid_value(Unexpected::Signed(v), &self)),
        }
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        v.split(',')
            .map(str::trim)
            .filter(|port| !port.is_empty())
            .map(|port| {
                port.parse::<u16>()
                    .map_err(|_| E::invalid_value(Unexpected::Str(port), &self))
            })
            .collect()
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let mut ports = Vec::new();
        while let Some(port) = seq.next_element::<u16>()? {
            ports.push(port);
        }
        Ok(ports)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct Secret {
    pub key: Option<Redacted>,
}

#[derive(Debug, Deserialize)]
pub struct Log {
    pub filter: String,
}

#[derive(Debug, Deserialize)]
pub struct Invalidation {
    pub attempts: u32,
    pub backoff: u64, // milliseconds
}

/// A string that never shows up in `Debug` output.
#[derive(Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct Redacted(String);

impl Redacted {
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Redacted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<redacted>")
    }
}

impl Settings {
    /// Fails closed: no secret, no fallback.
    pub fn session_secret(&self) -> Result<SessionSecret> {
        let key = self
            .secret
            .key
            .as_ref()
            .ok_or_else(|| anyhow!("SECRET_KEY is not set"))?;
        SessionSecret::new(key.expose().as_bytes()).map_err(|e| anyhow!("SECRET_KEY: {e}"))
    }

    pub fn user_schema(&self) -> Result<UserSchema> {
        UserSchema::new(&self.db.table, &self.db.identifier, &self.db.flag)
    }

    pub fn cache_nodes(&self) -> Vec<String> {
        RedisClusterSessionCache::node_urls(&self.redis.host, &self.redis.ports)
    }

    /// Everything a worker needs before it may start.
    pub fn validate(&self) -> Result<()> {
        self.session_secret()?;
        self.user_schema()?;
        if self.redis.ports.is_empty() {
            return Err(anyhow!("REDIS_PORTS lists no cache nodes"));
        }
        RedisClusterSessionCache::check_nodes(&self.cache_nodes())
            .map_err(|e| anyhow!("REDIS_HOST/REDIS_PORTS: {e}"))?;
        if self.workers == Some(0) {
            return Err(anyhow!("WORKERS must be at least 1"));
        }
        Ok(())
    }
}

#[cfg(debug_assertions)]
const SETTINGS_PATH: &str = "settings/dev.toml";
#[cfg(not(debug_assertions))]
const SETTINGS_PATH: &str = "settings/release.toml";

/// File first, environment on top. An explicit path must exist; the
/// default one may be absent.
pub fn parse_settings(path: Option<&str>) -> Result<Settings> {
    let file = match path {
        Some(path) => File::with_name(path).required(true),
        None => File::with_name(SETTINGS_PATH).required(false),
    };

    build_settings(
        file,
        Environment::default().separator("_").try_parsing(true),
    )
}

fn build_settings<F, E>(file: F, env: E) -> Result<Settings>
where
    F: config::Source + Send + Sync + 'static,
    E: config::Source + Send + Sync + 'static,
{
    let settings: Settings = Config::builder()
        .set_default("db.host", "localhost")
        .and_then(|b| b.set_default("db.port", 5432))
        .and_then(|b| b.set_default("db.table", "user"))
        .and_then(|b| b.set_default("db.identifier", "email"))
        .and_then(|b| b.set_default("db.flag", "admin"))
        .and_then(|b| b.set_default("db.connect.timeout", 5000))
        .and_then(|b| b.set_default("redis.host", "localhost"))
        .and_then(|b| b.set_default("log.filter", "info"))
        .and_then(|b| b.set_default("invalidation.attempts", 3))
        .and_then(|b| b.set_default("invalidation.backoff", 100))
        .map_err(|e| anyhow!(e))?
        .add_source(file)
        .add_source(env)
        .build()
        .map_err(|e| anyhow!(e))?
        .try_deserialize()
        .map_err(|e| anyhow!(e))?;

    Ok(settings)
}
