//! Service configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`).

use std::collections::HashMap;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, bail};

/// Where elections are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    /// Process-local maps; contents are lost on restart.
    Memory,
    /// PostgreSQL through `sqlx`.
    Postgres,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "postgres" | "postgresql" => Ok(Self::Postgres),
            other => bail!("unknown storage backend {other:?} (expected memory or postgres)"),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines.
    Text,
    /// One JSON object per line.
    Json,
}

impl LogFormat {
    /// Reads `LOG_FORMAT`; anything but `json` selects [`LogFormat::Text`].
    ///
    /// Read separately from [`ServerConfig::from_env`] so logging can be
    /// installed before the rest of the configuration is validated.
    #[must_use]
    pub fn from_env() -> Self {
        match std::env::var("LOG_FORMAT") {
            Ok(v) if v.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Text,
        }
    }
}

/// Top-level service configuration.
///
/// Loaded once at startup via [`ServerConfig::from_env`].
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address to bind the HTTP server to (e.g. `0.0.0.0:3000`).
    pub listen_addr: SocketAddr,

    /// Selected storage backend.
    pub storage_backend: StorageBackend,

    /// PostgreSQL connection string. Required for [`StorageBackend::Postgres`].
    pub database_url: Option<String>,

    /// Maximum number of database connections in the pool.
    pub database_max_connections: u32,

    /// Minimum idle connections in the pool.
    pub database_min_connections: u32,

    /// Timeout in seconds for acquiring a database connection.
    pub database_connect_timeout_secs: u64,

    /// Capacity of the EventBus broadcast channel.
    pub event_bus_capacity: usize,

    /// How long computed results stay cached.
    pub results_cache_ttl: Duration,

    /// Upper bound on request handling time.
    pub request_timeout: Duration,

    /// Accepted credentials mapped to the user id they authenticate.
    pub auth_credentials: HashMap<String, String>,

    /// Log output format.
    pub log_format: LogFormat,
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    ///
    /// Falls back to sensible defaults when a variable is not set.
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns an error if `LISTEN_ADDR`, `STORAGE_BACKEND`, or
    /// `AUTH_CREDENTIALS` cannot be parsed, or if the postgres backend is
    /// selected without `DATABASE_URL`.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let listen_addr: SocketAddr = std::env::var("LISTEN_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:3000".to_string())
            .parse()
            .context("invalid LISTEN_ADDR")?;

        let storage_backend: StorageBackend = std::env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "memory".to_string())
            .parse()?;

        let database_url = std::env::var("DATABASE_URL").ok();
        if storage_backend == StorageBackend::Postgres && database_url.is_none() {
            bail!("STORAGE_BACKEND=postgres requires DATABASE_URL");
        }

        let auth_credentials =
            parse_credentials(&std::env::var("AUTH_CREDENTIALS").unwrap_or_default())?;
        if auth_credentials.is_empty() {
            tracing::warn!("AUTH_CREDENTIALS is empty; every API request will be rejected");
        }

        Ok(Self {
            listen_addr,
            storage_backend,
            database_url,
            database_max_connections: parse_env("DATABASE_MAX_CONNECTIONS", 10),
            database_min_connections: parse_env("DATABASE_MIN_CONNECTIONS", 2),
            database_connect_timeout_secs: parse_env("DATABASE_CONNECT_TIMEOUT_SECS", 5),
            event_bus_capacity: parse_env("EVENT_BUS_CAPACITY", 10_000),
            results_cache_ttl: Duration::from_secs(parse_env("RESULTS_CACHE_TTL_SECS", 300)),
            request_timeout: Duration::from_secs(parse_env("REQUEST_TIMEOUT_SECS", 30)),
            auth_credentials,
            log_format: LogFormat::from_env(),
        })
    }
}

/// Parses `credential:user_id` pairs separated by commas.
///
/// # Errors
///
/// Returns an error for an entry without a `:` or with an empty side.
pub fn parse_credentials(raw: &str) -> anyhow::Result<HashMap<String, String>> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (credential, user_id) = entry
                .split_once(':')
                .with_context(|| format!("AUTH_CREDENTIALS entry {entry:?} is missing ':'"))?;
            let (credential, user_id) = (credential.trim(), user_id.trim());
            if credential.is_empty() || user_id.is_empty() {
                bail!("AUTH_CREDENTIALS entry {entry:?} has an empty side");
            }
            Ok((credential.to_string(), user_id.to_string()))
        })
        .collect()
}

/// Parses an environment variable as `T`, returning `default` on missing
/// or invalid values.
fn parse_env<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
