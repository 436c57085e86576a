//! Database connection pool management
//!
//! Provides PostgreSQL pool creation and env-driven configuration

mod metrics;

pub use metrics::PoolStats;

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::fmt;
use std::time::Duration;
use tracing::{debug, error, info};

/// Database connection pool configuration
#[derive(Clone)]
pub struct DbConfig {
    /// Service name for metrics labeling
    pub service_name: String,
    /// PostgreSQL connection URL
    pub database_url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    /// Connection creation timeout (new connection to PostgreSQL)
    pub connect_timeout_secs: u64,
    /// Connection acquisition timeout (get connection from pool)
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub max_lifetime_secs: u64,
}

impl fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbConfig")
            .field("service_name", &self.service_name)
            .field("database_url", &"[REDACTED]")
            .field("max_connections", &self.max_connections)
            .field("min_connections", &self.min_connections)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("acquire_timeout_secs", &self.acquire_timeout_secs)
            .field("idle_timeout_secs", &self.idle_timeout_secs)
            .field("max_lifetime_secs", &self.max_lifetime_secs)
            .finish()
    }
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            service_name: String::from("unknown"),
            database_url: String::new(),
            max_connections: 10,
            min_connections: 2,
            connect_timeout_secs: 5,
            acquire_timeout_secs: 10,
            idle_timeout_secs: 600,
            max_lifetime_secs: 1800,
        }
    }
}

impl DbConfig {
    /// Build a config for `service_name` from `database_url`, letting the
    /// `DB_*` environment variables override pool sizing and timeouts.
    pub fn from_env(service_name: &str, database_url: &str) -> Self {
        let defaults = Self::default();

        Self {
            service_name: service_name.to_string(),
            database_url: database_url.to_string(),
            max_connections: env_or("DB_MAX_CONNECTIONS", defaults.max_connections),
            min_connections: env_or("DB_MIN_CONNECTIONS", defaults.min_connections),
            connect_timeout_secs: env_or("DB_CONNECT_TIMEOUT_SECS", defaults.connect_timeout_secs),
            acquire_timeout_secs: env_or("DB_ACQUIRE_TIMEOUT_SECS", defaults.acquire_timeout_secs),
            idle_timeout_secs: env_or("DB_IDLE_TIMEOUT_SECS", defaults.idle_timeout_secs),
            max_lifetime_secs: env_or("DB_MAX_LIFETIME_SECS", defaults.max_lifetime_secs),
        }
    }

    pub fn log_config(&self) {
        info!(
            service = %self.service_name,
            max_connections = self.max_connections,
            min_connections = self.min_connections,
            acquire_timeout_secs = self.acquire_timeout_secs,
            idle_timeout_secs = self.idle_timeout_secs,
            max_lifetime_secs = self.max_lifetime_secs,
            "Database pool configuration"
        );
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Pool options derived from `config`; connections are not opened yet.
pub fn pool_options(config: &DbConfig) -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections.min(config.max_connections))
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
        .max_lifetime(Duration::from_secs(config.max_lifetime_secs))
        .test_before_acquire(true)
}

/// Connect, verify with `SELECT 1` within the connect timeout, then start
/// publishing pool gauges every 30 seconds.
pub async fn create_pool(config: DbConfig) -> Result<PgPool, sqlx::Error> {
    debug!(service = %config.service_name, "Creating database pool");

    let pool = pool_options(&config).connect(&config.database_url).await?;
    let verify_timeout = Duration::from_secs(config.connect_timeout_secs);

    let verification = sqlx::query("SELECT 1").execute(&pool);
    let verified = match tokio::time::timeout(verify_timeout, verification).await {
        Ok(result) => result.map(|_| ()),
        Err(_) => Err(sqlx::Error::PoolTimedOut),
    };

    if let Err(e) = verified {
        error!(
            service = %config.service_name,
            error = %e,
            "Database connection verification failed"
        );
        return Err(e);
    }

    info!(service = %config.service_name, "Database pool ready");
    spawn_metrics_reporter(pool.clone(), config.service_name);

    Ok(pool)
}

fn spawn_metrics_reporter(pool: PgPool, service: String) {
    metrics::record(&service, PoolStats::of(&pool));
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(30));
        while !pool.is_closed() {
            interval.tick().await;
            metrics::record(&service, PoolStats::of(&pool));
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    const DB_VARS: [&str; 6] = [
        "DB_MAX_CONNECTIONS",
        "DB_MIN_CONNECTIONS",
        "DB_CONNECT_TIMEOUT_SECS",
        "DB_ACQUIRE_TIMEOUT_SECS",
        "DB_IDLE_TIMEOUT_SECS",
        "DB_MAX_LIFETIME_SECS",
    ];

    fn clear_db_vars() {
        for key in DB_VARS {
            std::env::remove_var(key);
        }
    }

    #[test]
    #[serial_test::serial]
    fn test_config_from_env_without_override() {
        clear_db_vars();

        let config = DbConfig::from_env("post-service", "postgres://localhost/chirp");
        assert_eq!(config.service_name, "post-service");
        assert_eq!(config.database_url, "postgres://localhost/chirp");
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.min_connections, 2);
        assert_eq!(config.connect_timeout_secs, 5);
        assert_eq!(config.acquire_timeout_secs, 10);
    }

    #[test]
    #[serial_test::serial]
    fn test_env_override() {
        clear_db_vars();
        std::env::set_var("DB_MAX_CONNECTIONS", "40");
        std::env::set_var("DB_MIN_CONNECTIONS", "not-a-number");

        let config = DbConfig::from_env("post-service", "postgres://localhost/chirp");
        assert_eq!(config.max_connections, 40);
        // Unparseable values fall back to the default
        assert_eq!(config.min_connections, 2);

        clear_db_vars();
    }

    #[test]
    fn test_pool_options_clamp_min_to_max() {
        let config = DbConfig {
            max_connections: 4,
            min_connections: 8,
            ..DbConfig::default()
        };
        let options = pool_options(&config);
        assert_eq!(options.get_max_connections(), 4);
        assert_eq!(options.get_min_connections(), 4);
    }

    #[test]
    fn test_debug_redacts_url() {
        let config = DbConfig::from_env("post-service", "postgres://user:secret@db/chirp");
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("[REDACTED]"));
    }
}
