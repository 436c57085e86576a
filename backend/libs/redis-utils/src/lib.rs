//! Redis helpers shared by Chirp services
//!
//! - [`RedisPool`]: connection bootstrap around a multiplexed `ConnectionManager`
//! - [`sliding_window`]: atomic sliding-window event counter used for rate limiting

pub mod sliding_window;

pub use sliding_window::{SlidingWindow, WindowOutcome};

use anyhow::{Context, Result};
use redis::aio::ConnectionManager;
use redis::{Client, IntoConnectionInfo, RedisError};
use std::time::Duration;
use tokio::time::timeout;
use tracing::info;

/// Redis connection pool.
///
/// `ConnectionManager` multiplexes a single connection and reconnects on
/// failure; clones share the same underlying connection.
#[derive(Clone)]
pub struct RedisPool {
    manager: ConnectionManager,
}

impl RedisPool {
    pub async fn connect(redis_url: &str) -> Result<Self> {
        let info = redis_url
            .into_connection_info()
            .context("failed to parse REDIS_URL connection string")?;
        let addr_label = info.addr.to_string();

        let client = Client::open(info).context("failed to construct Redis client")?;
        let manager = ConnectionManager::new(client)
            .await
            .context("failed to initialize Redis connection manager")?;

        info!("Redis connection manager ready at {}", addr_label);

        Ok(Self { manager })
    }

    pub fn manager(&self) -> ConnectionManager {
        self.manager.clone()
    }
}

/// PING with an upper bound on latency; used by readiness probes.
pub async fn ping(manager: &ConnectionManager, timeout_ms: u64) -> Result<(), RedisError> {
    let mut conn = manager.clone();
    let pong: String = match timeout(
        Duration::from_millis(timeout_ms),
        redis::cmd("PING").query_async(&mut conn),
    )
    .await
    {
        Ok(result) => result?,
        Err(_) => {
            return Err(RedisError::from((
                redis::ErrorKind::IoError,
                "PING timed out",
            )))
        }
    };

    if pong == "PONG" {
        Ok(())
    } else {
        Err(RedisError::from((
            redis::ErrorKind::ResponseError,
            "unexpected PING response",
        )))
    }
}
