//! Write-path rate limiting.
//!
//! Sliding window per author, state kept entirely in Redis. Only accepted
//! writes are counted.

use async_trait::async_trait;
use chrono::Utc;
use redis::aio::ConnectionManager;
use redis_utils::SlidingWindow;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

use crate::config::RateLimitSettings;
use crate::error::Result;
use crate::models::RateLimitDecision;

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window: Duration,
    /// Keys are `<prefix>:<identifier>`
    pub key_prefix: String,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 3,
            window: Duration::from_secs(60),
            key_prefix: "@upstash/ratelimit".to_string(),
        }
    }
}

impl RateLimitConfig {
    pub fn key_for(&self, identifier: &str) -> String {
        format!("{}:{}", self.key_prefix, identifier)
    }
}

impl From<&RateLimitSettings> for RateLimitConfig {
    fn from(settings: &RateLimitSettings) -> Self {
        Self {
            max_requests: settings.max_requests,
            window: Duration::from_secs(settings.window_secs),
            key_prefix: settings.key_prefix.clone(),
        }
    }
}

#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Count one event for `identifier` if the window has room.
    async fn limit(&self, identifier: &str) -> Result<RateLimitDecision>;
}

/// Redis sorted-set implementation; one atomic script per check.
#[derive(Clone)]
pub struct RedisRateLimiter {
    redis: ConnectionManager,
    window: SlidingWindow,
    config: RateLimitConfig,
}

impl RedisRateLimiter {
    pub fn new(redis: ConnectionManager, config: RateLimitConfig) -> Self {
        Self {
            redis,
            window: SlidingWindow::new(config.max_requests, config.window),
            config,
        }
    }
}

#[async_trait]
impl RateLimiter for RedisRateLimiter {
    async fn limit(&self, identifier: &str) -> Result<RateLimitDecision> {
        let key = self.config.key_for(identifier);
        let now_ms = Utc::now().timestamp_millis();
        let member = format!("{}:{}", now_ms, Uuid::new_v4());

        let mut conn = self.redis.clone();
        let outcome = self.window.hit(&mut conn, &key, now_ms, &member).await?;

        debug!(
            key = %key,
            allowed = outcome.allowed,
            count = outcome.count,
            "Rate limit check"
        );

        Ok(RateLimitDecision {
            success: outcome.allowed,
            limit: self.config.max_requests,
            remaining: outcome.remaining(self.config.max_requests),
            reset: outcome.reset_at_ms,
        })
    }
}
