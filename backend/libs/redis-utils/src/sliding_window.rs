//! Sliding-window event counter backed by a Redis sorted set.
//!
//! Each accepted event is stored as a member scored by its timestamp (ms).
//! A single Lua script trims expired members, counts what remains and only
//! records the new event when the count is below the limit, so concurrent
//! callers never over-admit. Rejected attempts are not recorded.

use once_cell::sync::Lazy;
use redis::aio::ConnectionLike;
use redis::{RedisResult, Script};
use std::time::Duration;

static SLIDING_WINDOW_SCRIPT: Lazy<Script> = Lazy::new(|| {
    Script::new(
        r#"
        local key = KEYS[1]
        local now = tonumber(ARGV[1])
        local window = tonumber(ARGV[2])
        local limit = tonumber(ARGV[3])
        local member = ARGV[4]

        redis.call('ZREMRANGEBYSCORE', key, '-inf', now - window)
        local count = redis.call('ZCARD', key)
        local allowed = 0
        if count < limit then
            redis.call('ZADD', key, now, member)
            count = count + 1
            allowed = 1
        end
        redis.call('PEXPIRE', key, window)

        local reset = now + window
        local oldest = redis.call('ZRANGE', key, 0, 0, 'WITHSCORES')
        if oldest[2] then
            reset = tonumber(oldest[2]) + window
        end
        return {allowed, count, reset}
        "#,
    )
});

/// Result of one window hit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowOutcome {
    pub allowed: bool,
    /// Events counted in the window after this hit
    pub count: u32,
    /// Epoch millis at which the oldest counted event leaves the window
    pub reset_at_ms: i64,
}

impl WindowOutcome {
    pub fn remaining(&self, max_events: u32) -> u32 {
        max_events.saturating_sub(self.count)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SlidingWindow {
    max_events: u32,
    window: Duration,
}

impl SlidingWindow {
    pub fn new(max_events: u32, window: Duration) -> Self {
        Self { max_events, window }
    }

    pub fn max_events(&self) -> u32 {
        self.max_events
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn window_ms(&self) -> i64 {
        self.window.as_millis() as i64
    }

    /// Record an event for `key` at `now_ms` if the window has room.
    ///
    /// `member` must be unique per event (two events in the same millisecond
    /// would otherwise collapse into one sorted-set entry).
    pub async fn hit<C>(
        &self,
        conn: &mut C,
        key: &str,
        now_ms: i64,
        member: &str,
    ) -> RedisResult<WindowOutcome>
    where
        C: ConnectionLike + Send,
    {
        let (allowed, count, reset_at_ms): (i64, i64, i64) = SLIDING_WINDOW_SCRIPT
            .key(key)
            .arg(now_ms)
            .arg(self.window_ms())
            .arg(self.max_events)
            .arg(member)
            .invoke_async(conn)
            .await?;

        Ok(WindowOutcome {
            allowed: allowed == 1,
            count: count.max(0) as u32,
            reset_at_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_ms() {
        let window = SlidingWindow::new(3, Duration::from_secs(60));
        assert_eq!(window.max_events(), 3);
        assert_eq!(window.window_ms(), 60_000);
    }

    #[test]
    fn test_remaining_saturates() {
        let outcome = WindowOutcome {
            allowed: false,
            count: 3,
            reset_at_ms: 0,
        };
        assert_eq!(outcome.remaining(3), 0);
        assert_eq!(outcome.remaining(2), 0);

        let outcome = WindowOutcome {
            allowed: true,
            count: 1,
            reset_at_ms: 0,
        };
        assert_eq!(outcome.remaining(3), 2);
    }
}
