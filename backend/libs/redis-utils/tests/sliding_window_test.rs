//! Sliding window against a live Redis.
//!
//! Run with: cargo test -p redis-utils --test sliding_window_test -- --ignored

use redis::aio::ConnectionManager;
use redis_utils::{RedisPool, SlidingWindow};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

fn redis_url() -> String {
    std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string())
}

fn epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_millis() as i64
}

async fn connect() -> ConnectionManager {
    RedisPool::connect(&redis_url())
        .await
        .expect("Failed to connect to Redis")
        .manager()
}

fn test_key() -> String {
    format!("sliding-window-test:{}", uuid::Uuid::new_v4())
}

async fn zcard(conn: &mut ConnectionManager, key: &str) -> i64 {
    redis::cmd("ZCARD")
        .arg(key)
        .query_async(conn)
        .await
        .expect("ZCARD failed")
}

async fn cleanup(conn: &mut ConnectionManager, key: &str) {
    let _: () = redis::cmd("DEL")
        .arg(key)
        .query_async(conn)
        .await
        .expect("DEL failed");
}

#[tokio::test]
#[ignore] // Requires Redis server
async fn test_fourth_hit_rejected_and_not_recorded() {
    let mut conn = connect().await;
    let key = test_key();
    let window = SlidingWindow::new(3, Duration::from_secs(60));
    let t0 = epoch_ms();

    for (i, expected) in [1u32, 2, 3].into_iter().enumerate() {
        let outcome = window
            .hit(&mut conn, &key, t0 + i as i64, &format!("hit-{}", i))
            .await
            .expect("hit failed");
        assert!(outcome.allowed);
        assert_eq!(outcome.count, expected);
        assert_eq!(outcome.reset_at_ms, t0 + 60_000);
    }

    let rejected = window
        .hit(&mut conn, &key, t0 + 3, "hit-3")
        .await
        .expect("hit failed");
    assert!(!rejected.allowed);
    assert_eq!(rejected.count, 3);
    assert_eq!(rejected.remaining(3), 0);
    assert_eq!(rejected.reset_at_ms, t0 + 60_000);
    assert_eq!(zcard(&mut conn, &key).await, 3);

    cleanup(&mut conn, &key).await;
}

#[tokio::test]
#[ignore] // Requires Redis server
async fn test_oldest_event_leaves_window() {
    let mut conn = connect().await;
    let key = test_key();
    let window = SlidingWindow::new(3, Duration::from_millis(1_000));
    let t0 = epoch_ms();

    for offset in [0, 10, 20] {
        let outcome = window
            .hit(&mut conn, &key, t0 + offset, &format!("at-{}", offset))
            .await
            .expect("hit failed");
        assert!(outcome.allowed);
    }
    let blocked = window
        .hit(&mut conn, &key, t0 + 500, "at-500")
        .await
        .expect("hit failed");
    assert!(!blocked.allowed);

    // the event scored t0 is trimmed once now - window reaches it
    let outcome = window
        .hit(&mut conn, &key, t0 + 1_000, "at-1000")
        .await
        .expect("hit failed");
    assert!(outcome.allowed);
    assert_eq!(outcome.count, 3);
    assert_eq!(outcome.reset_at_ms, t0 + 10 + 1_000);

    cleanup(&mut conn, &key).await;
}

#[tokio::test]
#[ignore] // Requires Redis server
async fn test_key_expires_with_window() {
    let mut conn = connect().await;
    let key = test_key();
    let window = SlidingWindow::new(3, Duration::from_secs(60));

    window
        .hit(&mut conn, &key, epoch_ms(), "only")
        .await
        .expect("hit failed");

    let ttl_ms: i64 = redis::cmd("PTTL")
        .arg(&key)
        .query_async(&mut conn)
        .await
        .expect("PTTL failed");
    assert!(ttl_ms > 0 && ttl_ms <= 60_000, "unexpected ttl {}", ttl_ms);

    cleanup(&mut conn, &key).await;
}
