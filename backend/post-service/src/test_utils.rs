//! In-memory adapters for the post store, identity provider and rate limiter.
//!
//! Same observable semantics as the production adapters; used by the test
//! suites and for running the service without PostgreSQL, Redis or an
//! identity provider.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::db::PostStore;
use crate::error::{AppError, Result};
use crate::identity::{IdentityProvider, RawUser, UserQuery};
use crate::models::{NewPost, Post, RateLimitDecision};
use crate::rate_limit::{RateLimitConfig, RateLimiter};

/// Provider user with a username and avatar.
pub fn raw_user(id: &str, username: Option<&str>) -> RawUser {
    RawUser {
        id: id.to_string(),
        username: username.map(str::to_string),
        image_url: Some(format!("https://img.chirp.dev/{}.png", id)),
        ..Default::default()
    }
}

#[derive(Default)]
pub struct InMemoryPostStore {
    posts: Mutex<Vec<Post>>,
    unavailable: AtomicBool,
}

impl InMemoryPostStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a post with an explicit id and timestamp.
    pub async fn insert(&self, id: &str, author_id: &str, content: &str, created_at: DateTime<Utc>) {
        self.posts.lock().await.push(Post {
            id: id.to_string(),
            author_id: author_id.to_string(),
            content: content.to_string(),
            created_at,
        });
    }

    pub async fn len(&self) -> usize {
        self.posts.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn all(&self) -> Vec<Post> {
        self.posts.lock().await.clone()
    }

    /// Make every call fail like a lost database connection.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AppError::Database("connection refused".to_string()));
        }
        Ok(())
    }

    fn newest_first(mut posts: Vec<Post>, limit: i64) -> Vec<Post> {
        posts.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        posts.truncate(limit.max(0) as usize);
        posts
    }
}

#[async_trait]
impl PostStore for InMemoryPostStore {
    async fn recent_posts(&self, limit: i64) -> Result<Vec<Post>> {
        self.check_available()?;
        let posts = self.posts.lock().await.clone();
        Ok(Self::newest_first(posts, limit))
    }

    async fn posts_by_author(&self, author_id: &str, limit: i64) -> Result<Vec<Post>> {
        self.check_available()?;
        let posts: Vec<Post> = self
            .posts
            .lock()
            .await
            .iter()
            .filter(|post| post.author_id == author_id)
            .cloned()
            .collect();
        Ok(Self::newest_first(posts, limit))
    }

    async fn find_post_by_id(&self, post_id: &str) -> Result<Option<Post>> {
        self.check_available()?;
        Ok(self
            .posts
            .lock()
            .await
            .iter()
            .find(|post| post.id == post_id)
            .cloned())
    }

    async fn create_post(&self, new_post: NewPost) -> Result<Post> {
        self.check_available()?;
        let post = Post {
            id: Uuid::new_v4().to_string(),
            author_id: new_post.author_id,
            content: new_post.content,
            created_at: Utc::now(),
        };
        self.posts.lock().await.push(post.clone());
        Ok(post)
    }
}

#[derive(Default)]
pub struct InMemoryIdentityProvider {
    users: Mutex<Vec<RawUser>>,
    calls: AtomicUsize,
    unavailable: AtomicBool,
}

impl InMemoryIdentityProvider {
    pub fn with_users(users: Vec<RawUser>) -> Self {
        Self {
            users: Mutex::new(users),
            ..Default::default()
        }
    }

    pub async fn add_user(&self, user: RawUser) {
        self.users.lock().await.push(user);
    }

    /// Number of `get_user_list` calls served so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }
}

#[async_trait]
impl IdentityProvider for InMemoryIdentityProvider {
    async fn get_user_list(&self, query: &UserQuery, limit: usize) -> Result<Vec<RawUser>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AppError::IdentityProvider("connection reset".to_string()));
        }

        let users = self.users.lock().await;
        let matched = users.iter().filter(|user| match query {
            UserQuery::UserIds(ids) => ids.iter().any(|id| *id == user.id),
            UserQuery::Usernames(names) => user
                .username
                .as_deref()
                .is_some_and(|username| names.iter().any(|name| name.eq_ignore_ascii_case(username))),
        });

        Ok(matched.take(limit).cloned().collect())
    }
}

/// Sliding window kept in process memory, with a controllable clock.
pub struct InMemoryRateLimiter {
    config: RateLimitConfig,
    windows: Mutex<HashMap<String, VecDeque<i64>>>,
    clock_offset_ms: AtomicI64,
    calls: AtomicUsize,
    unavailable: AtomicBool,
}

impl InMemoryRateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            windows: Mutex::new(HashMap::new()),
            clock_offset_ms: AtomicI64::new(0),
            calls: AtomicUsize::new(0),
            unavailable: AtomicBool::new(false),
        }
    }

    /// Move the limiter's clock forward.
    pub fn advance(&self, by: Duration) {
        self.clock_offset_ms
            .fetch_add(by.as_millis() as i64, Ordering::SeqCst);
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Simulate the backing store being unreachable.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn now_ms(&self) -> i64 {
        Utc::now().timestamp_millis() + self.clock_offset_ms.load(Ordering::SeqCst)
    }
}

impl Default for InMemoryRateLimiter {
    fn default() -> Self {
        Self::new(RateLimitConfig::default())
    }
}

#[async_trait]
impl RateLimiter for InMemoryRateLimiter {
    async fn limit(&self, identifier: &str) -> Result<RateLimitDecision> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AppError::RateLimitStore("connection refused".to_string()));
        }

        let now = self.now_ms();
        let window_ms = self.config.window.as_millis() as i64;
        let max = self.config.max_requests;

        let mut windows = self.windows.lock().await;
        let events = windows.entry(self.config.key_for(identifier)).or_default();

        while events.front().is_some_and(|&ts| ts <= now - window_ms) {
            events.pop_front();
        }

        let success = (events.len() as u32) < max;
        if success {
            events.push_back(now);
        }

        let count = events.len() as u32;
        let reset = events.front().map_or(now + window_ms, |&oldest| oldest + window_ms);

        Ok(RateLimitDecision {
            success,
            limit: max,
            remaining: max.saturating_sub(count),
            reset,
        })
    }
}
