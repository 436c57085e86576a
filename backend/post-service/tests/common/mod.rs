#![allow(dead_code)]

use actix_middleware::{Claims, CorrelationIdMiddleware, JwtAuthMiddleware, JwtValidator};
use actix_web::body::MessageBody;
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{web, App};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use post_service::handlers;
use post_service::identity::{IdentityAdapter, RawUser};
use post_service::rate_limit::RateLimitConfig;
use post_service::services::{PostService, ProfileService};
use post_service::test_utils::{
    raw_user, InMemoryIdentityProvider, InMemoryPostStore, InMemoryRateLimiter,
};
use std::sync::Arc;

pub const JWT_SECRET: &[u8] = b"post-service-test-secret";

/// Service graph wired to in-memory adapters, with handles to inspect them.
pub struct TestContext {
    pub store: Arc<InMemoryPostStore>,
    pub identity: Arc<InMemoryIdentityProvider>,
    pub limiter: Arc<InMemoryRateLimiter>,
    pub posts: PostService,
    pub profiles: ProfileService,
}

impl TestContext {
    pub fn new(users: Vec<RawUser>) -> Self {
        let store = Arc::new(InMemoryPostStore::new());
        let identity = Arc::new(InMemoryIdentityProvider::with_users(users));
        let limiter = Arc::new(InMemoryRateLimiter::new(RateLimitConfig::default()));

        let adapter = IdentityAdapter::new(identity.clone());
        let posts = PostService::new(store.clone(), adapter.clone(), limiter.clone());
        let profiles = ProfileService::new(adapter);

        Self {
            store,
            identity,
            limiter,
            posts,
            profiles,
        }
    }

    /// alice, bob and a username-less account
    pub fn with_default_users() -> Self {
        Self::new(vec![
            raw_user("user_alice", Some("alice")),
            raw_user("user_bob", Some("bob")),
            raw_user("user_anon", None),
        ])
    }

    pub async fn seed_post(&self, id: &str, author_id: &str, created_at: DateTime<Utc>) {
        self.store.insert(id, author_id, "🔥", created_at).await;
    }

    /// `count` posts by `author_id`, one second apart, newest has id `{prefix}-0`.
    pub async fn seed_posts(&self, prefix: &str, author_id: &str, count: usize) {
        let now = Utc::now();
        for i in 0..count {
            let id = format!("{}-{}", prefix, i);
            self.seed_post(&id, author_id, now - Duration::seconds(i as i64))
                .await;
        }
    }

    /// Full route table with the identity middleware, as `main` builds it.
    pub fn app(
        &self,
    ) -> App<
        impl ServiceFactory<
            ServiceRequest,
            Config = (),
            Response = ServiceResponse<impl MessageBody>,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        App::new()
            .app_data(web::Data::new(self.posts.clone()))
            .app_data(web::Data::new(self.profiles.clone()))
            .wrap(JwtAuthMiddleware::new(Arc::new(JwtValidator::hs256(
                JWT_SECRET,
            ))))
            .wrap(CorrelationIdMiddleware)
            .configure(handlers::configure_routes)
            .default_service(web::route().to(handlers::route_not_found))
    }
}

pub fn session_token(user_id: &str) -> String {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: user_id.to_string(),
        exp: now + 3600,
        iat: Some(now),
        sid: Some("sess_test".to_string()),
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET),
    )
    .unwrap()
}

pub fn bearer(user_id: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", session_token(user_id)))
}
