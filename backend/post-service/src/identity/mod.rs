//! Identity provider port.
//!
//! The provider hands back full user records ([`RawUser`]); nothing outside
//! this module sees them. [`IdentityAdapter`] strips every record down to an
//! [`AuthorProjection`] before returning.

pub mod clerk;

pub use clerk::ClerkClient;

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

use crate::error::{AppError, Result};
use crate::models::AuthorProjection;

/// Largest batch the provider accepts in one lookup.
pub const MAX_USER_LOOKUP: usize = 100;

/// Selector for a user list lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserQuery {
    UserIds(Vec<String>),
    Usernames(Vec<String>),
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct EmailAddress {
    #[serde(default)]
    pub id: String,
    pub email_address: String,
}

/// Full user record as returned by the provider's backend API.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawUser {
    pub id: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    /// Older API versions only send this one.
    #[serde(default)]
    pub profile_image_url: Option<String>,
    #[serde(default)]
    pub email_addresses: Vec<EmailAddress>,
    #[serde(default)]
    pub public_metadata: serde_json::Value,
    #[serde(default)]
    pub private_metadata: serde_json::Value,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// One batched lookup; returns at most `limit` users matching `query`.
    async fn get_user_list(&self, query: &UserQuery, limit: usize) -> Result<Vec<RawUser>>;
}

/// Client-safe projection of a provider user.
pub fn filter_user_for_client(user: &RawUser) -> AuthorProjection {
    AuthorProjection {
        id: user.id.clone(),
        username: user.username.clone(),
        profile_image_url: user
            .image_url
            .clone()
            .or_else(|| user.profile_image_url.clone())
            .unwrap_or_default(),
    }
}

/// Application-facing side of the identity port.
#[derive(Clone)]
pub struct IdentityAdapter {
    provider: Arc<dyn IdentityProvider>,
}

impl IdentityAdapter {
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        Self { provider }
    }

    /// Resolve up to [`MAX_USER_LOOKUP`] ids with a single provider call.
    pub async fn get_users_by_ids(&self, user_ids: &[String]) -> Result<Vec<AuthorProjection>> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }
        if user_ids.len() > MAX_USER_LOOKUP {
            return Err(AppError::Internal(format!(
                "user lookup of {} ids exceeds limit of {}",
                user_ids.len(),
                MAX_USER_LOOKUP
            )));
        }

        debug!(count = user_ids.len(), "Looking up authors");

        let users = self
            .provider
            .get_user_list(&UserQuery::UserIds(user_ids.to_vec()), MAX_USER_LOOKUP)
            .await?;

        Ok(users.iter().map(filter_user_for_client).collect())
    }

    pub async fn get_user_by_username(&self, username: &str) -> Result<AuthorProjection> {
        let users = self
            .provider
            .get_user_list(&UserQuery::Usernames(vec![username.to_string()]), 1)
            .await?;

        users
            .iter()
            .find(|user| {
                user.username
                    .as_deref()
                    .is_some_and(|name| name.eq_ignore_ascii_case(username))
            })
            .map(filter_user_for_client)
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::eq;

    fn raw_user(id: &str, username: Option<&str>) -> RawUser {
        RawUser {
            id: id.to_string(),
            username: username.map(str::to_string),
            image_url: Some(format!("https://img.chirp.dev/{}.png", id)),
            email_addresses: vec![EmailAddress {
                id: "idn_1".to_string(),
                email_address: format!("{}@example.com", id),
            }],
            private_metadata: serde_json::json!({"plan": "pro"}),
            ..Default::default()
        }
    }

    #[test]
    fn test_filter_user_for_client_drops_private_fields() {
        let projection = filter_user_for_client(&raw_user("user_1", Some("alice")));
        assert_eq!(projection.id, "user_1");
        assert_eq!(projection.username.as_deref(), Some("alice"));
        assert_eq!(projection.profile_image_url, "https://img.chirp.dev/user_1.png");

        let json = serde_json::to_value(&projection).unwrap();
        let keys: Vec<&str> = json.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys.len(), 3);
        assert!(!json.to_string().contains("example.com"));
    }

    #[test]
    fn test_filter_user_for_client_falls_back_to_legacy_image() {
        let mut user = raw_user("user_2", None);
        user.image_url = None;
        user.profile_image_url = Some("https://legacy/2.png".to_string());

        let projection = filter_user_for_client(&user);
        assert_eq!(projection.profile_image_url, "https://legacy/2.png");
        assert!(projection.username.is_none());
    }

    #[test]
    fn test_raw_user_deserializes_provider_payload() {
        let user: RawUser = serde_json::from_str(
            r#"{
                "id": "user_abc",
                "username": null,
                "image_url": "https://img/abc.png",
                "email_addresses": [{"id": "idn_1", "email_address": "a@b.c"}],
                "public_metadata": {},
                "created_at": 1700000000000,
                "unknown_field": true
            }"#,
        )
        .unwrap();
        assert_eq!(user.id, "user_abc");
        assert!(user.username.is_none());
        assert_eq!(user.email_addresses.len(), 1);
    }

    #[tokio::test]
    async fn test_get_users_by_ids_single_call() {
        let mut provider = MockIdentityProvider::new();
        provider
            .expect_get_user_list()
            .with(
                eq(UserQuery::UserIds(vec!["a".to_string(), "b".to_string()])),
                eq(MAX_USER_LOOKUP),
            )
            .times(1)
            .returning(|_, _| Ok(vec![raw_user("a", Some("alice")), raw_user("b", None)]));

        let adapter = IdentityAdapter::new(Arc::new(provider));
        let users = adapter
            .get_users_by_ids(&["a".to_string(), "b".to_string()])
            .await
            .unwrap();
        assert_eq!(users.len(), 2);
    }

    #[tokio::test]
    async fn test_get_users_by_ids_rejects_oversized_batch() {
        let mut provider = MockIdentityProvider::new();
        provider.expect_get_user_list().times(0);

        let adapter = IdentityAdapter::new(Arc::new(provider));
        let ids: Vec<String> = (0..101).map(|i| format!("user_{}", i)).collect();
        let err = adapter.get_users_by_ids(&ids).await.unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
    }

    #[tokio::test]
    async fn test_get_user_by_username_not_found() {
        let mut provider = MockIdentityProvider::new();
        provider
            .expect_get_user_list()
            .times(1)
            .returning(|_, _| Ok(Vec::new()));

        let adapter = IdentityAdapter::new(Arc::new(provider));
        let err = adapter.get_user_by_username("ghost").await.unwrap_err();
        match err {
            AppError::NotFound(msg) => assert_eq!(msg, "User not found"),
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_get_user_by_username_found() {
        let mut provider = MockIdentityProvider::new();
        provider
            .expect_get_user_list()
            .with(eq(UserQuery::Usernames(vec!["alice".to_string()])), eq(1))
            .times(1)
            .returning(|_, _| Ok(vec![raw_user("user_1", Some("alice"))]));

        let adapter = IdentityAdapter::new(Arc::new(provider));
        let user = adapter.get_user_by_username("alice").await.unwrap();
        assert_eq!(user.id, "user_1");
    }
}
