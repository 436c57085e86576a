/// HTTP client for a Clerk-compatible backend API
///
/// `GET {api_url}/users?user_id=..&user_id=..&limit=N` (or `username=..`)
/// authenticated with the backend secret key as bearer token. The response
/// is a JSON array of user records.
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, error};

use super::{IdentityProvider, RawUser, UserQuery, MAX_USER_LOOKUP};
use crate::config::IdentityConfig;
use crate::error::{AppError, Result};

#[derive(Clone)]
pub struct ClerkClient {
    http: Client,
    api_url: String,
    secret_key: String,
}

impl ClerkClient {
    pub fn new(config: &IdentityConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;

        Ok(Self {
            http,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            secret_key: config.secret_key.clone(),
        })
    }

    fn users_url(&self) -> String {
        format!("{}/users", self.api_url)
    }
}

/// Query string pairs for a user list request; repeated keys select several users.
pub fn user_list_params(query: &UserQuery, limit: usize) -> Vec<(&'static str, String)> {
    let (key, values) = match query {
        UserQuery::UserIds(ids) => ("user_id", ids),
        UserQuery::Usernames(names) => ("username", names),
    };

    let mut params: Vec<(&'static str, String)> =
        values.iter().map(|value| (key, value.clone())).collect();
    params.push(("limit", limit.min(MAX_USER_LOOKUP).to_string()));
    params
}

#[async_trait]
impl IdentityProvider for ClerkClient {
    async fn get_user_list(&self, query: &UserQuery, limit: usize) -> Result<Vec<RawUser>> {
        let url = self.users_url();
        let params = user_list_params(query, limit);

        debug!(url = %url, params = params.len(), "Fetching user list from identity provider");

        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.secret_key)
            .query(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read response body".to_string());
            error!(status = %status, body = %body, "Identity provider returned an error");
            return Err(AppError::IdentityProvider(format!(
                "user list request failed with status {}",
                status
            )));
        }

        let users = response.json::<Vec<RawUser>>().await?;
        Ok(users)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_list_params_repeats_ids() {
        let params = user_list_params(
            &UserQuery::UserIds(vec!["user_1".to_string(), "user_2".to_string()]),
            100,
        );
        assert_eq!(
            params,
            vec![
                ("user_id", "user_1".to_string()),
                ("user_id", "user_2".to_string()),
                ("limit", "100".to_string()),
            ]
        );
    }

    #[test]
    fn test_user_list_params_caps_limit() {
        let params = user_list_params(&UserQuery::Usernames(vec!["alice".to_string()]), 500);
        assert_eq!(params[0], ("username", "alice".to_string()));
        assert_eq!(params[1], ("limit", "100".to_string()));
    }

    #[test]
    fn test_users_url_trims_trailing_slash() {
        let client = ClerkClient::new(&IdentityConfig {
            api_url: "https://api.clerk.com/v1/".to_string(),
            secret_key: "sk_test".to_string(),
            request_timeout_ms: 1_000,
        })
        .unwrap();
        assert_eq!(client.users_url(), "https://api.clerk.com/v1/users");
    }
}
