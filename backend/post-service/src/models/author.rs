use serde::{Deserialize, Serialize};

/// The only view of an identity-provider user that leaves the adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorProjection {
    pub id: String,
    /// Accounts may be created without a username.
    pub username: Option<String>,
    pub profile_image_url: String,
}
