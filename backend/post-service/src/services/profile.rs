/// Profile procedures
use crate::error::Result;
use crate::identity::IdentityAdapter;
use crate::models::AuthorProjection;
use crate::validation::require_non_empty;

#[derive(Clone)]
pub struct ProfileService {
    identity: IdentityAdapter,
}

impl ProfileService {
    pub fn new(identity: IdentityAdapter) -> Self {
        Self { identity }
    }

    /// `profile.getUserByUsername`
    pub async fn get_user_by_username(&self, username: &str) -> Result<AuthorProjection> {
        require_non_empty("username", username)?;
        self.identity.get_user_by_username(username).await
    }
}
