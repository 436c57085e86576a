/// Post procedures: global feed, per-author feed, single post, create
use std::sync::Arc;
use tracing::{debug, info, warn};
use validator::Validate;

use super::enrichment::enrich_posts;
use crate::db::{PostStore, MAX_LIST_POSTS};
use crate::error::{AppError, Result};
use crate::identity::IdentityAdapter;
use crate::metrics::posts::{record_post_created, record_rate_limited};
use crate::models::{EnrichedPost, NewPost, Post};
use crate::rate_limit::RateLimiter;
use crate::validation::{require_non_empty, CreatePostInput};

#[derive(Clone)]
pub struct PostService {
    store: Arc<dyn PostStore>,
    identity: IdentityAdapter,
    rate_limiter: Arc<dyn RateLimiter>,
}

impl PostService {
    pub fn new(
        store: Arc<dyn PostStore>,
        identity: IdentityAdapter,
        rate_limiter: Arc<dyn RateLimiter>,
    ) -> Self {
        Self {
            store,
            identity,
            rate_limiter,
        }
    }

    /// `posts.getAll`: the 100 most recent posts with authors
    pub async fn get_all(&self) -> Result<Vec<EnrichedPost>> {
        let posts = self.store.recent_posts(MAX_LIST_POSTS).await?;
        debug!(count = posts.len(), "Loaded recent posts");
        enrich_posts(&self.identity, posts).await
    }

    /// `posts.getPostsByUserId`: an author's posts, empty when they have none
    pub async fn get_posts_by_user_id(&self, user_id: &str) -> Result<Vec<EnrichedPost>> {
        require_non_empty("userId", user_id)?;

        let posts = self.store.posts_by_author(user_id, MAX_LIST_POSTS).await?;
        debug!(author_id = %user_id, count = posts.len(), "Loaded author posts");
        enrich_posts(&self.identity, posts).await
    }

    /// `posts.getSinglePostById`
    pub async fn get_single_post_by_id(&self, post_id: &str) -> Result<EnrichedPost> {
        require_non_empty("postId", post_id)?;

        let post = self
            .store
            .find_post_by_id(post_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

        enrich_posts(&self.identity, vec![post])
            .await?
            .pop()
            .ok_or_else(|| AppError::Internal("enrichment returned no post".to_string()))
    }

    /// `posts.create`
    ///
    /// The author is always the authenticated caller. Invalid input is
    /// reported before authorization; nothing touches the limiter or the
    /// store unless both pass.
    pub async fn create(&self, caller_id: Option<&str>, input: CreatePostInput) -> Result<Post> {
        input.validate()?;

        let author_id = caller_id
            .filter(|id| !id.is_empty())
            .ok_or(AppError::Unauthorized)?;

        let decision = self.rate_limiter.limit(author_id).await?;
        if !decision.success {
            warn!(
                author_id = %author_id,
                limit = decision.limit,
                reset = decision.reset,
                "Post creation rate limited"
            );
            record_rate_limited();
            return Err(AppError::RateLimited(decision));
        }

        let post = self
            .store
            .create_post(NewPost {
                author_id: author_id.to_string(),
                content: input.content,
            })
            .await?;

        record_post_created();
        info!(post_id = %post.id, author_id = %post.author_id, "Post created");

        Ok(post)
    }
}
