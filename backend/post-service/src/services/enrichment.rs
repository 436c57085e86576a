use std::collections::{HashMap, HashSet};
use tracing::error;

use crate::error::{AppError, Result};
use crate::identity::{IdentityAdapter, MAX_USER_LOOKUP};
use crate::metrics::posts::record_enrichment_failure;
use crate::models::{AuthorProjection, EnrichedPost, Post};

/// Attach the author projection to every post, preserving order.
///
/// All authors are resolved with one provider lookup. A single missing
/// author fails the whole batch.
pub async fn enrich_posts(identity: &IdentityAdapter, posts: Vec<Post>) -> Result<Vec<EnrichedPost>> {
    if posts.is_empty() {
        return Ok(Vec::new());
    }
    if posts.len() > MAX_USER_LOOKUP {
        return Err(AppError::Internal(format!(
            "cannot enrich {} posts in one batch (max {})",
            posts.len(),
            MAX_USER_LOOKUP
        )));
    }

    let author_ids: Vec<String> = {
        let mut seen = HashSet::new();
        posts
            .iter()
            .filter(|post| seen.insert(post.author_id.as_str()))
            .map(|post| post.author_id.clone())
            .collect()
    };

    let authors = identity
        .get_users_by_ids(&author_ids)
        .await
        .map_err(|err| {
            record_enrichment_failure("provider_error");
            err
        })?;

    let by_id: HashMap<String, AuthorProjection> = authors
        .into_iter()
        .map(|author| (author.id.clone(), author))
        .collect();

    posts
        .into_iter()
        .map(|post| match by_id.get(&post.author_id) {
            Some(author) => Ok(EnrichedPost {
                author: author.clone(),
                post,
            }),
            None => {
                error!(
                    post_id = %post.id,
                    author_id = %post.author_id,
                    "Author for post not found"
                );
                record_enrichment_failure("author_missing");
                Err(AppError::AuthorNotFound)
            }
        })
        .collect()
}
