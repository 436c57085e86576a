use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::Result;
use crate::models::{NewPost, Post};

/// Persistence port for posts.
///
/// List reads return at most `limit` posts ordered newest first, ties broken
/// by id descending.
#[async_trait]
pub trait PostStore: Send + Sync {
    async fn recent_posts(&self, limit: i64) -> Result<Vec<Post>>;

    async fn posts_by_author(&self, author_id: &str, limit: i64) -> Result<Vec<Post>>;

    async fn find_post_by_id(&self, post_id: &str) -> Result<Option<Post>>;

    async fn create_post(&self, new_post: NewPost) -> Result<Post>;
}

/// Insert a post; id and created_at come from column defaults
pub async fn create_post(pool: &PgPool, author_id: &str, content: &str) -> Result<Post> {
    let post = sqlx::query_as::<_, Post>(
        r#"
        INSERT INTO posts (author_id, content)
        VALUES ($1, $2)
        RETURNING id, author_id, content, created_at
        "#,
    )
    .bind(author_id)
    .bind(content)
    .fetch_one(pool)
    .await?;

    Ok(post)
}

pub async fn find_post_by_id(pool: &PgPool, post_id: &str) -> Result<Option<Post>> {
    let post = sqlx::query_as::<_, Post>(
        r#"
        SELECT id, author_id, content, created_at
        FROM posts
        WHERE id = $1
        "#,
    )
    .bind(post_id)
    .fetch_optional(pool)
    .await?;

    Ok(post)
}

/// Global feed, newest first
pub async fn find_recent_posts(pool: &PgPool, limit: i64) -> Result<Vec<Post>> {
    let posts = sqlx::query_as::<_, Post>(
        r#"
        SELECT id, author_id, content, created_at
        FROM posts
        ORDER BY created_at DESC, id DESC
        LIMIT $1
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(posts)
}

pub async fn find_posts_by_author(pool: &PgPool, author_id: &str, limit: i64) -> Result<Vec<Post>> {
    let posts = sqlx::query_as::<_, Post>(
        r#"
        SELECT id, author_id, content, created_at
        FROM posts
        WHERE author_id = $1
        ORDER BY created_at DESC, id DESC
        LIMIT $2
        "#,
    )
    .bind(author_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(posts)
}

/// PostgreSQL-backed [`PostStore`]
#[derive(Clone)]
pub struct PgPostStore {
    pool: PgPool,
}

impl PgPostStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PostStore for PgPostStore {
    async fn recent_posts(&self, limit: i64) -> Result<Vec<Post>> {
        find_recent_posts(&self.pool, limit).await
    }

    async fn posts_by_author(&self, author_id: &str, limit: i64) -> Result<Vec<Post>> {
        find_posts_by_author(&self.pool, author_id, limit).await
    }

    async fn find_post_by_id(&self, post_id: &str) -> Result<Option<Post>> {
        find_post_by_id(&self.pool, post_id).await
    }

    async fn create_post(&self, new_post: NewPost) -> Result<Post> {
        create_post(&self.pool, &new_post.author_id, &new_post.content).await
    }
}
