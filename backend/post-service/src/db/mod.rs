/// Database access layer
///
/// - `post_repo`: SQL for the `posts` table
/// - [`PostStore`]: the port the procedures depend on, with the PostgreSQL
///   implementation [`PgPostStore`]
pub mod post_repo;

pub use post_repo::{PgPostStore, PostStore};

/// Upper bound on any list read; keeps enrichment within one identity lookup.
pub const MAX_LIST_POSTS: i64 = 100;
