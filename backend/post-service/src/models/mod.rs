pub mod author;
pub mod post;
pub mod rate_limit;

pub use author::AuthorProjection;
pub use post::{EnrichedPost, NewPost, Post};
pub use rate_limit::RateLimitDecision;
