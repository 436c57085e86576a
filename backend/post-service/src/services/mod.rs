/// Business logic layer for post-service
///
/// - `enrichment`: joins posts with their authors (one batched lookup)
/// - `posts`: post procedures (`getAll`, `getPostsByUserId`,
///   `getSinglePostById`, `create`)
/// - `profile`: profile procedures (`getUserByUsername`)
pub mod enrichment;
pub mod posts;
pub mod profile;

pub use enrichment::enrich_posts;
pub use posts::PostService;
pub use profile::ProfileService;
