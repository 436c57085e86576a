use serde::Serialize;

/// Outcome of one rate-limit check for an author.
///
/// Only `success` gates the write; the rest is surfaced as headers on a 429.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RateLimitDecision {
    pub success: bool,
    pub limit: u32,
    pub remaining: u32,
    /// Epoch millis at which the oldest counted write leaves the window
    pub reset: i64,
}
