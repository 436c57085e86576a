use lazy_static::lazy_static;
use prometheus::{register_int_counter, register_int_counter_vec, IntCounter, IntCounterVec};

lazy_static! {
    /// Posts successfully written.
    pub static ref POSTS_CREATED_TOTAL: IntCounter = register_int_counter!(
        "posts_created_total",
        "Total posts created"
    )
    .expect("failed to register posts_created_total");

    /// Create attempts rejected by the sliding window.
    pub static ref POST_RATE_LIMITED_TOTAL: IntCounter = register_int_counter!(
        "post_rate_limited_total",
        "Post creations rejected by the rate limiter"
    )
    .expect("failed to register post_rate_limited_total");

    /// Enrichment failures by reason (author_missing, provider_error).
    pub static ref POST_ENRICHMENT_FAILURES_TOTAL: IntCounterVec = register_int_counter_vec!(
        "post_enrichment_failures_total",
        "Post enrichment failures segmented by reason",
        &["reason"]
    )
    .expect("failed to register post_enrichment_failures_total");
}

pub fn record_post_created() {
    POSTS_CREATED_TOTAL.inc();
}

pub fn record_rate_limited() {
    POST_RATE_LIMITED_TOTAL.inc();
}

pub fn record_enrichment_failure(reason: &str) {
    POST_ENRICHMENT_FAILURES_TOTAL
        .with_label_values(&[reason])
        .inc();
}
