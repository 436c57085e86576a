//! Post Service Library
//!
//! Emoji-only post feed: global and per-author feeds joined with author
//! profiles from the identity provider, single-post reads, profile lookup and
//! rate-limited post creation.
//!
//! # Modules
//!
//! - `config`: Environment-driven configuration
//! - `db`: Post store port and PostgreSQL implementation
//! - `error`: Error types and HTTP error envelope
//! - `handlers`: HTTP handlers, one route per procedure
//! - `identity`: Identity provider port and Clerk-compatible client
//! - `metrics`: Prometheus collectors and `/metrics` handler
//! - `models`: Posts, author projections, rate-limit decisions
//! - `rate_limit`: Sliding-window write limiter
//! - `services`: Procedures and post enrichment
//! - `test_utils`: In-memory adapters (tests and the `test-utils` feature)
//! - `validation`: Input validation rules

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod identity;
pub mod metrics;
pub mod models;
pub mod rate_limit;
pub mod services;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod validation;

pub use config::Config;
pub use error::{AppError, Result};
