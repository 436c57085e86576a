//! # Actix Middleware Library
//!
//! Middleware shared by Chirp Actix services
//!
//! ## Modules
//! - `jwt_auth`: session-token identity middleware (anonymous requests pass through)
//! - `correlation_id`: X-Correlation-ID propagation
//! - `metrics`: Prometheus HTTP metrics middleware

pub mod correlation_id;
pub mod jwt_auth;
pub mod metrics;

pub use correlation_id::{get_correlation_id, CorrelationId, CorrelationIdMiddleware};
pub use jwt_auth::{Claims, JwtAuthMiddleware, JwtError, JwtValidator, UserId};
pub use metrics::MetricsMiddleware;
