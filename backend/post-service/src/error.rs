/// Error types for Post Service
///
/// Every procedure failure maps onto one of the shared wire codes and is
/// rendered with the `error-types` envelope. Infrastructure details are
/// logged, never returned.
use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use error_types::{ErrorCode, ErrorResponse, FieldErrors};
use thiserror::Error;

use crate::models::RateLimitDecision;

/// Result type for post-service operations
pub type Result<T> = std::result::Result<T, AppError>;

pub const AUTHOR_NOT_FOUND_MESSAGE: &str = "Author for post not found";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid input")]
    Validation(FieldErrors),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Authentication required")]
    Unauthorized,

    #[error("{0}")]
    NotFound(String),

    #[error("Too many requests")]
    RateLimited(RateLimitDecision),

    /// A post references an author the identity provider does not know.
    #[error("Author for post not found")]
    AuthorNotFound,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Rate limit store error: {0}")]
    RateLimitStore(String),

    #[error("Identity provider error: {0}")]
    IdentityProvider(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Validation(_) | AppError::BadRequest(_) => ErrorCode::BadRequest,
            AppError::Unauthorized => ErrorCode::Unauthorized,
            AppError::NotFound(_) => ErrorCode::NotFound,
            AppError::RateLimited(_) => ErrorCode::TooManyRequests,
            AppError::AuthorNotFound
            | AppError::Database(_)
            | AppError::RateLimitStore(_)
            | AppError::IdentityProvider(_)
            | AppError::Internal(_) => ErrorCode::InternalServerError,
        }
    }

    /// Envelope sent to clients.
    pub fn to_response(&self) -> ErrorResponse {
        match self {
            AppError::Validation(fields) => {
                ErrorResponse::new(self.code(), "Invalid input").with_field_errors(fields.clone())
            }
            AppError::BadRequest(msg) | AppError::NotFound(msg) => {
                ErrorResponse::new(self.code(), msg.clone())
            }
            AppError::Unauthorized => ErrorResponse::new(self.code(), "Authentication required"),
            AppError::RateLimited(_) => ErrorResponse::new(self.code(), "Too many requests"),
            AppError::AuthorNotFound => ErrorResponse::new(self.code(), AUTHOR_NOT_FOUND_MESSAGE),
            AppError::Database(_)
            | AppError::RateLimitStore(_)
            | AppError::IdentityProvider(_)
            | AppError::Internal(_) => ErrorResponse::new(self.code(), "Internal server error"),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.code().http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    fn error_response(&self) -> HttpResponse {
        let mut builder = HttpResponse::build(self.status_code());

        if let AppError::RateLimited(decision) = self {
            builder
                .insert_header(("X-RateLimit-Limit", decision.limit.to_string()))
                .insert_header(("X-RateLimit-Remaining", decision.remaining.to_string()))
                .insert_header(("X-RateLimit-Reset", decision.reset.to_string()));
        }

        builder.json(self.to_response())
    }
}

// Conversions from external error types
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!("Database error: {}", err);
        AppError::Database(err.to_string())
    }
}

impl From<redis::RedisError> for AppError {
    fn from(err: redis::RedisError) -> Self {
        tracing::error!("Rate limit store error: {}", err);
        AppError::RateLimitStore(err.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        tracing::error!("Identity provider request failed: {}", err);
        AppError::IdentityProvider(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(crate::validation::to_field_errors(&err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::Validation(FieldErrors::new()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AppError::NotFound("Post not found".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::AuthorNotFound.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::RateLimitStore("down".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_infrastructure_details_not_exposed() {
        let response = AppError::Database("relation \"posts\" does not exist".into()).to_response();
        assert_eq!(response.error.message, "Internal server error");
        assert_eq!(response.status, 500);
    }

    #[test]
    fn test_author_not_found_message_kept() {
        let response = AppError::AuthorNotFound.to_response();
        assert_eq!(response.code(), ErrorCode::InternalServerError);
        assert_eq!(response.error.message, AUTHOR_NOT_FOUND_MESSAGE);
    }

    #[actix_web::test]
    async fn test_rate_limited_response_has_headers() {
        let err = AppError::RateLimited(RateLimitDecision {
            success: false,
            limit: 3,
            remaining: 0,
            reset: 1_700_000_060_000,
        });
        let response = err.error_response();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers().get("X-RateLimit-Limit").unwrap(), "3");
        assert_eq!(response.headers().get("X-RateLimit-Remaining").unwrap(), "0");
        assert_eq!(
            response.headers().get("X-RateLimit-Reset").unwrap(),
            "1700000060000"
        );

        let body = to_bytes(response.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"]["code"], "TOO_MANY_REQUESTS");
        assert_eq!(json["status"], 429);
    }
}
