//! Shared error envelope for Chirp HTTP procedures
//!
//! Every procedure failure is rendered as:
//!
//! ```json
//! {
//!   "error": {
//!     "code": "BAD_REQUEST",
//!     "message": "Invalid input",
//!     "fieldErrors": { "content": ["You can only post emojis."] }
//!   },
//!   "status": 400
//! }
//! ```
//!
//! The code set is deliberately small and fixed so clients can switch on it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Field path -> human readable messages for that field.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Procedure error codes exposed on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    BadRequest,
    Unauthorized,
    NotFound,
    TooManyRequests,
    InternalServerError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::BadRequest => "BAD_REQUEST",
            ErrorCode::Unauthorized => "UNAUTHORIZED",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::TooManyRequests => "TOO_MANY_REQUESTS",
            ErrorCode::InternalServerError => "INTERNAL_SERVER_ERROR",
        }
    }

    /// HTTP status used when the code crosses the HTTP boundary
    pub fn http_status(&self) -> u16 {
        match self {
            ErrorCode::BadRequest => 400,
            ErrorCode::Unauthorized => 401,
            ErrorCode::NotFound => 404,
            ErrorCode::TooManyRequests => 429,
            ErrorCode::InternalServerError => 500,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub code: ErrorCode,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_errors: Option<FieldErrors>,
}

/// Top-level error response returned to clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
    pub status: u16,
}

impl ErrorResponse {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            error: ErrorBody {
                code,
                message: message.into(),
                field_errors: None,
            },
            status: code.http_status(),
        }
    }

    /// Attach field-level validation messages; empty maps are dropped.
    pub fn with_field_errors(mut self, field_errors: FieldErrors) -> Self {
        if !field_errors.is_empty() {
            self.error.field_errors = Some(field_errors);
        }
        self
    }

    pub fn code(&self) -> ErrorCode {
        self.error.code
    }

    /// Message for a UI toast: first field message when present, else the
    /// top-level message.
    pub fn display_message(&self) -> &str {
        self.error
            .field_errors
            .as_ref()
            .and_then(|fields| fields.values().flat_map(|msgs| msgs.iter()).next())
            .map(String::as_str)
            .unwrap_or(&self.error.message)
    }
}
