//! Boundary validation for procedure inputs.

use error_types::FieldErrors;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::borrow::Cow;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::error::AppError;

pub const MAX_CONTENT_CHARS: u64 = 280;

pub const EMOJI_ONLY_MESSAGE: &str = "You can only post emojis.";

/// Whole string is a run of emoji code points: pictographs, skin-tone
/// modifiers, flag halves, keycaps, ZWJ joiners, variation selectors and tag
/// characters (subdivision flags).
static EMOJI_SEQUENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\A(?:\p{Extended_Pictographic}|[\x{1F3FB}-\x{1F3FF}]|[\x{1F1E6}-\x{1F1FF}]|[#*0-9]\x{FE0F}?\x{20E3}|\x{200D}|[\x{FE0E}\x{FE0F}]|[\x{E0020}-\x{E007F}])+\z",
    )
    .expect("Failed to compile emoji sequence regex")
});

/// At least one code point that renders as an emoji on its own.
static EMOJI_BASE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[\p{Extended_Pictographic}\x{1F1E6}-\x{1F1FF}\x{20E3}]")
        .expect("Failed to compile emoji base regex")
});

pub fn is_emoji_only(value: &str) -> bool {
    EMOJI_SEQUENCE.is_match(value) && EMOJI_BASE.is_match(value)
}

/// Emptiness is reported by the length rule only.
pub fn validate_emoji_only(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() || is_emoji_only(value) {
        return Ok(());
    }

    let mut err = ValidationError::new("emoji");
    err.message = Some(Cow::Borrowed(EMOJI_ONLY_MESSAGE));
    Err(err)
}

/// Body of `posts.create`. Unknown fields (e.g. `authorId`) are ignored.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreatePostInput {
    #[validate(
        length(min = 1, max = 280),
        custom(function = "crate::validation::validate_emoji_only")
    )]
    pub content: String,
}

/// Rejects an empty identifier, keyed by its wire name.
pub fn require_non_empty(field: &str, value: &str) -> Result<(), AppError> {
    if !value.is_empty() {
        return Ok(());
    }

    let mut errors = FieldErrors::new();
    errors.insert(field.to_string(), vec![min_length_message(1)]);
    Err(AppError::Validation(errors))
}

/// Flatten validator output into `field -> messages`, keeping rule order.
pub fn to_field_errors(errors: &ValidationErrors) -> FieldErrors {
    let mut fields = FieldErrors::new();
    for (field, field_errors) in errors.field_errors() {
        let messages = field_errors.iter().map(message_for).collect();
        fields.insert(field.to_string(), messages);
    }
    fields
}

fn message_for(error: &ValidationError) -> String {
    if let Some(message) = &error.message {
        return message.to_string();
    }

    match error.code.as_ref() {
        "length" => {
            let min = error.params.get("min").and_then(|v| v.as_u64());
            let max = error.params.get("max").and_then(|v| v.as_u64());
            let len = error
                .params
                .get("value")
                .and_then(|v| v.as_str())
                .map(|s| s.chars().count() as u64);

            match (min, max, len) {
                (Some(min), _, Some(len)) if len < min => min_length_message(min),
                (_, Some(max), _) => max_length_message(max),
                (Some(min), None, _) => min_length_message(min),
                _ => "Invalid length".to_string(),
            }
        }
        code => format!("Invalid value ({})", code),
    }
}

fn min_length_message(min: u64) -> String {
    format!("String must contain at least {} character(s)", min)
}

fn max_length_message(max: u64) -> String {
    format!("String must contain at most {} character(s)", max)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content_errors(content: &str) -> Option<Vec<String>> {
        let input = CreatePostInput {
            content: content.to_string(),
        };
        input
            .validate()
            .err()
            .map(|e| to_field_errors(&e).remove("content").unwrap_or_default())
    }

    #[test]
    fn test_emoji_only_accepts_sequences() {
        assert!(is_emoji_only("🔥"));
        assert!(is_emoji_only("🔥🔥🚀"));
        assert!(is_emoji_only("👍🏽"));
        assert!(is_emoji_only("👩‍👩‍👧"));
        assert!(is_emoji_only("🇯🇵"));
        assert!(is_emoji_only("❤️"));
        assert!(is_emoji_only("1️⃣"));
        assert!(is_emoji_only("🏴󠁧󠁢󠁳󠁣󠁴󠁿"));
    }

    #[test]
    fn test_emoji_only_rejects_text() {
        assert!(!is_emoji_only("hello"));
        assert!(!is_emoji_only("🔥 fire"));
        assert!(!is_emoji_only("🔥 🔥"));
        assert!(!is_emoji_only("123"));
        assert!(!is_emoji_only("\u{200D}"));
        assert!(!is_emoji_only("\u{FE0F}"));
        assert!(!is_emoji_only(""));
    }

    #[test]
    fn test_create_input_valid() {
        assert!(content_errors("🔥🔥").is_none());
        assert!(content_errors(&"😀".repeat(280)).is_none());
    }

    #[test]
    fn test_create_input_text_is_emoji_error() {
        assert_eq!(
            content_errors("hello"),
            Some(vec![EMOJI_ONLY_MESSAGE.to_string()])
        );
    }

    #[test]
    fn test_create_input_empty_is_length_error_only() {
        assert_eq!(
            content_errors(""),
            Some(vec!["String must contain at least 1 character(s)".to_string()])
        );
    }

    #[test]
    fn test_create_input_too_long() {
        assert_eq!(
            content_errors(&"😀".repeat(281)),
            Some(vec!["String must contain at most 280 character(s)".to_string()])
        );
    }

    #[test]
    fn test_create_input_ignores_unknown_fields() {
        let input: CreatePostInput =
            serde_json::from_str(r#"{"content":"🔥","authorId":"user_evil"}"#).unwrap();
        assert_eq!(input.content, "🔥");
    }

    #[test]
    fn test_require_non_empty() {
        assert!(require_non_empty("postId", "abc").is_ok());

        match require_non_empty("postId", "") {
            Err(AppError::Validation(fields)) => {
                assert_eq!(
                    fields.get("postId"),
                    Some(&vec!["String must contain at least 1 character(s)".to_string()])
                );
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }
}
