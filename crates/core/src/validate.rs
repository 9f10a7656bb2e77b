//! Field validation shared by the HTTP layer.
//!
//! All validators return the core [`Error::InvalidField`](crate::Error) so the
//! server can render a uniform 400 response regardless of which field failed.

use crate::error::{Error, Result};
use crate::{MAX_TITLE_LEN, MAX_USERNAME_LEN};

/// Validate and normalize a username.
///
/// Usernames are trimmed and must be 1 to [`MAX_USERNAME_LEN`] characters
/// after trimming.
pub fn username(raw: &str) -> Result<String> {
    bounded_text("username", raw, MAX_USERNAME_LEN)
}

/// Validate and normalize a task or subtask title.
///
/// Titles are trimmed and must be 1 to [`MAX_TITLE_LEN`] characters after
/// trimming.
pub fn title(raw: &str) -> Result<String> {
    bounded_text("title", raw, MAX_TITLE_LEN)
}

/// Validate a numeric field that must not be negative (priority, estimate,
/// order index).
pub fn non_negative(field: &'static str, value: i64) -> Result<i64> {
    if value < 0 {
        return Err(Error::InvalidField {
            field,
            reason: format!("must not be negative (got {value})"),
        });
    }
    Ok(value)
}

fn bounded_text(field: &'static str, raw: &str, max_len: usize) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidField {
            field,
            reason: "must not be empty".to_string(),
        });
    }
    // Length is counted in characters, not bytes, so multi-byte input
    // is not penalized.
    if trimmed.chars().count() > max_len {
        return Err(Error::InvalidField {
            field,
            reason: format!("must be at most {max_len} characters"),
        });
    }
    Ok(trimmed.to_string())
}
