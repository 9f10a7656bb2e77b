//! Error types for the core domain.

use thiserror::Error;

/// Core domain error type.
///
/// Every variant here describes input the caller can fix, so the HTTP layer
/// maps all of them to a 400 response.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid {field}: {reason}")]
    InvalidField {
        field: &'static str,
        reason: String,
    },

    #[error("unknown sort key: {0} (expected priority, due_at, estimated_minutes, or created_at)")]
    UnknownSortKey(String),

    #[error("a subtask cannot be its own parent")]
    SelfParent,

    #[error("a subtask cannot be nested under its own descendant")]
    DescendantCycle,
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;
