//! Filter and sort vocabulary for task listings.

use crate::error::{Error, Result};

/// Optional filters applied when listing a user's tasks.
///
/// All filters combine with AND. An unset field imposes no constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    /// Case-insensitive substring match against title or description.
    pub search: Option<String>,
    /// Exact priority match.
    pub priority: Option<i64>,
    /// Keep only tasks with a due date no later than this many days from now.
    /// Tasks without a due date never match. Negative values are ignored as if
    /// the filter were absent.
    pub due_within_days: Option<i64>,
}

impl TaskFilter {
    /// Whether any filter is active.
    pub fn is_empty(&self) -> bool {
        self.search.is_none() && self.priority.is_none() && self.due_within_days.is_none()
    }
}

/// Sort orders accepted by the task listing endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskSortBy {
    /// Ascending priority; newest first within equal priorities.
    Priority,
    /// Ascending due date; tasks without one sort last.
    DueAt,
    /// Ascending estimate; newest first within equal estimates.
    EstimatedMinutes,
    /// Newest first.
    #[default]
    CreatedAt,
}

impl TaskSortBy {
    /// Parse a sort key as supplied in the `sort_by` query parameter.
    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "priority" => Ok(Self::Priority),
            "due_at" => Ok(Self::DueAt),
            "estimated_minutes" => Ok(Self::EstimatedMinutes),
            "created_at" => Ok(Self::CreatedAt),
            other => Err(Error::UnknownSortKey(other.to_string())),
        }
    }

    /// Canonical name of this sort key.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Priority => "priority",
            Self::DueAt => "due_at",
            Self::EstimatedMinutes => "estimated_minutes",
            Self::CreatedAt => "created_at",
        }
    }
}

impl std::fmt::Display for TaskSortBy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_by_parse_known_keys() {
        assert_eq!(TaskSortBy::parse("priority").unwrap(), TaskSortBy::Priority);
        assert_eq!(TaskSortBy::parse("due_at").unwrap(), TaskSortBy::DueAt);
        assert_eq!(
            TaskSortBy::parse("estimated_minutes").unwrap(),
            TaskSortBy::EstimatedMinutes
        );
        assert_eq!(
            TaskSortBy::parse("created_at").unwrap(),
            TaskSortBy::CreatedAt
        );
    }

    #[test]
    fn test_sort_by_parse_rejects_unknown() {
        let err = TaskSortBy::parse("updated_at").unwrap_err();
        assert!(matches!(err, Error::UnknownSortKey(ref key) if key == "updated_at"));
        // Keys are case-sensitive.
        assert!(TaskSortBy::parse("Priority").is_err());
        assert!(TaskSortBy::parse("").is_err());
    }

    #[test]
    fn test_sort_by_roundtrip() {
        for sort in [
            TaskSortBy::Priority,
            TaskSortBy::DueAt,
            TaskSortBy::EstimatedMinutes,
            TaskSortBy::CreatedAt,
        ] {
            assert_eq!(TaskSortBy::parse(sort.as_str()).unwrap(), sort);
        }
    }

    #[test]
    fn test_sort_by_default_is_created_at() {
        assert_eq!(TaskSortBy::default(), TaskSortBy::CreatedAt);
    }

    #[test]
    fn test_filter_is_empty() {
        assert!(TaskFilter::default().is_empty());
        let filter = TaskFilter {
            priority: Some(1),
            ..TaskFilter::default()
        };
        assert!(!filter.is_empty());
    }
}
