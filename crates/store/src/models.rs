//! Database models mapping to the store schema.

use sqlx::FromRow;
use time::OffsetDateTime;

// =============================================================================
// Users and sessions
// =============================================================================

/// User record, identified by a unique username.
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub created_at: OffsetDateTime,
}

/// Login session record.
///
/// The raw session token never reaches the database; only its SHA-256 hex
/// digest is stored.
#[derive(Debug, Clone, FromRow)]
pub struct SessionRow {
    pub id: i64,
    pub user_id: i64,
    pub token_hash: String,
    pub created_at: OffsetDateTime,
    /// When the session stops being accepted. NULL sessions live until logout.
    pub expires_at: Option<OffsetDateTime>,
}

// =============================================================================
// Tasks
// =============================================================================

/// Task record owned by a user.
#[derive(Debug, Clone, FromRow)]
pub struct TaskRow {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub priority: i64,
    pub estimated_minutes: i64,
    pub due_at: Option<OffsetDateTime>,
    pub is_completed: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Fields for inserting a new task. The id and completion flag are assigned
/// by the store.
#[derive(Debug)]
pub struct NewTask<'a> {
    pub user_id: i64,
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub priority: i64,
    pub estimated_minutes: i64,
    pub due_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
}

// =============================================================================
// Subtasks
// =============================================================================

/// Subtask record. Belongs to exactly one task; `parent_subtask_id` nests it
/// under another subtask of the same task, or NULL for a root.
#[derive(Debug, Clone, FromRow)]
pub struct SubtaskRow {
    pub id: i64,
    pub task_id: i64,
    pub parent_subtask_id: Option<i64>,
    pub title: String,
    pub description: Option<String>,
    pub is_completed: bool,
    pub order_index: i64,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Fields for inserting a new subtask.
#[derive(Debug)]
pub struct NewSubtask<'a> {
    pub task_id: i64,
    pub parent_subtask_id: Option<i64>,
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub order_index: i64,
    pub created_at: OffsetDateTime,
}
