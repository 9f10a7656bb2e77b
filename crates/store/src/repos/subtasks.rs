//! Subtask repository.

use crate::error::StoreResult;
use crate::models::{NewSubtask, SubtaskRow};
use async_trait::async_trait;
use time::OffsetDateTime;

/// Repository for subtask records.
#[async_trait]
pub trait SubtaskRepo: Send + Sync {
    /// Insert a new subtask and return the stored row.
    async fn create_subtask(&self, new: &NewSubtask<'_>) -> StoreResult<SubtaskRow>;

    /// Get a subtask by id.
    async fn get_subtask(&self, subtask_id: i64) -> StoreResult<Option<SubtaskRow>>;

    /// All subtasks of one task, oldest first.
    async fn list_subtasks_for_task(&self, task_id: i64) -> StoreResult<Vec<SubtaskRow>>;

    /// All subtasks across every task a user owns, oldest first. Not exposed
    /// over HTTP; kept for agenda-style views that span tasks.
    async fn list_subtasks_for_user(&self, user_id: i64) -> StoreResult<Vec<SubtaskRow>>;

    /// Write back every mutable column of a subtask.
    async fn update_subtask(&self, subtask: &SubtaskRow) -> StoreResult<()>;

    /// Delete a subtask. Its descendants go with it via the schema cascade.
    async fn delete_subtask(&self, subtask_id: i64) -> StoreResult<()>;

    /// Force the completion flag on a set of subtasks in one transaction.
    /// Callers pass a collected subtree when completion cascades.
    async fn set_subtasks_completion(
        &self,
        subtask_ids: &[i64],
        complete: bool,
        now: OffsetDateTime,
    ) -> StoreResult<()>;
}
