//! Task repository.

use crate::error::StoreResult;
use crate::models::{NewTask, TaskRow};
use async_trait::async_trait;
use grove_core::{TaskFilter, TaskSortBy};
use time::OffsetDateTime;

/// Repository for task records.
#[async_trait]
pub trait TaskRepo: Send + Sync {
    /// Insert a new task and return the stored row.
    async fn create_task(&self, new: &NewTask<'_>) -> StoreResult<TaskRow>;

    /// Get a task by id.
    async fn get_task(&self, task_id: i64) -> StoreResult<Option<TaskRow>>;

    /// List a user's tasks with optional filters and a sort order. `now`
    /// anchors the due-window filter.
    async fn list_tasks(
        &self,
        user_id: i64,
        filter: &TaskFilter,
        sort: TaskSortBy,
        now: OffsetDateTime,
    ) -> StoreResult<Vec<TaskRow>>;

    /// Write back every mutable column of a task.
    async fn update_task(&self, task: &TaskRow) -> StoreResult<()>;

    /// Delete a task. Its subtasks go with it via the schema cascade.
    async fn delete_task(&self, task_id: i64) -> StoreResult<()>;

    /// Set a task's completion flag. With `cascade`, every subtask of the
    /// task receives the same flag in the same transaction.
    async fn set_task_completion(
        &self,
        task_id: i64,
        complete: bool,
        cascade: bool,
        now: OffsetDateTime,
    ) -> StoreResult<()>;
}
