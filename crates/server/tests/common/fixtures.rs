//! Test fixtures for seeding rows through the store API.

use grove_store::Store;
use grove_store::models::{NewSubtask, NewTask, SubtaskRow, TaskRow, UserRow};
use std::sync::Arc;
use time::OffsetDateTime;

/// Create a user.
/// Note: #[allow(dead_code)] because each test file compiles common/ separately.
#[allow(dead_code)]
pub async fn seed_user(store: &Arc<dyn Store>, username: &str) -> UserRow {
    store
        .create_user(username, OffsetDateTime::now_utc())
        .await
        .expect("Failed to create user")
}

/// Create a task with default priority and estimate.
#[allow(dead_code)]
pub async fn seed_task(store: &Arc<dyn Store>, user_id: i64, title: &str) -> TaskRow {
    store
        .create_task(&NewTask {
            user_id,
            title,
            description: None,
            priority: 3,
            estimated_minutes: 0,
            due_at: None,
            created_at: OffsetDateTime::now_utc(),
        })
        .await
        .expect("Failed to create task")
}

/// Create a task with an explicit due date.
#[allow(dead_code)]
pub async fn seed_task_due(
    store: &Arc<dyn Store>,
    user_id: i64,
    title: &str,
    due_at: OffsetDateTime,
) -> TaskRow {
    store
        .create_task(&NewTask {
            user_id,
            title,
            description: None,
            priority: 3,
            estimated_minutes: 0,
            due_at: Some(due_at),
            created_at: OffsetDateTime::now_utc(),
        })
        .await
        .expect("Failed to create task")
}

/// Create a subtask, optionally nested under `parent_subtask_id`.
#[allow(dead_code)]
pub async fn seed_subtask(
    store: &Arc<dyn Store>,
    task_id: i64,
    parent_subtask_id: Option<i64>,
    title: &str,
) -> SubtaskRow {
    store
        .create_subtask(&NewSubtask {
            task_id,
            parent_subtask_id,
            title,
            description: None,
            order_index: 0,
            created_at: OffsetDateTime::now_utc(),
        })
        .await
        .expect("Failed to create subtask")
}
