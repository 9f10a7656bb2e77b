//! Task CRUD, filtering, and completion endpoints.

use crate::auth::require_user;
use crate::error::ApiResult;
use crate::handlers::common::{
    CompleteRequest, SuccessResponse, double_option, format_rfc3339, get_owned_task, parse_rfc3339,
    read_json_body, read_json_body_or_default,
};
use crate::handlers::subtasks::{SubtaskResponse, subtask_to_response};
use crate::state::AppState;
use axum::Json;
use axum::extract::{Path, Query, Request, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use grove_core::{DEFAULT_ESTIMATED_MINUTES, DEFAULT_TASK_PRIORITY, TaskFilter, TaskSortBy};
use grove_core::validate;
use grove_store::models::{NewTask, TaskRow};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Debug, Serialize)]
pub struct TaskResponse {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub priority: i64,
    pub estimated_minutes: i64,
    pub due_at: Option<String>,
    pub is_completed: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// A task together with all of its subtasks, flattened so the task fields
/// stay at the top level of the JSON object.
#[derive(Debug, Serialize)]
pub struct TaskDetailResponse {
    #[serde(flatten)]
    pub task: TaskResponse,
    pub subtasks: Vec<SubtaskResponse>,
}

#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Option<i64>,
    #[serde(default)]
    pub estimated_minutes: Option<i64>,
    #[serde(default)]
    pub due_at: Option<String>,
}

/// Partial update. Absent fields are untouched; explicit nulls clear
/// `description` and `due_at` but are ignored for the required fields.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateTaskRequest {
    #[serde(default, deserialize_with = "double_option")]
    pub title: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub priority: Option<Option<i64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub estimated_minutes: Option<Option<i64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub due_at: Option<Option<String>>,
}

#[derive(Debug, Deserialize)]
pub struct ListTasksParams {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub priority: Option<i64>,
    #[serde(default)]
    pub due_within_days: Option<i64>,
    #[serde(default)]
    pub sort_by: Option<String>,
}

pub fn task_to_response(task: &TaskRow) -> ApiResult<TaskResponse> {
    Ok(TaskResponse {
        id: task.id,
        user_id: task.user_id,
        title: task.title.clone(),
        description: task.description.clone(),
        priority: task.priority,
        estimated_minutes: task.estimated_minutes,
        due_at: task.due_at.map(format_rfc3339).transpose()?,
        is_completed: task.is_completed,
        created_at: format_rfc3339(task.created_at)?,
        updated_at: format_rfc3339(task.updated_at)?,
    })
}

/// Render a task with its subtasks. Effective subtask fields come from the
/// task row passed in, so callers must hand over the current row.
pub async fn task_detail(state: &AppState, task: &TaskRow) -> ApiResult<TaskDetailResponse> {
    let rows = state.store.list_subtasks_for_task(task.id).await?;
    let subtasks = rows
        .iter()
        .map(|subtask| subtask_to_response(subtask, task))
        .collect::<ApiResult<Vec<_>>>()?;

    Ok(TaskDetailResponse {
        task: task_to_response(task)?,
        subtasks,
    })
}

/// GET /tasks - List the caller's tasks with optional filters and sort.
pub async fn list_tasks(
    State(state): State<AppState>,
    Query(params): Query<ListTasksParams>,
    req: Request,
) -> ApiResult<Json<Vec<TaskResponse>>> {
    let user_id = require_user(&req)?.user.id;

    let sort_by = params
        .sort_by
        .as_deref()
        .map(TaskSortBy::parse)
        .transpose()?
        .unwrap_or_default();
    let filter = TaskFilter {
        // An empty search matches everything, same as not filtering.
        search: params.search.filter(|s| !s.is_empty()),
        priority: params.priority,
        due_within_days: params.due_within_days,
    };

    let now = OffsetDateTime::now_utc();
    let rows = state.store.list_tasks(user_id, &filter, sort_by, now).await?;
    let tasks = rows
        .iter()
        .map(task_to_response)
        .collect::<ApiResult<Vec<_>>>()?;
    Ok(Json(tasks))
}

/// POST /tasks - Create a task for the caller.
pub async fn create_task(
    State(state): State<AppState>,
    req: Request,
) -> ApiResult<impl IntoResponse> {
    let user_id = require_user(&req)?.user.id;
    let body: CreateTaskRequest = read_json_body(req).await?;

    let title = validate::title(&body.title)?;
    let priority = validate::non_negative("priority", body.priority.unwrap_or(DEFAULT_TASK_PRIORITY))?;
    let estimated_minutes = validate::non_negative(
        "estimated_minutes",
        body.estimated_minutes.unwrap_or(DEFAULT_ESTIMATED_MINUTES),
    )?;
    let due_at = body
        .due_at
        .as_deref()
        .map(|raw| parse_rfc3339("due_at", raw))
        .transpose()?;

    let now = OffsetDateTime::now_utc();
    let task = state
        .store
        .create_task(&NewTask {
            user_id,
            title: &title,
            description: body.description.as_deref(),
            priority,
            estimated_minutes,
            due_at,
            created_at: now,
        })
        .await?;

    tracing::info!(task_id = task.id, user_id, "created task");

    Ok((StatusCode::CREATED, Json(task_detail(&state, &task).await?)))
}

/// GET /tasks/{task_id} - Fetch one task with its subtasks.
pub async fn get_task(
    State(state): State<AppState>,
    Path(task_id): Path<i64>,
    req: Request,
) -> ApiResult<Json<TaskDetailResponse>> {
    let user_id = require_user(&req)?.user.id;
    let task = get_owned_task(&state, user_id, task_id).await?;
    Ok(Json(task_detail(&state, &task).await?))
}

/// PATCH /tasks/{task_id} - Partially update a task.
pub async fn update_task(
    State(state): State<AppState>,
    Path(task_id): Path<i64>,
    req: Request,
) -> ApiResult<Json<TaskDetailResponse>> {
    let user_id = require_user(&req)?.user.id;
    let body: UpdateTaskRequest = read_json_body(req).await?;
    let mut task = get_owned_task(&state, user_id, task_id).await?;

    if let Some(Some(title)) = body.title {
        task.title = validate::title(&title)?;
    }
    if let Some(Some(priority)) = body.priority {
        task.priority = validate::non_negative("priority", priority)?;
    }
    if let Some(Some(minutes)) = body.estimated_minutes {
        task.estimated_minutes = validate::non_negative("estimated_minutes", minutes)?;
    }
    if let Some(description) = body.description {
        task.description = description;
    }
    if let Some(due_at) = body.due_at {
        task.due_at = due_at
            .map(|raw| parse_rfc3339("due_at", &raw))
            .transpose()?;
    }
    task.updated_at = OffsetDateTime::now_utc();

    state.store.update_task(&task).await?;
    Ok(Json(task_detail(&state, &task).await?))
}

/// DELETE /tasks/{task_id} - Delete a task and its whole subtask forest.
pub async fn delete_task(
    State(state): State<AppState>,
    Path(task_id): Path<i64>,
    req: Request,
) -> ApiResult<Json<SuccessResponse>> {
    let user_id = require_user(&req)?.user.id;
    let task = get_owned_task(&state, user_id, task_id).await?;

    state.store.delete_task(task.id).await?;
    tracing::info!(task_id = task.id, user_id, "deleted task");

    Ok(Json(SuccessResponse { success: true }))
}

/// POST /tasks/{task_id}/complete - Set the completion flag, optionally
/// forcing every subtask to the same value.
pub async fn complete_task(
    State(state): State<AppState>,
    Path(task_id): Path<i64>,
    req: Request,
) -> ApiResult<Json<TaskDetailResponse>> {
    let user_id = require_user(&req)?.user.id;
    let body: CompleteRequest = read_json_body_or_default(req).await?;
    let task = get_owned_task(&state, user_id, task_id).await?;

    let now = OffsetDateTime::now_utc();
    state
        .store
        .set_task_completion(task.id, body.complete, body.cascade, now)
        .await?;

    let task = get_owned_task(&state, user_id, task_id).await?;
    Ok(Json(task_detail(&state, &task).await?))
}
