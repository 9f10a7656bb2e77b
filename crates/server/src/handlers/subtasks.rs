//! Subtask endpoints, including the tree-shaped parts: re-parenting with the
//! cycle guard and cascading completion over a subtree.

use crate::auth::require_user;
use crate::error::{ApiError, ApiResult};
use crate::handlers::common::{
    CompleteRequest, SuccessResponse, double_option, format_rfc3339, get_owned_subtask,
    get_owned_task, read_json_body, read_json_body_or_default,
};
use crate::state::AppState;
use axum::Json;
use axum::extract::{Path, Request, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use grove_core::SubtaskForest;
use grove_core::validate;
use grove_store::models::{NewSubtask, SubtaskRow, TaskRow};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Debug, Serialize)]
pub struct SubtaskResponse {
    pub id: i64,
    pub task_id: i64,
    pub parent_subtask_id: Option<i64>,
    pub title: String,
    pub description: Option<String>,
    pub is_completed: bool,
    pub order_index: i64,
    pub effective_priority: i64,
    pub effective_estimated_minutes: i64,
    pub effective_due_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateSubtaskRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub parent_subtask_id: Option<i64>,
    #[serde(default)]
    pub order_index: Option<i64>,
}

/// Partial update. `parent_subtask_id: null` detaches the subtask to the
/// root of the task's forest.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateSubtaskRequest {
    #[serde(default, deserialize_with = "double_option")]
    pub title: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub parent_subtask_id: Option<Option<i64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub order_index: Option<Option<i64>>,
}

/// Subtasks carry no scheduling fields of their own. The `effective_*`
/// values are copied from the owning task at render time.
pub fn subtask_to_response(subtask: &SubtaskRow, task: &TaskRow) -> ApiResult<SubtaskResponse> {
    Ok(SubtaskResponse {
        id: subtask.id,
        task_id: subtask.task_id,
        parent_subtask_id: subtask.parent_subtask_id,
        title: subtask.title.clone(),
        description: subtask.description.clone(),
        is_completed: subtask.is_completed,
        order_index: subtask.order_index,
        effective_priority: task.priority,
        effective_estimated_minutes: task.estimated_minutes,
        effective_due_at: task.due_at.map(format_rfc3339).transpose()?,
        created_at: format_rfc3339(subtask.created_at)?,
        updated_at: format_rfc3339(subtask.updated_at)?,
    })
}

async fn load_forest(state: &AppState, task_id: i64) -> ApiResult<SubtaskForest> {
    let rows = state.store.list_subtasks_for_task(task_id).await?;
    Ok(SubtaskForest::from_nodes(
        rows.iter().map(|s| (s.id, s.parent_subtask_id)),
    ))
}

fn parent_not_found() -> ApiError {
    ApiError::NotFound("parent subtask not found under this task".to_string())
}

/// GET /tasks/{task_id}/subtasks - Flat list of a task's subtasks.
pub async fn list_subtasks(
    State(state): State<AppState>,
    Path(task_id): Path<i64>,
    req: Request,
) -> ApiResult<Json<Vec<SubtaskResponse>>> {
    let user_id = require_user(&req)?.user.id;
    let task = get_owned_task(&state, user_id, task_id).await?;

    let rows = state.store.list_subtasks_for_task(task.id).await?;
    let subtasks = rows
        .iter()
        .map(|subtask| subtask_to_response(subtask, &task))
        .collect::<ApiResult<Vec<_>>>()?;
    Ok(Json(subtasks))
}

/// POST /tasks/{task_id}/subtasks - Create a subtask under a task.
pub async fn create_subtask(
    State(state): State<AppState>,
    Path(task_id): Path<i64>,
    req: Request,
) -> ApiResult<impl IntoResponse> {
    let user_id = require_user(&req)?.user.id;
    let body: CreateSubtaskRequest = read_json_body(req).await?;
    let task = get_owned_task(&state, user_id, task_id).await?;

    let title = validate::title(&body.title)?;
    let order_index = validate::non_negative("order_index", body.order_index.unwrap_or(0))?;
    if let Some(parent_id) = body.parent_subtask_id {
        let forest = load_forest(&state, task.id).await?;
        if !forest.contains(parent_id) {
            return Err(parent_not_found());
        }
    }

    let now = OffsetDateTime::now_utc();
    let subtask = state
        .store
        .create_subtask(&NewSubtask {
            task_id: task.id,
            parent_subtask_id: body.parent_subtask_id,
            title: &title,
            description: body.description.as_deref(),
            order_index,
            created_at: now,
        })
        .await?;

    tracing::info!(subtask_id = subtask.id, task_id = task.id, user_id, "created subtask");

    Ok((
        StatusCode::CREATED,
        Json(subtask_to_response(&subtask, &task)?),
    ))
}

/// GET /subtasks/{subtask_id} - Fetch one subtask.
pub async fn get_subtask(
    State(state): State<AppState>,
    Path(subtask_id): Path<i64>,
    req: Request,
) -> ApiResult<Json<SubtaskResponse>> {
    let user_id = require_user(&req)?.user.id;
    let (subtask, task) = get_owned_subtask(&state, user_id, subtask_id).await?;
    Ok(Json(subtask_to_response(&subtask, &task)?))
}

/// PATCH /subtasks/{subtask_id} - Partially update a subtask. Re-parenting
/// is validated against the task's current forest before anything is
/// written.
pub async fn update_subtask(
    State(state): State<AppState>,
    Path(subtask_id): Path<i64>,
    req: Request,
) -> ApiResult<Json<SubtaskResponse>> {
    let user_id = require_user(&req)?.user.id;
    let body: UpdateSubtaskRequest = read_json_body(req).await?;
    let (mut subtask, task) = get_owned_subtask(&state, user_id, subtask_id).await?;

    if let Some(Some(title)) = body.title {
        subtask.title = validate::title(&title)?;
    }
    if let Some(Some(order_index)) = body.order_index {
        subtask.order_index = validate::non_negative("order_index", order_index)?;
    }
    if let Some(description) = body.description {
        subtask.description = description;
    }
    if let Some(parent_patch) = body.parent_subtask_id {
        match parent_patch {
            None => subtask.parent_subtask_id = None,
            Some(parent_id) => {
                let forest = load_forest(&state, task.id).await?;
                if !forest.contains(parent_id) {
                    return Err(parent_not_found());
                }
                forest.ensure_can_reparent(subtask.id, parent_id)?;
                subtask.parent_subtask_id = Some(parent_id);
            }
        }
    }
    subtask.updated_at = OffsetDateTime::now_utc();

    state.store.update_subtask(&subtask).await?;
    Ok(Json(subtask_to_response(&subtask, &task)?))
}

/// DELETE /subtasks/{subtask_id} - Delete a subtask and everything beneath
/// it.
pub async fn delete_subtask(
    State(state): State<AppState>,
    Path(subtask_id): Path<i64>,
    req: Request,
) -> ApiResult<Json<SuccessResponse>> {
    let user_id = require_user(&req)?.user.id;
    let (subtask, task) = get_owned_subtask(&state, user_id, subtask_id).await?;

    state.store.delete_subtask(subtask.id).await?;
    tracing::info!(subtask_id = subtask.id, task_id = task.id, user_id, "deleted subtask");

    Ok(Json(SuccessResponse { success: true }))
}

/// POST /subtasks/{subtask_id}/complete - Set the completion flag, with
/// cascade forcing the whole descendant subtree to the same value.
pub async fn complete_subtask(
    State(state): State<AppState>,
    Path(subtask_id): Path<i64>,
    req: Request,
) -> ApiResult<Json<SubtaskResponse>> {
    let user_id = require_user(&req)?.user.id;
    let body: CompleteRequest = read_json_body_or_default(req).await?;
    let (subtask, task) = get_owned_subtask(&state, user_id, subtask_id).await?;

    let targets = if body.cascade {
        let forest = load_forest(&state, task.id).await?;
        forest.subtree_ids(subtask.id)
    } else {
        vec![subtask.id]
    };

    let now = OffsetDateTime::now_utc();
    state
        .store
        .set_subtasks_completion(&targets, body.complete, now)
        .await?;

    let (subtask, task) = get_owned_subtask(&state, user_id, subtask_id).await?;
    Ok(Json(subtask_to_response(&subtask, &task)?))
}
