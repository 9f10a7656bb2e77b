//! Shared handler helpers.

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::extract::Request;
use grove_store::models::{SubtaskRow, TaskRow};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// Maximum accepted request body size.
pub const MAX_BODY_SIZE: usize = 1024 * 1024; // 1MB

/// Body of the delete endpoints.
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Body for the completion endpoints. An empty body means "complete, no
/// cascade".
#[derive(Debug, Deserialize)]
pub struct CompleteRequest {
    #[serde(default = "default_complete")]
    pub complete: bool,
    #[serde(default)]
    pub cascade: bool,
}

fn default_complete() -> bool {
    true
}

impl Default for CompleteRequest {
    fn default() -> Self {
        Self {
            complete: true,
            cascade: false,
        }
    }
}

/// Read and deserialize a JSON request body.
pub async fn read_json_body<T: DeserializeOwned>(req: Request) -> ApiResult<T> {
    let bytes = axum::body::to_bytes(req.into_body(), MAX_BODY_SIZE)
        .await
        .map_err(|e| ApiError::BadRequest(format!("failed to read body: {e}")))?;
    serde_json::from_slice(&bytes).map_err(|e| ApiError::BadRequest(format!("invalid JSON: {e}")))
}

/// Read and deserialize a JSON request body, treating an empty body as the
/// type's default.
pub async fn read_json_body_or_default<T: DeserializeOwned + Default>(
    req: Request,
) -> ApiResult<T> {
    let bytes = axum::body::to_bytes(req.into_body(), MAX_BODY_SIZE)
        .await
        .map_err(|e| ApiError::BadRequest(format!("failed to read body: {e}")))?;
    if bytes.is_empty() {
        return Ok(T::default());
    }
    serde_json::from_slice(&bytes).map_err(|e| ApiError::BadRequest(format!("invalid JSON: {e}")))
}

/// Deserialize helper distinguishing an absent PATCH field from an explicit
/// null: absent stays `None`, null becomes `Some(None)`, a value becomes
/// `Some(Some(value))`. Use together with `#[serde(default)]`.
pub fn double_option<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: serde::Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    serde::Deserialize::deserialize(de).map(Some)
}

/// Parse an RFC 3339 timestamp supplied by a client.
pub fn parse_rfc3339(field: &'static str, value: &str) -> ApiResult<OffsetDateTime> {
    OffsetDateTime::parse(value, &Rfc3339)
        .map_err(|e| ApiError::BadRequest(format!("invalid {field}: {e}")))
}

/// Format a timestamp for a response body.
pub fn format_rfc3339(ts: OffsetDateTime) -> ApiResult<String> {
    ts.format(&Rfc3339)
        .map_err(|e| ApiError::Internal(format!("failed to format timestamp: {e}")))
}

/// Fetch a task and check it belongs to `user_id`.
/// Another owner's task reads as missing.
pub async fn get_owned_task(state: &AppState, user_id: i64, task_id: i64) -> ApiResult<TaskRow> {
    state
        .store
        .get_task(task_id)
        .await?
        .filter(|task| task.user_id == user_id)
        .ok_or_else(|| ApiError::NotFound(format!("task {task_id} not found")))
}

/// Fetch a subtask together with its owning task, checking ownership through
/// the task. A missing subtask, a missing task, and another owner's task all
/// read as the same NotFound.
pub async fn get_owned_subtask(
    state: &AppState,
    user_id: i64,
    subtask_id: i64,
) -> ApiResult<(SubtaskRow, TaskRow)> {
    let not_found = || ApiError::NotFound(format!("subtask {subtask_id} not found"));

    let subtask = state
        .store
        .get_subtask(subtask_id)
        .await?
        .ok_or_else(not_found)?;
    let task = state
        .store
        .get_task(subtask.task_id)
        .await?
        .filter(|task| task.user_id == user_id)
        .ok_or_else(not_found)?;
    Ok((subtask, task))
}
