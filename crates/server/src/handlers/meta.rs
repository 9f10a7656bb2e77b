//! Service metadata endpoints.

use crate::error::ApiResult;
use crate::state::AppState;
use axum::Json;
use axum::extract::State;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub message: String,
    pub version: String,
}

/// Root greeting, useful as a smoke check that routing is up.
pub async fn index() -> Json<HealthResponse> {
    Json(HealthResponse {
        message: "Healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Health check. Verifies the store answers before reporting healthy.
pub async fn health_check(State(state): State<AppState>) -> ApiResult<Json<HealthResponse>> {
    state.store.health_check().await?;

    Ok(Json(HealthResponse {
        message: "Healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }))
}
