//! Session endpoints: login, logout, whoami.

use crate::auth::{self, clear_session_cookie, hash_token, mint_session_token, session_cookie};
use crate::error::{ApiError, ApiResult};
use crate::handlers::common::{format_rfc3339, read_json_body};
use crate::state::AppState;
use axum::Json;
use axum::extract::{Request, State};
use axum::http::header;
use axum::response::IntoResponse;
use grove_core::validate;
use grove_store::StoreError;
use grove_store::models::UserRow;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub created_at: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: UserResponse,
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub success: bool,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: Option<UserResponse>,
}

pub fn user_to_response(user: &UserRow) -> ApiResult<UserResponse> {
    Ok(UserResponse {
        id: user.id,
        username: user.username.clone(),
        created_at: format_rfc3339(user.created_at)?,
    })
}

/// Log in by username, creating the account on first use.
pub async fn login(State(state): State<AppState>, req: Request) -> ApiResult<impl IntoResponse> {
    let body: LoginRequest = read_json_body(req).await?;
    let username = validate::username(&body.username)?;
    let now = OffsetDateTime::now_utc();

    let user = match state.store.get_user_by_username(&username).await? {
        Some(user) => user,
        None => match state.store.create_user(&username, now).await {
            Ok(user) => user,
            // Two concurrent first logins race on the unique username; the
            // loser falls back to the winner's row.
            Err(StoreError::Constraint(_)) => state
                .store
                .get_user_by_username(&username)
                .await?
                .ok_or_else(|| {
                    ApiError::Internal(format!("user '{username}' vanished after insert conflict"))
                })?,
            Err(e) => return Err(e.into()),
        },
    };

    match state.store.delete_expired_sessions(now).await {
        Ok(0) => {}
        Ok(count) => tracing::debug!(count, "removed expired sessions"),
        Err(e) => tracing::warn!(error = %e, "failed to sweep expired sessions"),
    }

    let token = mint_session_token();
    let expires_at = state.config.session.ttl().map(|ttl| now + ttl);
    state
        .store
        .create_session(user.id, &hash_token(&token), now, expires_at)
        .await?;

    tracing::info!(user_id = user.id, username = %user.username, "user logged in");

    let cookie = session_cookie(&state.config.session, &token);
    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(LoginResponse {
            user: user_to_response(&user)?,
        }),
    ))
}

/// End the current session. Succeeds whether or not one exists.
pub async fn logout(State(state): State<AppState>, req: Request) -> ApiResult<impl IntoResponse> {
    if let Some(current) = auth::get_user(&req) {
        match state.store.delete_session(current.session_id).await {
            Ok(()) => {
                tracing::info!(user_id = current.user.id, "user logged out");
            }
            // The session can disappear between the middleware lookup and here.
            Err(StoreError::NotFound(_)) => {}
            Err(e) => return Err(e.into()),
        }
    }

    let cookie = clear_session_cookie(&state.config.session);
    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(LogoutResponse { success: true }),
    ))
}

/// Report the authenticated user, or `null` when the request carries no
/// usable session.
pub async fn me(req: Request) -> ApiResult<Json<MeResponse>> {
    let user = auth::get_user(&req)
        .map(|current| user_to_response(&current.user))
        .transpose()?;
    Ok(Json(MeResponse { user }))
}
