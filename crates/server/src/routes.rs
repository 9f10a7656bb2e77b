//! Route configuration.

use crate::auth::session_middleware;
use crate::handlers;
use crate::state::AppState;
use axum::Router;
use axum::http::{HeaderValue, Method, header};
use axum::middleware;
use axum::routing::{get, post};
use grove_core::config::CorsConfig;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    let cors = build_cors_layer(&state.config.cors);

    let router = Router::new()
        // Service metadata (intentionally unauthenticated for probes)
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health_check))
        // Sessions
        .route("/auth/login", post(handlers::login))
        .route("/auth/logout", post(handlers::logout))
        .route("/auth/me", get(handlers::me))
        // Tasks
        .route(
            "/tasks",
            get(handlers::list_tasks).post(handlers::create_task),
        )
        .route(
            "/tasks/{task_id}",
            get(handlers::get_task)
                .patch(handlers::update_task)
                .delete(handlers::delete_task),
        )
        .route("/tasks/{task_id}/complete", post(handlers::complete_task))
        // Subtasks
        .route(
            "/tasks/{task_id}/subtasks",
            get(handlers::list_subtasks).post(handlers::create_subtask),
        )
        .route(
            "/subtasks/{subtask_id}",
            get(handlers::get_subtask)
                .patch(handlers::update_subtask)
                .delete(handlers::delete_subtask),
        )
        .route(
            "/subtasks/{subtask_id}/complete",
            post(handlers::complete_subtask),
        );

    // Middleware layers are applied in reverse order (outermost first).
    // Order of execution: TraceLayer -> CORS -> Session -> Handler
    router
        // Session middleware (resolves the token and sets the CurrentUser extension)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            session_middleware,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Build the CORS layer from configured origins. Credentials are always
/// allowed, so the origin list must stay explicit, never a wildcard.
fn build_cors_layer(config: &CorsConfig) -> CorsLayer {
    let mut origins = Vec::new();
    for origin in &config.allowed_origins {
        match HeaderValue::from_str(origin) {
            Ok(value) => origins.push(value),
            Err(err) => tracing::warn!("ignoring invalid CORS origin '{origin}': {err}"),
        }
    }

    CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}
