//! HTTP API server for the grove task manager.
//!
//! This crate provides the HTTP surface:
//! - Session login/logout and whoami
//! - Task CRUD with filtering, sorting, and completion cascade
//! - Subtask trees with re-parenting and subtree completion
//! - Health endpoints

pub mod auth;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use auth::TraceId;
pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
