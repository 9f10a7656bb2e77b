//! Core domain types and shared logic for the Grove task backend.
//!
//! This crate defines the vocabulary used across all other crates:
//! - Field validation for usernames, titles, and numeric fields
//! - Subtask forest walks (cycle guards, subtree collection)
//! - Task listing filters and sort orders
//! - Application configuration

pub mod config;
pub mod error;
pub mod forest;
pub mod task_query;
pub mod validate;

pub use config::AppConfig;
pub use error::{Error, Result};
pub use forest::SubtaskForest;
pub use task_query::{TaskFilter, TaskSortBy};

/// Maximum accepted username length, in characters.
pub const MAX_USERNAME_LEN: usize = 150;

/// Maximum accepted title length for tasks and subtasks, in characters.
pub const MAX_TITLE_LEN: usize = 255;

/// Priority assigned to tasks created without an explicit one.
pub const DEFAULT_TASK_PRIORITY: i64 = 3;

/// Estimate assigned to tasks created without an explicit one, in minutes.
pub const DEFAULT_ESTIMATED_MINUTES: i64 = 0;
