//! SQLite persistence for the Grove task backend.
//!
//! This crate provides the durable data model:
//! - Users and login sessions
//! - Tasks with filtering and sorting
//! - Subtask forests with cascading deletes
//!
//! Handlers talk to the [`Store`] trait; [`SqliteStore`] is the only
//! implementation. Timestamps are stored as RFC 3339 TEXT columns and all
//! clock reads happen in callers so behavior stays deterministic under test.

pub mod error;
pub mod models;
pub mod repos;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use store::{SqliteStore, Store};

use grove_core::config::StoreConfig;
use std::sync::Arc;

/// Create a store from configuration.
pub async fn from_config(config: &StoreConfig) -> StoreResult<Arc<dyn Store>> {
    tracing::info!(path = %config.path.display(), "opening SQLite store");
    let store = SqliteStore::new(&config.path, config.busy_timeout_secs).await?;
    Ok(Arc::new(store) as Arc<dyn Store>)
}
