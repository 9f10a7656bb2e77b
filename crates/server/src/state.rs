//! Application state shared across handlers.

use grove_core::config::AppConfig;
use grove_store::Store;
use std::sync::Arc;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Persistent store.
    pub store: Arc<dyn Store>,
}

impl AppState {
    /// Create a new application state.
    pub fn new(config: AppConfig, store: Arc<dyn Store>) -> Self {
        Self {
            config: Arc::new(config),
            store,
        }
    }
}
