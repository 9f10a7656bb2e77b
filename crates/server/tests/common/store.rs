//! Store test utilities.

use grove_store::{SqliteStore, Store, StoreResult};
use std::sync::Arc;
use tempfile::TempDir;

/// A test store wrapper that cleans up on drop.
/// Note: #[allow(dead_code)] because each test file compiles common/ separately.
#[allow(dead_code)]
pub struct TestStore {
    pub store: Arc<dyn Store>,
    _temp_dir: TempDir,
}

#[allow(dead_code)]
impl TestStore {
    /// Create a new test store backed by a file in a temp directory.
    pub async fn new() -> StoreResult<Self> {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
        let db_path = temp_dir.path().join("test.db");
        let store = SqliteStore::new(&db_path, None).await?;

        Ok(Self {
            store: Arc::new(store),
            _temp_dir: temp_dir,
        })
    }

    /// Get a reference to the store.
    pub fn store(&self) -> Arc<dyn Store> {
        self.store.clone()
    }
}
