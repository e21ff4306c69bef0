//! # Repocast Store
//!
//! [`SettingsStore`] backends: an in-memory store for tests and ephemeral
//! runs, and an embedded SQLite store for production.

mod defaults;
mod memory;
mod schema;
mod sqlite;

use std::path::Path;
use std::sync::Arc;

use repocast_protocols::{SettingsStore, StoreError};

pub use defaults::{default_job_settings, COLLECT_SCHEDULE, MESSAGE_SCHEDULE};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Open the store named by `backend` (`sqlite` or `memory`).
pub async fn open_store(backend: &str, path: &Path) -> Result<Arc<dyn SettingsStore>, StoreError> {
    match backend {
        "memory" => Ok(Arc::new(MemoryStore::new())),
        "sqlite" => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| StoreError::ConnectionError(e.to_string()))?;
            }
            Ok(Arc::new(SqliteStore::open(path).await?))
        }
        other => Err(StoreError::InvalidInput(format!(
            "unknown storage backend '{}'",
            other
        ))),
    }
}
