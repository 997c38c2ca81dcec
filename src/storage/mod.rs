//! Storage backends
//!
//! One capability contract, three structurally different implementations.
//! The backend is constructed once at process start by [`StorageFactory`]
//! and handed around as `Arc<dyn Storage>`; nothing in the crate reaches for
//! global storage state.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{AppConfig, StorageKind};
use crate::errors::{Result, ShortenerError};

pub mod database;
pub mod file;
pub mod memory;

pub use models::{DeleteRequest, ShortenedEntry};

pub mod models {
    use serde::{Deserialize, Serialize};

    /// The persisted unit: one short ID mapped to one full URL.
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct ShortenedEntry {
        pub short_id: String,
        pub full_url: String,
        pub user_id: i32,
        pub is_deleted: bool,
    }

    /// One owner-scoped deletion, ephemeral: lives only in the pipeline
    /// buffer and the backend call.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct DeleteRequest {
        pub user_id: i32,
        pub short_id: String,
    }
}

/// Capability contract shared by all backends.
///
/// Operations a backend genuinely cannot support report
/// [`ShortenerError::NotSupported`] instead of faking success.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Look up a short ID. `None` means the ID was never issued; a returned
    /// entry with `is_deleted` set means the link is gone, which callers
    /// must surface differently from not-found.
    async fn resolve(&self, short_id: &str) -> Option<ShortenedEntry>;

    /// Create an entry. Returns [`ShortenerError::Conflict`] without
    /// modifying anything when the URL is already mapped; safe under
    /// concurrent calls with the same URL (exactly one create wins).
    async fn save(&self, user_id: i32, short_id: &str, full_url: &str) -> Result<()>;

    /// Best-effort bulk insert; URLs that are already present are silently
    /// skipped rather than reported as conflicts.
    async fn save_batch(&self, user_id: i32, entries: &HashMap<String, String>) -> Result<()>;

    /// Reverse lookup: which short ID does this URL already have.
    async fn lookup_short_id(&self, full_url: &str) -> Result<String>;

    /// All entries owned by a user, as short ID → full URL.
    async fn list_by_owner(&self, user_id: i32) -> Result<HashMap<String, String>>;

    /// Issue a fresh owner identity.
    async fn allocate_user_id(&self) -> Result<i32>;

    /// Soft-delete every entry whose `(user_id, short_id)` both match;
    /// owner mismatches are left untouched and are not an error.
    async fn mark_deleted(&self, requests: &[DeleteRequest]) -> Result<()>;

    /// Reachability of the backend's external dependency, if it has one.
    async fn check_liveness(&self) -> Result<()>;

    /// Release backend resources; idempotent.
    async fn shutdown(&self);
}

pub struct StorageFactory;

impl StorageFactory {
    pub async fn create(config: &AppConfig) -> Result<Arc<dyn Storage>> {
        match config.storage_kind() {
            StorageKind::Database => {
                let dsn = config.database_dsn.as_deref().unwrap_or_default();
                let storage = database::DatabaseStorage::new(dsn).await?;
                Ok(Arc::new(storage))
            }
            StorageKind::File => {
                let path = config.file_storage_path.as_deref().ok_or_else(|| {
                    ShortenerError::database_config("file storage path is not set")
                })?;
                let storage = file::FileStorage::new(path)?;
                Ok(Arc::new(storage))
            }
            StorageKind::Memory => Ok(Arc::new(memory::MemoryStorage::new())),
        }
    }
}
