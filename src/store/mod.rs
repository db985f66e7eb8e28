//! Session persistence
//!
//! The store is a document collection keyed by session id and queried by
//! user id in creation order. It is constructed once at startup and handed to
//! the HTTP layer; `/predict` treats write failures as log-only.

mod memory;
mod sqlite;

pub use memory::MemorySessionStore;
pub use sqlite::SqliteSessionStore;

use crate::config::{StoreBackend, StoreConfig};
use crate::error::StoreError;
use crate::session::SessionRecord;
use std::sync::Arc;

#[async_trait::async_trait]
pub trait SessionStore: Send + Sync {
    async fn create(&self, record: &SessionRecord) -> Result<(), StoreError>;

    /// All sessions for `user_id`, ascending by `created_at`
    async fn query_by_user(&self, user_id: &str) -> Result<Vec<SessionRecord>, StoreError>;
}

/// Open the backend selected in configuration
pub fn open(config: &StoreConfig) -> Result<Arc<dyn SessionStore>, StoreError> {
    match config.backend {
        StoreBackend::Memory => Ok(Arc::new(MemorySessionStore::new())),
        StoreBackend::Sqlite => Ok(Arc::new(SqliteSessionStore::open(&config.path)?)),
    }
}
