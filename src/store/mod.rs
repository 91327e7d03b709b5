//! Storage for the visits recorded by the welcome endpoint.

mod memory;
mod sqlite;

pub use memory::{MemoryStore, DEFAULT_MEMORY_CAPACITY};
pub use sqlite::SqliteStore;

use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

use crate::config::StorageConfig;
use crate::error::Result;

/// A recorded call to the welcome endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Visit {
    pub name: String,
    pub remote_addr: String,
}

/// Trait for visit store implementations.
#[async_trait]
pub trait RequestStore: Send + Sync {
    /// Persist one visit.
    async fn record_visit(&self, name: &str, remote_addr: &str) -> Result<()>;
}

/// Open the store described by `config`: SQLite when a database path is set,
/// otherwise a bounded in-memory store.
pub fn open(config: &StorageConfig) -> Result<Arc<dyn RequestStore>> {
    match &config.database_path {
        Some(path) => Ok(Arc::new(SqliteStore::open(path)?)),
        None => {
            info!(
                capacity = config.memory_capacity,
                "No database configured, keeping recent visits in memory"
            );
            Ok(Arc::new(MemoryStore::with_capacity(config.memory_capacity)))
        }
    }
}
