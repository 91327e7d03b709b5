//! In-memory visit store.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;

use super::{RequestStore, Visit};
use crate::error::Result;

/// Default number of visits kept in memory.
pub const DEFAULT_MEMORY_CAPACITY: usize = 1000;

/// Keeps the most recent visits in process memory. Used when no database is
/// configured.
///
/// Holds at most `capacity` visits; recording into a full store drops the
/// oldest one.
#[derive(Debug)]
pub struct MemoryStore {
    capacity: usize,
    visits: Mutex<VecDeque<Visit>>,
}

impl MemoryStore {
    /// Create a store holding up to [`DEFAULT_MEMORY_CAPACITY`] visits.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MEMORY_CAPACITY)
    }

    /// Create a store holding up to `capacity` visits (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            visits: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Snapshot of the retained visits, oldest first.
    pub fn visits(&self) -> Vec<Visit> {
        self.visits.lock().iter().cloned().collect()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RequestStore for MemoryStore {
    async fn record_visit(&self, name: &str, remote_addr: &str) -> Result<()> {
        let mut visits = self.visits.lock();
        if visits.len() == self.capacity {
            visits.pop_front();
        }
        visits.push_back(Visit {
            name: name.to_string(),
            remote_addr: remote_addr.to_string(),
        });
        Ok(())
    }
}
