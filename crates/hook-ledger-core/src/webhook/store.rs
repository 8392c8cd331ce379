//! # Persistence Collaborator Seam
//!
//! The pipeline hands each normalized record to an [`EventStore`]. Schema
//! existence, storage, and indexing are the collaborator's concern; a store
//! failure never fails the delivery, the pipeline degrades to
//! "parsed but not persisted".

use super::record::NormalizedRecord;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;

/// Errors during record persistence
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Collection '{name}' not found")]
    MissingCollection { name: String },

    #[error("Store not available: {message}")]
    Unavailable { message: String },

    #[error("Store operation failed: {message}")]
    OperationFailed { message: String },
}

/// Interface for persisting normalized event records
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Persist one normalized record into its collection
    async fn persist(&self, record: NormalizedRecord) -> Result<(), StoreError>;
}

/// In-memory event store, keyed by collection name
///
/// Backs the tests; production deployments inject a real storage adapter.
#[derive(Debug, Default)]
pub struct InMemoryEventStore {
    records: Mutex<HashMap<String, Vec<NormalizedRecord>>>,
}

impl InMemoryEventStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all records persisted into a collection
    pub async fn records(&self, collection: &str) -> Vec<NormalizedRecord> {
        self.records
            .lock()
            .await
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    /// Total number of persisted records across all collections
    pub async fn len(&self) -> usize {
        self.records.lock().await.values().map(Vec::len).sum()
    }

    /// Whether nothing has been persisted yet
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn persist(&self, record: NormalizedRecord) -> Result<(), StoreError> {
        let mut records = self.records.lock().await;
        records
            .entry(record.collection.to_string())
            .or_default()
            .push(record);
        Ok(())
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
