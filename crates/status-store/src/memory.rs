use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    BatchHandle, OrderHandle, OrderRecord, Result, StatusStoreError, StatusUpdate,
    store::StatusStore,
};

#[derive(Debug, Default)]
struct Records {
    by_handle: HashMap<OrderHandle, OrderRecord>,
    by_batch: HashMap<BatchHandle, Vec<OrderHandle>>,
}

/// In-memory status store implementation.
///
/// Provides the same interface as the PostgreSQL implementation; used by
/// tests and by the server when no database is configured.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStatusStore {
    records: Arc<RwLock<Records>>,
}

impl InMemoryStatusStore {
    /// Creates a new empty in-memory status store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of records stored.
    pub async fn record_count(&self) -> usize {
        self.records.read().await.by_handle.len()
    }

    /// Clears all records.
    pub async fn clear(&self) {
        let mut records = self.records.write().await;
        records.by_handle.clear();
        records.by_batch.clear();
    }
}

#[async_trait]
impl StatusStore for InMemoryStatusStore {
    async fn insert(&self, record: OrderRecord) -> Result<()> {
        let mut records = self.records.write().await;

        if records.by_handle.contains_key(&record.order_handle) {
            return Err(StatusStoreError::AlreadyExists(record.order_handle));
        }

        records
            .by_batch
            .entry(record.batch_handle.clone())
            .or_default()
            .push(record.order_handle.clone());
        records
            .by_handle
            .insert(record.order_handle.clone(), record);

        metrics::counter!("status_store_writes_total", "op" => "insert").increment(1);
        Ok(())
    }

    async fn update(&self, handle: &OrderHandle, update: StatusUpdate) -> Result<OrderRecord> {
        let mut records = self.records.write().await;

        let record = records
            .by_handle
            .get_mut(handle)
            .ok_or_else(|| StatusStoreError::NotFound(handle.clone()))?;

        if !record.status.can_transition_to(update.status) {
            return Err(StatusStoreError::TerminalState {
                handle: handle.clone(),
                status: record.status,
            });
        }

        record.apply(update);
        metrics::counter!("status_store_writes_total", "op" => "update").increment(1);
        Ok(record.clone())
    }

    async fn get(&self, handle: &OrderHandle) -> Result<Option<OrderRecord>> {
        Ok(self.records.read().await.by_handle.get(handle).cloned())
    }

    async fn list_by_batch(&self, batch: &BatchHandle) -> Result<Vec<OrderRecord>> {
        let records = self.records.read().await;
        Ok(records
            .by_batch
            .get(batch)
            .map(|handles| {
                handles
                    .iter()
                    .filter_map(|h| records.by_handle.get(h).cloned())
                    .collect()
            })
            .unwrap_or_default())
    }
}
