//! Read-only status lookups.

use std::sync::Arc;

use common::{BatchHandle, OrderHandle};
use status_store::{OrderRecord, StatusStore};

use crate::error::Result;

/// Reads order status from the status store.
///
/// Never waits on in-flight sagas: a poll during processing simply
/// observes `processing`.
#[derive(Clone)]
pub struct Poller {
    store: Arc<dyn StatusStore>,
}

impl Poller {
    pub fn new(store: Arc<dyn StatusStore>) -> Self {
        Self { store }
    }

    /// Returns the record stored under an order handle.
    pub async fn poll(&self, handle: &OrderHandle) -> Result<Option<OrderRecord>> {
        Ok(self.store.get(handle).await?)
    }

    /// Returns every record admitted under a batch, in admission order.
    pub async fn poll_batch(&self, batch: &BatchHandle) -> Result<Vec<OrderRecord>> {
        Ok(self.store.list_by_batch(batch).await?)
    }

    /// Resolves a handle that may name either an order or a batch.
    ///
    /// An order handle wins; otherwise the first order of the batch is
    /// returned.
    #[tracing::instrument(skip(self))]
    pub async fn resolve(&self, handle: &str) -> Result<Option<OrderRecord>> {
        if let Some(record) = self.poll(&OrderHandle::new(handle)).await? {
            return Ok(Some(record));
        }
        Ok(self
            .poll_batch(&BatchHandle::new(handle))
            .await?
            .into_iter()
            .next())
    }
}
