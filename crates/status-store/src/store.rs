use async_trait::async_trait;

use crate::{BatchHandle, OrderHandle, OrderRecord, Result, StatusUpdate};

/// Core trait for status store implementations.
///
/// Writers touch only their own order's key, so implementations need safe
/// concurrent writes to distinct keys but no cross-key transactions.
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait StatusStore: Send + Sync {
    /// Inserts a newly admitted record.
    ///
    /// Fails with `AlreadyExists` if the handle is taken.
    async fn insert(&self, record: OrderRecord) -> Result<()>;

    /// Applies an update to an existing record and returns the result.
    ///
    /// Fails with `NotFound` for an unknown handle and with `TerminalState`
    /// once the record is `successful` or `unsuccessful`.
    async fn update(&self, handle: &OrderHandle, update: StatusUpdate) -> Result<OrderRecord>;

    /// Looks up a record by order handle.
    async fn get(&self, handle: &OrderHandle) -> Result<Option<OrderRecord>>;

    /// Lists every record admitted under a batch, in admission order.
    async fn list_by_batch(&self, batch: &BatchHandle) -> Result<Vec<OrderRecord>>;
}
