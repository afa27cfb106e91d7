//! Durable key-value store mapping order handles to processing outcomes.
//!
//! The store is the single source of truth for externally visible order
//! status: sagas write their own order's record, pollers only read.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod record;
pub mod store;

pub use common::{BatchHandle, OrderHandle, OrderStatus};
pub use error::{Result, StatusStoreError};
pub use memory::InMemoryStatusStore;
pub use postgres::PostgresStatusStore;
pub use record::{OrderRecord, StatusUpdate};
pub use store::StatusStore;
