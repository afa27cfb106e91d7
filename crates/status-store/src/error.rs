use thiserror::Error;

use crate::{OrderHandle, OrderStatus};

/// Errors that can occur when interacting with the status store.
#[derive(Debug, Error)]
pub enum StatusStoreError {
    /// A record already exists for the handle.
    #[error("Order record already exists: {0}")]
    AlreadyExists(OrderHandle),

    /// No record exists for the handle.
    #[error("Order record not found: {0}")]
    NotFound(OrderHandle),

    /// The record has reached a terminal status and can no longer change.
    #[error("Order {handle} is already {status}")]
    TerminalState {
        handle: OrderHandle,
        status: OrderStatus,
    },

    /// A stored status column held an unknown value.
    #[error("Invalid stored status: {0}")]
    InvalidStatus(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for status store operations.
pub type Result<T> = std::result::Result<T, StatusStoreError>;
