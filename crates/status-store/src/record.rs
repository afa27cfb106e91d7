use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::{BatchHandle, OrderHandle, OrderStatus};

/// One order's externally visible processing record.
///
/// `status` and `failure` are authoritative; `payload` holds the latest
/// snapshot of the order the saga persisted alongside them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRecord {
    /// Key of the record.
    pub order_handle: OrderHandle,

    /// The batch the order was admitted with.
    pub batch_handle: BatchHandle,

    /// The account that submitted the order.
    pub account_id: String,

    /// Current processing status.
    pub status: OrderStatus,

    /// Reason code for an unsuccessful order.
    pub failure: Option<String>,

    /// The order snapshot as JSON.
    pub payload: serde_json::Value,

    /// When the order was admitted.
    pub created_at: DateTime<Utc>,

    /// When the record last changed.
    pub updated_at: DateTime<Utc>,
}

impl OrderRecord {
    /// Creates a freshly admitted record in the `processing` state.
    pub fn processing<T: Serialize>(
        order_handle: OrderHandle,
        batch_handle: BatchHandle,
        account_id: impl Into<String>,
        order: &T,
    ) -> Result<Self, serde_json::Error> {
        let now = Utc::now();
        Ok(Self {
            order_handle,
            batch_handle,
            account_id: account_id.into(),
            status: OrderStatus::Processing,
            failure: None,
            payload: serde_json::to_value(order)?,
            created_at: now,
            updated_at: now,
        })
    }

    /// Deserializes the payload into a concrete order type.
    pub fn payload_as<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.payload.clone())
    }

    /// Applies an update in place, stamping `updated_at`.
    pub fn apply(&mut self, update: StatusUpdate) {
        self.status = update.status;
        self.failure = update.failure;
        self.payload = update.payload;
        self.updated_at = Utc::now();
    }
}

/// A change to an existing record.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusUpdate {
    pub status: OrderStatus,
    pub failure: Option<String>,
    pub payload: serde_json::Value,
}

impl StatusUpdate {
    /// Persists a new snapshot without leaving `processing`.
    pub fn snapshot<T: Serialize>(order: &T) -> Result<Self, serde_json::Error> {
        Ok(Self {
            status: OrderStatus::Processing,
            failure: None,
            payload: serde_json::to_value(order)?,
        })
    }

    /// Marks the order `successful`.
    pub fn successful<T: Serialize>(order: &T) -> Result<Self, serde_json::Error> {
        Ok(Self {
            status: OrderStatus::Successful,
            failure: None,
            payload: serde_json::to_value(order)?,
        })
    }

    /// Marks the order `unsuccessful` with a reason.
    pub fn unsuccessful<T: Serialize>(
        order: &T,
        reason: impl Into<String>,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            status: OrderStatus::Unsuccessful,
            failure: Some(reason.into()),
            payload: serde_json::to_value(order)?,
        })
    }
}
