//! Types exchanged with the remote storefront.

use chrono::{DateTime, Utc};
use common::OrderHandle;
use serde::{Deserialize, Serialize};

use super::value_objects::PaymentTransaction;
use crate::money::Money;

/// A normalized line item sent to the storefront when drafting an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftLineItem {
    pub quantity: u32,
    pub variant_id: Option<String>,
    pub price_paid: Money,
}

/// A line item of a confirmed remote order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteLineItem {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub variant_id: Option<String>,
    #[serde(default)]
    pub quantity: u32,
    /// What the shopper paid, matched back from the draft line items.
    #[serde(default)]
    pub price_paid: Option<Money>,
}

/// Outcome of the combined create-then-confirm remote order call.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteOrderResult {
    pub confirmed_order_id: Option<String>,
    pub advertiser_id: Option<String>,
    #[serde(default)]
    pub line_items: Vec<RemoteLineItem>,
}

impl RemoteOrderResult {
    /// A confirmed result carries both the remote order id and the advertiser.
    pub fn is_confirmed(&self) -> bool {
        self.confirmed_order_id.is_some() && self.advertiser_id.is_some()
    }
}

/// A completed purchase stored on the shopper's account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Purchase {
    pub items: Vec<RemoteLineItem>,
    pub order_hash: Option<OrderHandle>,
    /// Remote order id.
    pub order_id: String,
    pub customer_email: Option<String>,
    pub shipping_address: Option<serde_json::Value>,
    pub required_payment: bool,
    pub transaction: Option<PaymentTransaction>,
    pub offer_id: String,
    pub advertiser_id: String,
    pub created_at: DateTime<Utc>,
}

impl Purchase {
    /// Matches either the full remote id or its trailing numeric segment
    /// (`gid://shopify/Order/42` matches `42`).
    pub fn matches_order_id(&self, order_id: &str) -> bool {
        self.order_id == order_id || self.order_id.rsplit('/').next() == Some(order_id)
    }
}
