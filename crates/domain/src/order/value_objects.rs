//! Value objects carried by an order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

/// Reference stored when the payment processor reports no charge id.
pub const CHARGE_NOT_AVAILABLE: &str = "not_available";

/// A postal address.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(default)]
    pub address_id: Option<String>,
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub address1: String,
    #[serde(default)]
    pub address2: Option<String>,
    pub city: String,
    pub province_code: String,
    pub country_code: String,
    pub zip: String,
}

/// The shipping option chosen for an order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingRate {
    /// Remote storefront shipping rate handle.
    pub handle: String,
    #[serde(default)]
    pub offer_id: String,
    #[serde(default)]
    pub offer_name: String,
    #[serde(default)]
    pub amount: String,
    pub title: String,
}

/// Record of a captured payment.
///
/// Created only after a successful capture and never modified afterwards;
/// a compensating refund targets `latest_charge_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentTransaction {
    pub amount_paid: Money,
    pub customer_id: String,
    pub payment_method_id: String,
    pub payment_intent_id: String,
    pub latest_charge_id: String,
    pub timestamp: DateTime<Utc>,
}

impl PaymentTransaction {
    /// Builds a transaction from a capture, stamped now.
    pub fn captured(
        amount_paid: Money,
        customer_id: impl Into<String>,
        payment_method_id: impl Into<String>,
        payment_intent_id: impl Into<String>,
        latest_charge_id: Option<String>,
    ) -> Self {
        Self {
            amount_paid,
            customer_id: customer_id.into(),
            payment_method_id: payment_method_id.into(),
            payment_intent_id: payment_intent_id.into(),
            latest_charge_id: latest_charge_id.unwrap_or_else(|| CHARGE_NOT_AVAILABLE.to_string()),
            timestamp: Utc::now(),
        }
    }

    /// Returns the charge to refund, if the processor reported one.
    pub fn refundable_charge(&self) -> Option<&str> {
        (self.latest_charge_id != CHARGE_NOT_AVAILABLE).then_some(self.latest_charge_id.as_str())
    }
}
