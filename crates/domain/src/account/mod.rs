//! Shopper accounts and the gateway that owns them.

mod gateway;
mod memory;

pub use gateway::AccountGateway;
pub use memory::InMemoryAccountGateway;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cart::{CartError, CartLineItem, validate_new_item};
use crate::order::{Address, Purchase};

/// An offer the account has accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptedOffer {
    pub offer_id: String,
    pub accepted_at: DateTime<Utc>,
}

/// A shopper account snapshot.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    /// Customer reference at the payment processor.
    #[serde(default)]
    pub payment_customer_id: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub cart: Vec<CartLineItem>,
    #[serde(default)]
    pub accepted_offers: Vec<AcceptedOffer>,
    #[serde(default)]
    pub addresses: Vec<Address>,
    #[serde(default)]
    pub purchases: Vec<Purchase>,
}

impl Account {
    /// Creates an empty account.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Sets the payment processor customer reference.
    pub fn with_payment_customer(mut self, customer_id: impl Into<String>) -> Self {
        self.payment_customer_id = Some(customer_id.into());
        self
    }

    /// Sets the contact phone.
    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    /// Returns true if the account already accepted the offer.
    pub fn has_claimed_offer(&self, offer_id: &str) -> bool {
        self.accepted_offers.iter().any(|o| o.offer_id == offer_id)
    }

    /// Validates and appends a line item whose instance id is already stamped.
    pub fn add_to_cart(&mut self, item: CartLineItem) -> Result<(), CartError> {
        let claimed: Vec<&str> = self
            .accepted_offers
            .iter()
            .map(|o| o.offer_id.as_str())
            .collect();
        validate_new_item(&self.cart, &claimed, &item)?;
        self.cart.push(item);
        Ok(())
    }

    /// Removes the line item with the given instance id.
    pub fn remove_from_cart(&mut self, item_uuid: &str) -> Result<(), CartError> {
        let before = self.cart.len();
        self.cart
            .retain(|item| item.uuid.as_deref() != Some(item_uuid));
        if self.cart.len() == before {
            return Err(CartError::ItemNotFound(item_uuid.to_string()));
        }
        Ok(())
    }

    /// Records an accepted offer once.
    pub fn accept_offer(&mut self, offer_id: &str) {
        if !self.has_claimed_offer(offer_id) {
            self.accepted_offers.push(AcceptedOffer {
                offer_id: offer_id.to_string(),
                accepted_at: Utc::now(),
            });
        }
    }

    /// Finds a purchase by remote order id.
    pub fn find_purchase(&self, order_id: &str) -> Option<&Purchase> {
        self.purchases.iter().find(|p| p.matches_order_id(order_id))
    }
}
