//! The order: one unit of work driven through the fulfillment saga.

mod remote;
mod value_objects;

pub use remote::{DraftLineItem, Purchase, RemoteLineItem, RemoteOrderResult};
pub use value_objects::{Address, CHARGE_NOT_AVAILABLE, PaymentTransaction, ShippingRate};

use chrono::{DateTime, Utc};
use common::{BatchHandle, OrderHandle, OrderStatus};
use serde::{Deserialize, Serialize};

use crate::cart::{CartLineItem, cart_total};
use crate::money::Money;

/// A submitted checkout order.
///
/// Clients supply the cart, shipping and payment fields; the handles,
/// account, status and transaction are owned by the batch runner and the
/// saga and are reset on admission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub cart: Vec<CartLineItem>,
    pub email_address: String,
    #[serde(default)]
    pub payment_required: bool,
    #[serde(default)]
    pub payment_is_apple_pay: bool,
    #[serde(default)]
    pub payment_method_id: Option<String>,
    #[serde(default)]
    pub payment_transaction: Option<PaymentTransaction>,
    pub shipping_address: Address,
    pub shipping_rate: ShippingRate,
    #[serde(default)]
    pub completion_status: OrderStatus,
    #[serde(default)]
    pub completion_failure: Option<String>,
    pub offer_id: String,
    pub advertiser_id: String,
    #[serde(default)]
    pub account_id: String,
    #[serde(default)]
    pub order_handle: Option<OrderHandle>,
    #[serde(default)]
    pub incoming_order_hash: Option<BatchHandle>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub last_updated: DateTime<Utc>,
}

impl Order {
    /// Returns true when the saga must capture a card payment.
    pub fn requires_capture(&self) -> bool {
        self.payment_required && !self.payment_is_apple_pay
    }

    /// Sum of the discounted prices of the cart.
    pub fn total_amount(&self) -> Money {
        cart_total(&self.cart)
    }

    /// Normalizes the cart into storefront draft line items.
    pub fn draft_line_items(&self) -> Vec<DraftLineItem> {
        self.cart
            .iter()
            .map(|item| DraftLineItem {
                quantity: 1,
                variant_id: item.variant_id().map(str::to_string),
                price_paid: item.discounted_price,
            })
            .collect()
    }

    /// Stamps admission fields and clears anything a client may have sent
    /// for saga-owned fields.
    pub fn admit(&mut self, account_id: &str, handle: OrderHandle, batch: BatchHandle) {
        let now = Utc::now();
        self.account_id = account_id.to_string();
        self.order_handle = Some(handle);
        self.incoming_order_hash = Some(batch);
        self.payment_transaction = None;
        self.completion_status = OrderStatus::Processing;
        self.completion_failure = None;
        self.created_at = now;
        self.last_updated = now;
    }

    /// Attaches the transaction of a successful capture.
    pub fn attach_payment(&mut self, transaction: PaymentTransaction) {
        debug_assert!(self.requires_capture());
        self.payment_transaction = Some(transaction);
        self.last_updated = Utc::now();
    }

    /// Moves the order to `successful`.
    pub fn mark_successful(&mut self) {
        self.completion_status = OrderStatus::Successful;
        self.completion_failure = None;
        self.last_updated = Utc::now();
    }

    /// Moves the order to `unsuccessful` with a reason.
    pub fn mark_unsuccessful(&mut self, reason: impl Into<String>) {
        self.completion_status = OrderStatus::Unsuccessful;
        self.completion_failure = Some(reason.into());
        self.last_updated = Utc::now();
    }

    /// Splits the shipping name into (first, last) for contact payloads.
    pub fn contact_name(&self) -> (&str, &str) {
        (
            &self.shipping_address.first_name,
            &self.shipping_address.last_name,
        )
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn sample() -> Order {
        serde_json::from_value(json!({
            "cart": [
                {
                    "id": "compression-t-shirt",
                    "title": "Compression T-Shirt",
                    "displayPrice": 2999,
                    "discountedPrice": 600,
                    "options": ["gid://shopify/ProductVariant/47263107088688"],
                    "offerId": "offer-1",
                    "uuid": "76GEzXH8nS"
                },
                {
                    "id": "free-product",
                    "displayPrice": 100,
                    "discountedPrice": 0,
                    "options": ["gid://shopify/ProductVariant/47390712004912"],
                    "offerId": "offer-1"
                }
            ],
            "emailAddress": "shopper@example.com",
            "paymentRequired": true,
            "paymentIsApplePay": false,
            "paymentMethodId": "pm_1",
            "paymentTransaction": {
                "amountPaid": 1,
                "customerId": "forged",
                "paymentMethodId": "pm",
                "paymentIntentId": "pi",
                "latestChargeId": "ch",
                "timestamp": "2024-01-15T00:00:00Z"
            },
            "shippingAddress": {
                "firstName": "Ada",
                "lastName": "Lovelace",
                "address1": "2501 N Lincoln St",
                "city": "Arlington",
                "provinceCode": "VA",
                "countryCode": "US",
                "zip": "22207"
            },
            "shippingRate": { "handle": "rate-1", "title": "Economy" },
            "completionStatus": "successful",
            "offerId": "offer-1",
            "advertiserId": "adv-1"
        }))
        .unwrap()
    }

    #[test]
    fn total_is_sum_of_discounted_prices() {
        assert_eq!(sample().total_amount(), Money::from_cents(600));
    }

    #[test]
    fn requires_capture_only_for_card_payments() {
        let mut order = sample();
        assert!(order.requires_capture());
        order.payment_is_apple_pay = true;
        assert!(!order.requires_capture());
        order.payment_is_apple_pay = false;
        order.payment_required = false;
        assert!(!order.requires_capture());
    }

    #[test]
    fn draft_line_items_are_normalized() {
        let items = sample().draft_line_items();
        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|i| i.quantity == 1));
        assert_eq!(
            items[0].variant_id.as_deref(),
            Some("gid://shopify/ProductVariant/47263107088688")
        );
        assert_eq!(items[0].price_paid, Money::from_cents(600));
        assert_eq!(items[1].price_paid, Money::zero());
    }

    #[test]
    fn admit_resets_saga_owned_fields() {
        let mut order = sample();
        order.admit(
            "account-1",
            OrderHandle::new("order-1"),
            BatchHandle::new("batch-1"),
        );

        assert_eq!(order.account_id, "account-1");
        assert_eq!(order.order_handle, Some(OrderHandle::new("order-1")));
        assert_eq!(order.incoming_order_hash, Some(BatchHandle::new("batch-1")));
        assert!(order.payment_transaction.is_none());
        assert_eq!(order.completion_status, OrderStatus::Processing);
    }

    #[test]
    fn mark_unsuccessful_records_reason() {
        let mut order = sample();
        order.mark_unsuccessful("FAILED_TO_CAPTURE_PAYMENT");
        assert_eq!(order.completion_status, OrderStatus::Unsuccessful);
        assert_eq!(
            order.completion_failure.as_deref(),
            Some("FAILED_TO_CAPTURE_PAYMENT")
        );
    }

    #[test]
    fn contact_name_comes_from_shipping_address() {
        assert_eq!(sample().contact_name(), ("Ada", "Lovelace"));
    }
}
