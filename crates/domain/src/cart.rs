//! Cart line items and the invariants enforced before an item joins a cart.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::money::Money;

/// Ceiling on the summed discounted price of a cart.
pub const CART_VALUE_LIMIT: Money = Money::from_dollars(150);

/// Errors raised by cart invariants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    /// The product is already in the cart.
    #[error("Product already in cart: {0}")]
    ProductAlreadyInCart(String),

    /// Adding the item would push the cart past the value ceiling.
    #[error("Cart value {total} exceeds limit {limit}")]
    CartValueExceedsLimit { total: Money, limit: Money },

    /// The account already accepted the item's offer.
    #[error("Products already claimed for offer {0}")]
    ProductsAlreadyClaimed(String),

    /// No cart item with the given instance id.
    #[error("Cart item not found: {0}")]
    ItemNotFound(String),

    /// A display or discounted price below zero.
    #[error("Negative price for product {0}")]
    NegativePrice(String),
}

impl CartError {
    /// Returns the stable reason code reported to clients.
    pub fn code(&self) -> &'static str {
        match self {
            CartError::ProductAlreadyInCart(_) => "PRODUCT_ALREADY_EXISTS_IN_CART",
            CartError::CartValueExceedsLimit { .. } => "CART_VALUE_EXCEEDS_LIMIT",
            CartError::ProductsAlreadyClaimed(_) => "PRODUCTS_ALREADY_CLAIMED",
            CartError::ItemNotFound(_) => "CART_ITEM_NOT_FOUND",
            CartError::NegativePrice(_) => "INVALID_PRICE",
        }
    }
}

/// A product placed in a shopper's cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineItem {
    /// Product id; unique within a cart.
    pub id: String,

    #[serde(default)]
    pub title: String,

    /// List price in cents.
    pub display_price: Money,

    /// Price the shopper pays, in cents.
    pub discounted_price: Money,

    #[serde(default = "default_quantity")]
    pub quantity: u32,

    /// Selected variant references; the first one identifies the remote variant.
    #[serde(default)]
    pub options: Vec<String>,

    /// The offer this product belongs to.
    pub offer_id: String,

    /// Per-cart instance id, stamped when the item is added.
    #[serde(default)]
    pub uuid: Option<String>,

    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

fn default_quantity() -> u32 {
    1
}

impl CartLineItem {
    /// Creates a line item with quantity 1 and no instance id.
    pub fn new(
        id: impl Into<String>,
        offer_id: impl Into<String>,
        display_price: Money,
        discounted_price: Money,
    ) -> Self {
        Self {
            id: id.into(),
            title: String::new(),
            display_price,
            discounted_price,
            quantity: 1,
            options: Vec::new(),
            offer_id: offer_id.into(),
            uuid: None,
            created_at: Utc::now(),
        }
    }

    /// Sets the selected variant references.
    pub fn with_options(mut self, options: Vec<String>) -> Self {
        self.options = options;
        self
    }

    /// Sets the display title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Returns the remote variant reference, if any option is selected.
    pub fn variant_id(&self) -> Option<&str> {
        self.options.first().map(String::as_str)
    }
}

/// Sums the discounted prices of a set of line items.
pub fn cart_total<'a>(items: impl IntoIterator<Item = &'a CartLineItem>) -> Money {
    items.into_iter().map(|item| item.discounted_price).sum()
}

/// Checks whether `item` may join `cart`.
///
/// Rules are applied in order: non-negative prices, duplicate product id,
/// cart value ceiling, already-claimed offer. A total that overflows counts
/// as over the ceiling.
pub fn validate_new_item(
    cart: &[CartLineItem],
    claimed_offers: &[&str],
    item: &CartLineItem,
) -> Result<(), CartError> {
    if item.display_price.is_negative() || item.discounted_price.is_negative() {
        return Err(CartError::NegativePrice(item.id.clone()));
    }

    if cart.iter().any(|existing| existing.id == item.id) {
        return Err(CartError::ProductAlreadyInCart(item.id.clone()));
    }

    let total = cart_total(cart)
        .checked_add(item.discounted_price)
        .unwrap_or(Money::from_cents(i64::MAX));
    if total > CART_VALUE_LIMIT {
        return Err(CartError::CartValueExceedsLimit {
            total,
            limit: CART_VALUE_LIMIT,
        });
    }

    if claimed_offers.contains(&item.offer_id.as_str()) {
        return Err(CartError::ProductsAlreadyClaimed(item.offer_id.clone()));
    }

    Ok(())
}
