//! Domain layer for checkout fulfillment.
//!
//! This crate provides:
//! - `Money` and the cart, order and account value types
//! - Cart invariants (duplicate products, cart value ceiling, claimed offers)
//! - The `AccountGateway` trait through which carts, addresses and purchases
//!   are read and mutated, with an in-memory implementation

pub mod account;
pub mod cart;
pub mod error;
pub mod money;
pub mod order;

pub use account::{AcceptedOffer, Account, AccountGateway, InMemoryAccountGateway};
pub use cart::{CART_VALUE_LIMIT, CartError, CartLineItem};
pub use error::{DomainError, Result};
pub use money::Money;
pub use order::{
    Address, DraftLineItem, Order, PaymentTransaction, Purchase, RemoteLineItem,
    RemoteOrderResult, ShippingRate,
};
