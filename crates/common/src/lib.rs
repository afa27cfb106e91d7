//! Shared types for the checkout fulfillment system.
//!
//! Handles are opaque tokens used to correlate a submission with later
//! polls; `OrderStatus` is the externally visible lifecycle of one order.

pub mod handle;
pub mod status;

pub use handle::{BatchHandle, HANDLE_LENGTH, HandleGenerator, OrderHandle, RandomHandleGenerator};
pub use status::OrderStatus;
