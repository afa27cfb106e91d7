//! Order fulfillment orchestration for checkout batches.
//!
//! A submitted batch is admitted in two phases: every order is first
//! persisted as `processing` under a fresh handle, then each order's
//! fulfillment saga runs with bounded concurrency:
//! 1. Resolve the account
//! 2. Capture payment (card payments only)
//! 3. Create and confirm the remote storefront order, refunding the
//!    captured payment if that fails
//! 4. Accept the offer tied to the order
//! 5. Record the terminal status
//!
//! Clients learn outcomes by polling the status store through the `Poller`.

pub mod cache;
pub mod clients;
pub mod error;
pub mod order_fulfillment;
pub mod poller;
pub mod remote_order;
pub mod runner;
pub mod saga;
pub mod services;

pub use cache::{InMemoryOrderLookupCache, LookupResult, OrderLookup, OrderLookupCache};
pub use error::{FulfillmentError, Result};
pub use order_fulfillment::FulfillmentSettings;
pub use poller::Poller;
pub use remote_order::{RemoteOrderProcessor, RemoteOrderRequest};
pub use runner::{AdmittedBatch, BatchReport, BatchRunner, OrderOutcome};
pub use saga::FulfillmentSaga;
pub use services::{
    CommerceCall, CompletedOrder, DraftOrderInput, InMemoryOfferService, InMemoryPaymentService,
    InMemoryRemoteCommerceService, OfferAcceptance, OfferService, PaymentCapture, PaymentService,
    RefundOutcome, RemoteCommerceService, ShippingLine,
};
