//! External capability traits and in-memory implementations for saga steps.

pub mod commerce;
pub mod offers;
pub mod payment;

pub use commerce::{
    CommerceCall, CompletedOrder, DraftOrderInput, InMemoryRemoteCommerceService,
    RemoteCommerceService, ShippingLine,
};
pub use offers::{InMemoryOfferService, OfferAcceptance, OfferService};
pub use payment::{InMemoryPaymentService, PaymentCapture, PaymentService, RefundOutcome};

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Read-locks in-memory state, recovering from a poisoned lock.
pub(crate) fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

/// Write-locks in-memory state, recovering from a poisoned lock.
pub(crate) fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}
