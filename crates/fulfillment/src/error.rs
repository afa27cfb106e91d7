//! Fulfillment error types.

use domain::DomainError;
use status_store::StatusStoreError;
use thiserror::Error;

/// Reason recorded for failures that are not part of the saga's own
/// taxonomy (store, network, serialization).
pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";

/// Errors that can occur while fulfilling an order.
#[derive(Debug, Error)]
pub enum FulfillmentError {
    /// The order's account does not exist.
    #[error("No account found: {0}")]
    NoAccountFound(String),

    /// Payment capture failed; nothing was charged.
    #[error("Failed to capture payment: {0}")]
    FailedToCapturePayment(String),

    /// The storefront returned no order at all.
    #[error("Remote order was not created")]
    RemoteOrderNotCreated,

    /// The storefront order came back without a confirmed id or advertiser.
    #[error("Remote order was not confirmed: {0}")]
    RemoteOrderNotConfirmed(String),

    /// The account already accepted the order's offer.
    #[error("Products already claimed for offer {0}")]
    ProductsAlreadyClaimed(String),

    /// The offer system refused or failed the acceptance.
    #[error("Offer acceptance failed: {0}")]
    OfferAcceptance(String),

    /// The order was never admitted by the batch runner.
    #[error("Order has no handle; it was not admitted")]
    NotAdmitted,

    /// Payment service error.
    #[error("Payment service error: {0}")]
    PaymentService(String),

    /// Remote commerce service error.
    #[error("Remote commerce error: {0}")]
    RemoteCommerce(String),

    /// Domain error.
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    /// Status store error.
    #[error("Status store error: {0}")]
    StatusStore(#[from] StatusStoreError),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Transport error talking to an external capability.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl FulfillmentError {
    /// Returns the reason stored as the order's `completionFailure`.
    ///
    /// Offer acceptance failures carry the offer system's own message.
    pub fn reason(&self) -> String {
        match self {
            FulfillmentError::NoAccountFound(_) => "NO_ACCOUNT_FOUND".to_string(),
            FulfillmentError::FailedToCapturePayment(_) => "FAILED_TO_CAPTURE_PAYMENT".to_string(),
            FulfillmentError::RemoteOrderNotCreated => "REMOTE_ORDER_NOT_CREATED".to_string(),
            FulfillmentError::RemoteOrderNotConfirmed(_) => {
                "REMOTE_ORDER_NOT_CONFIRMED".to_string()
            }
            FulfillmentError::ProductsAlreadyClaimed(_) => "PRODUCTS_ALREADY_CLAIMED".to_string(),
            FulfillmentError::OfferAcceptance(message) => message.clone(),
            FulfillmentError::NotAdmitted => "ORDER_NOT_ADMITTED".to_string(),
            _ => INTERNAL_ERROR.to_string(),
        }
    }
}

/// Convenience type alias for fulfillment results.
pub type Result<T> = std::result::Result<T, FulfillmentError>;
