//! Order fulfillment saga constants and settings.

/// The saga type identifier for order fulfillment.
pub const SAGA_TYPE: &str = "OrderFulfillment";

/// Step name: Load the submitting account.
pub const STEP_RESOLVE_ACCOUNT: &str = "resolve_account";

/// Step name: Capture payment for the order.
pub const STEP_CAPTURE_PAYMENT: &str = "capture_payment";

/// Step name: Create and confirm the remote storefront order.
pub const STEP_CREATE_REMOTE_ORDER: &str = "create_remote_order";

/// Step name: Refund a captured payment after a remote order failure.
pub const STEP_REFUND_PAYMENT: &str = "refund_payment";

/// Step name: Accept the offer tied to the order.
pub const STEP_ACCEPT_OFFER: &str = "accept_offer";

/// Fixed values sent to external capabilities on every order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FulfillmentSettings {
    /// Presentment currency of remote orders.
    pub currency_code: String,
    /// Source tag attached to remote orders.
    pub source_name: String,
    /// Contact phone used when the account has none on file.
    pub fallback_phone: String,
    /// Device context reported with offer acceptances.
    pub user_agent: String,
}

impl Default for FulfillmentSettings {
    fn default() -> Self {
        Self {
            currency_code: "USD".to_string(),
            source_name: "CHECKOUT".to_string(),
            fallback_phone: String::new(),
            user_agent: concat!("checkout-fulfillment/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}
