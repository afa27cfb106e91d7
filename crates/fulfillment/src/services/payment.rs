//! Payment service trait and in-memory implementation.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use domain::Money;

use super::{read, write};
use crate::error::FulfillmentError;

/// Result of a successful off-session capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentCapture {
    /// The payment intent created by the processor.
    pub payment_intent_id: String,
    /// The charge backing the intent, when the processor reports one.
    pub latest_charge_id: Option<String>,
}

/// Result of a refund request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefundOutcome {
    pub refund_id: String,
    /// True when the processor reports the refund as succeeded.
    pub succeeded: bool,
}

/// Trait for payment processing operations.
#[async_trait]
pub trait PaymentService: Send + Sync {
    /// Captures `amount` from a saved payment method of a customer.
    async fn capture(
        &self,
        amount: Money,
        customer_id: &str,
        payment_method_id: &str,
    ) -> Result<PaymentCapture, FulfillmentError>;

    /// Refunds a previously captured charge in full.
    async fn refund_charge(&self, charge_id: &str) -> Result<RefundOutcome, FulfillmentError>;
}

#[derive(Debug, Default)]
struct InMemoryPaymentState {
    captures: Vec<(String, Money)>,
    refunded_charges: Vec<String>,
    next_id: u32,
    fail_on_capture: bool,
    fail_on_refund: bool,
    omit_charge_id: bool,
}

/// In-memory payment service for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPaymentService {
    state: Arc<RwLock<InMemoryPaymentState>>,
}

impl InMemoryPaymentService {
    /// Creates a new in-memory payment service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the service to decline captures.
    pub fn set_fail_on_capture(&self, fail: bool) {
        write(&self.state).fail_on_capture = fail;
    }

    /// Configures the service to error on refunds.
    pub fn set_fail_on_refund(&self, fail: bool) {
        write(&self.state).fail_on_refund = fail;
    }

    /// Configures captures to come back without a charge id.
    pub fn set_omit_charge_id(&self, omit: bool) {
        write(&self.state).omit_charge_id = omit;
    }

    /// Returns the number of successful captures.
    pub fn capture_count(&self) -> usize {
        read(&self.state).captures.len()
    }

    /// Returns the amounts captured, in order.
    pub fn captured_amounts(&self) -> Vec<Money> {
        read(&self.state).captures.iter().map(|(_, m)| *m).collect()
    }

    /// Returns the charge ids refunded, in order.
    pub fn refunded_charges(&self) -> Vec<String> {
        read(&self.state).refunded_charges.clone()
    }
}

#[async_trait]
impl PaymentService for InMemoryPaymentService {
    async fn capture(
        &self,
        amount: Money,
        _customer_id: &str,
        _payment_method_id: &str,
    ) -> Result<PaymentCapture, FulfillmentError> {
        let mut state = write(&self.state);

        if state.fail_on_capture {
            return Err(FulfillmentError::FailedToCapturePayment(
                "Card declined".to_string(),
            ));
        }

        state.next_id += 1;
        let payment_intent_id = format!("PI-{:04}", state.next_id);
        let charge_id = format!("CH-{:04}", state.next_id);
        state.captures.push((charge_id.clone(), amount));

        Ok(PaymentCapture {
            payment_intent_id,
            latest_charge_id: (!state.omit_charge_id).then_some(charge_id),
        })
    }

    async fn refund_charge(&self, charge_id: &str) -> Result<RefundOutcome, FulfillmentError> {
        let mut state = write(&self.state);

        if state.fail_on_refund {
            return Err(FulfillmentError::PaymentService(
                "Refund rejected".to_string(),
            ));
        }

        state.refunded_charges.push(charge_id.to_string());
        Ok(RefundOutcome {
            refund_id: format!("RE-{:04}", state.refunded_charges.len()),
            succeeded: true,
        })
    }
}
