//! Payment capability backed by the Stripe REST API.

use std::time::Duration;

use async_trait::async_trait;
use domain::Money;
use reqwest::Client;
use serde::Deserialize;

use super::http_client;
use crate::error::FulfillmentError;
use crate::services::{PaymentCapture, PaymentService, RefundOutcome};

const STRIPE_API_BASE: &str = "https://api.stripe.com/v1";

#[derive(Debug, Deserialize)]
struct PaymentIntentResponse {
    id: String,
    #[serde(default)]
    latest_charge: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RefundResponse {
    id: String,
    #[serde(default)]
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    code: Option<String>,
}

/// Form fields of an off-session, immediately confirmed payment intent.
pub fn payment_intent_form(
    amount: Money,
    customer_id: &str,
    payment_method_id: &str,
) -> Vec<(&'static str, String)> {
    vec![
        ("amount", amount.cents().to_string()),
        ("currency", "usd".to_string()),
        ("customer", customer_id.to_string()),
        ("confirm", "true".to_string()),
        ("off_session", "true".to_string()),
        ("payment_method", payment_method_id.to_string()),
    ]
}

/// Extracts the processor's message from an error body.
pub fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|envelope| envelope.error.message.or(envelope.error.code))
        .unwrap_or_else(|| "payment processor error".to_string())
}

/// Stripe-backed payment service.
pub struct StripePaymentClient {
    client: Client,
    base_url: String,
    secret_key: String,
}

impl StripePaymentClient {
    /// Creates a client against the public Stripe API.
    pub fn new(secret_key: impl Into<String>, timeout: Duration) -> Result<Self, FulfillmentError> {
        Self::with_base_url(STRIPE_API_BASE, secret_key, timeout)
    }

    /// Creates a client against another API base, such as a local mock.
    pub fn with_base_url(
        base_url: impl Into<String>,
        secret_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, FulfillmentError> {
        Ok(Self {
            client: http_client(timeout)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            secret_key: secret_key.into(),
        })
    }
}

#[async_trait]
impl PaymentService for StripePaymentClient {
    #[tracing::instrument(skip(self, amount, payment_method_id), fields(amount = %amount))]
    async fn capture(
        &self,
        amount: Money,
        customer_id: &str,
        payment_method_id: &str,
    ) -> Result<PaymentCapture, FulfillmentError> {
        let response = self
            .client
            .post(format!("{}/payment_intents", self.base_url))
            .bearer_auth(&self.secret_key)
            .form(&payment_intent_form(amount, customer_id, payment_method_id))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(FulfillmentError::FailedToCapturePayment(error_message(&body)));
        }

        let intent: PaymentIntentResponse = serde_json::from_str(&body)?;
        Ok(PaymentCapture {
            payment_intent_id: intent.id,
            latest_charge_id: intent.latest_charge,
        })
    }

    #[tracing::instrument(skip(self))]
    async fn refund_charge(&self, charge_id: &str) -> Result<RefundOutcome, FulfillmentError> {
        let response = self
            .client
            .post(format!("{}/refunds", self.base_url))
            .bearer_auth(&self.secret_key)
            .form(&[("charge", charge_id)])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(FulfillmentError::PaymentService(error_message(&body)));
        }

        let refund: RefundResponse = serde_json::from_str(&body)?;
        Ok(RefundOutcome {
            succeeded: refund.status.as_deref() == Some("succeeded"),
            refund_id: refund.id,
        })
    }
}
