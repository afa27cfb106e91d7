//! The per-order fulfillment saga.

use std::sync::Arc;

use common::OrderHandle;
use domain::{Account, AccountGateway, Order, PaymentTransaction, RemoteOrderResult};
use status_store::{StatusStore, StatusUpdate};

use crate::error::{FulfillmentError, Result};
use crate::order_fulfillment::{self, FulfillmentSettings};
use crate::remote_order::{RemoteOrderProcessor, RemoteOrderRequest};
use crate::services::{
    DraftOrderInput, OfferAcceptance, OfferService, PaymentService, RemoteCommerceService,
    ShippingLine,
};

/// Drives one admitted order to a terminal status.
///
/// Steps run in a fixed order: account resolution, payment capture (card
/// payments only), remote order placement with a compensating refund when
/// placement fails, then offer acceptance. Every failure is persisted as
/// `unsuccessful` with a reason before `execute` returns.
pub struct FulfillmentSaga {
    accounts: Arc<dyn AccountGateway>,
    payments: Arc<dyn PaymentService>,
    remote: RemoteOrderProcessor,
    offers: Arc<dyn OfferService>,
    store: Arc<dyn StatusStore>,
    settings: FulfillmentSettings,
}

impl FulfillmentSaga {
    /// Creates a saga with default settings.
    pub fn new(
        accounts: Arc<dyn AccountGateway>,
        payments: Arc<dyn PaymentService>,
        commerce: Arc<dyn RemoteCommerceService>,
        offers: Arc<dyn OfferService>,
        store: Arc<dyn StatusStore>,
    ) -> Self {
        Self {
            remote: RemoteOrderProcessor::new(commerce, accounts.clone()),
            accounts,
            payments,
            offers,
            store,
            settings: FulfillmentSettings::default(),
        }
    }

    /// Replaces the settings sent to external capabilities.
    pub fn with_settings(mut self, settings: FulfillmentSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Executes the saga for an admitted order.
    ///
    /// Returns the confirmed remote order on success. On failure the order
    /// record is already `unsuccessful` when the error is returned.
    #[tracing::instrument(
        skip_all,
        fields(
            saga_type = order_fulfillment::SAGA_TYPE,
            order_handle = ?order.order_handle,
            account_id = %order.account_id,
        )
    )]
    pub async fn execute(&self, mut order: Order) -> Result<RemoteOrderResult> {
        let handle = order
            .order_handle
            .clone()
            .ok_or(FulfillmentError::NotAdmitted)?;

        metrics::counter!("fulfillment_saga_executions_total").increment(1);
        let saga_start = std::time::Instant::now();

        let outcome = match self.run_steps(&handle, &mut order).await {
            Ok(result) => self.finalize(&handle, &mut order).await.map(|()| result),
            Err(err) => Err(err),
        };

        metrics::histogram!("fulfillment_saga_duration_seconds")
            .record(saga_start.elapsed().as_secs_f64());

        match outcome {
            Ok(result) => {
                metrics::counter!("fulfillment_saga_completed").increment(1);
                tracing::info!(order_id = ?result.confirmed_order_id, "order fulfilled");
                Ok(result)
            }
            Err(err) => {
                let reason = err.reason();
                metrics::counter!("fulfillment_saga_failed", "reason" => reason.clone())
                    .increment(1);
                tracing::warn!(%reason, error = %err, "order fulfillment failed");
                self.record_failure(&mut order, &reason).await;
                Err(err)
            }
        }
    }

    /// Marks an order `unsuccessful` in the status store.
    ///
    /// A failing write is logged; the order then stays `processing`.
    pub async fn record_failure(&self, order: &mut Order, reason: &str) {
        let Some(handle) = order.order_handle.clone() else {
            return;
        };
        order.mark_unsuccessful(reason);

        let written = match StatusUpdate::unsuccessful(&*order, reason) {
            Ok(update) => self.store.update(&handle, update).await.map(|_| ()),
            Err(err) => Err(err.into()),
        };
        if let Err(err) = written {
            tracing::error!(order_handle = %handle, error = %err, "failed to record order failure");
        }
    }

    async fn run_steps(
        &self,
        handle: &OrderHandle,
        order: &mut Order,
    ) -> Result<RemoteOrderResult> {
        // 1. Account resolution
        tracing::info!(step = order_fulfillment::STEP_RESOLVE_ACCOUNT, "saga step started");
        let account = self
            .accounts
            .load_account(&order.account_id)
            .await?
            .ok_or_else(|| FulfillmentError::NoAccountFound(order.account_id.clone()))?;

        // 2. Total
        let total = order.total_amount();

        // 3. Payment capture
        if order.requires_capture() {
            tracing::info!(
                step = order_fulfillment::STEP_CAPTURE_PAYMENT,
                total = %total,
                "saga step started"
            );
            let transaction = self.capture(&account, order, total).await?;
            order.attach_payment(transaction);
            self.persist_snapshot(handle, order).await;
        }

        // 4. Remote order, compensated by a refund on failure
        tracing::info!(step = order_fulfillment::STEP_CREATE_REMOTE_ORDER, "saga step started");
        let request = self.remote_order_request(&account, order);
        let result = match self.remote.process_and_complete(&request).await {
            Ok(Some(result)) if result.is_confirmed() => result,
            Ok(Some(_)) => {
                self.compensate(order).await;
                return Err(FulfillmentError::RemoteOrderNotConfirmed(
                    "missing confirmed order id".to_string(),
                ));
            }
            Ok(None) => {
                self.compensate(order).await;
                return Err(FulfillmentError::RemoteOrderNotCreated);
            }
            Err(err) => {
                self.compensate(order).await;
                return Err(FulfillmentError::RemoteOrderNotConfirmed(err.to_string()));
            }
        };

        // 5. Offer acceptance. Not compensated: the remote order exists.
        tracing::info!(step = order_fulfillment::STEP_ACCEPT_OFFER, "saga step started");
        let acceptance = self.offer_acceptance(&account, order);
        self.offers
            .accept_offer(&acceptance)
            .await
            .map_err(|err| match err {
                FulfillmentError::OfferAcceptance(_) => err,
                other => FulfillmentError::OfferAcceptance(other.to_string()),
            })?;

        Ok(result)
    }

    async fn capture(
        &self,
        account: &Account,
        order: &Order,
        total: domain::Money,
    ) -> Result<PaymentTransaction> {
        let customer_id = account.payment_customer_id.as_deref().ok_or_else(|| {
            FulfillmentError::FailedToCapturePayment("account has no payment customer".into())
        })?;
        let payment_method_id = order.payment_method_id.as_deref().ok_or_else(|| {
            FulfillmentError::FailedToCapturePayment("order has no payment method".into())
        })?;

        let capture = self
            .payments
            .capture(total, customer_id, payment_method_id)
            .await
            .map_err(|err| match err {
                FulfillmentError::FailedToCapturePayment(_) => err,
                other => FulfillmentError::FailedToCapturePayment(other.to_string()),
            })?;

        Ok(PaymentTransaction::captured(
            total,
            customer_id,
            payment_method_id,
            capture.payment_intent_id,
            capture.latest_charge_id,
        ))
    }

    /// Refunds the captured payment, if any. Refund failures are logged only.
    async fn compensate(&self, order: &Order) {
        let Some(transaction) = &order.payment_transaction else {
            return;
        };
        let Some(charge_id) = transaction.refundable_charge() else {
            tracing::warn!(
                payment_intent_id = %transaction.payment_intent_id,
                "captured payment has no charge to refund"
            );
            return;
        };

        tracing::info!(
            step = order_fulfillment::STEP_REFUND_PAYMENT,
            charge_id,
            "compensation started"
        );
        metrics::counter!("fulfillment_refunds_attempted_total").increment(1);
        match self.payments.refund_charge(charge_id).await {
            Ok(outcome) if outcome.succeeded => {
                tracing::info!(refund_id = %outcome.refund_id, "payment refunded");
            }
            Ok(outcome) => {
                tracing::warn!(refund_id = %outcome.refund_id, "refund did not succeed");
            }
            Err(err) => {
                tracing::warn!(error = %err, charge_id, "refund failed");
            }
        }
    }

    async fn persist_snapshot(&self, handle: &OrderHandle, order: &Order) {
        let written = match StatusUpdate::snapshot(order) {
            Ok(update) => self.store.update(handle, update).await.map(|_| ()),
            Err(err) => Err(err.into()),
        };
        if let Err(err) = written {
            tracing::warn!(order_handle = %handle, error = %err, "failed to persist order snapshot");
        }
    }

    async fn finalize(&self, handle: &OrderHandle, order: &mut Order) -> Result<()> {
        order.mark_successful();
        self.store
            .update(handle, StatusUpdate::successful(&*order)?)
            .await?;
        Ok(())
    }

    fn contact_phone(&self, account: &Account) -> String {
        account
            .phone
            .clone()
            .unwrap_or_else(|| self.settings.fallback_phone.clone())
    }

    fn remote_order_request(&self, account: &Account, order: &Order) -> RemoteOrderRequest {
        RemoteOrderRequest {
            account_id: order.account_id.clone(),
            order_handle: order.order_handle.clone(),
            offer_id: order.offer_id.clone(),
            advertiser_id: order.advertiser_id.clone(),
            input: DraftOrderInput {
                address: order.shipping_address.clone(),
                email: order.email_address.clone(),
                phone: account.phone.clone(),
                line_items: order.draft_line_items(),
                presentment_currency_code: self.settings.currency_code.clone(),
                source_name: self.settings.source_name.clone(),
                shipping_line: ShippingLine {
                    title: order.shipping_rate.title.clone(),
                    shipping_rate_handle: order.shipping_rate.handle.clone(),
                },
            },
            required_payment: order.payment_required,
            transaction: order.payment_transaction.clone(),
        }
    }

    fn offer_acceptance(&self, account: &Account, order: &Order) -> OfferAcceptance {
        let (first_name, last_name) = order.contact_name();
        OfferAcceptance {
            account_id: order.account_id.clone(),
            offer_id: order.offer_id.clone(),
            email: order.email_address.clone(),
            phone: self.contact_phone(account),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            user_agent: self.settings.user_agent.clone(),
        }
    }
}
