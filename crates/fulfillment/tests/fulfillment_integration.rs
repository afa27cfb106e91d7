//! Integration tests for batch admission, the fulfillment saga and polling.

use std::sync::Arc;
use std::time::Duration;

use common::{BatchHandle, OrderHandle, OrderStatus};
use domain::{
    Account, AccountGateway, Address, CartError, CartLineItem, DomainError,
    InMemoryAccountGateway, Money, Order, ShippingRate,
};
use fulfillment::{
    BatchRunner, CommerceCall, FulfillmentSaga, InMemoryOfferService, InMemoryPaymentService,
    InMemoryRemoteCommerceService, Poller,
};
use status_store::{InMemoryStatusStore, StatusStore, StatusStoreError, StatusUpdate};

const ACCOUNT: &str = "account-1";

struct TestHarness {
    runner: BatchRunner,
    poller: Poller,
    store: Arc<InMemoryStatusStore>,
    accounts: Arc<InMemoryAccountGateway>,
    payments: Arc<InMemoryPaymentService>,
    commerce: Arc<InMemoryRemoteCommerceService>,
    offers: Arc<InMemoryOfferService>,
}

impl TestHarness {
    async fn new() -> Self {
        let store = Arc::new(InMemoryStatusStore::new());
        let accounts = Arc::new(InMemoryAccountGateway::new());
        accounts
            .insert_account(
                Account::new(ACCOUNT)
                    .with_payment_customer("cus_1")
                    .with_phone("5550100"),
            )
            .await;
        let payments = Arc::new(InMemoryPaymentService::new());
        let commerce = Arc::new(InMemoryRemoteCommerceService::new());
        let offers = Arc::new(InMemoryOfferService::with_accounts(accounts.clone()));

        let saga = FulfillmentSaga::new(
            accounts.clone(),
            payments.clone(),
            commerce.clone(),
            offers.clone(),
            store.clone(),
        );

        Self {
            runner: BatchRunner::new(store.clone(), Arc::new(saga)),
            poller: Poller::new(store.clone()),
            store,
            accounts,
            payments,
            commerce,
            offers,
        }
    }

    /// Adds one product to the account cart and builds an order from it.
    async fn order(&self, email: &str, offer_id: &str, payment_required: bool) -> Order {
        let item = self
            .accounts
            .add_line_item(
                ACCOUNT,
                CartLineItem::new(
                    format!("product-{offer_id}"),
                    offer_id,
                    Money::from_cents(2999),
                    Money::from_cents(600),
                )
                .with_options(vec![format!("gid://shopify/ProductVariant/{offer_id}")]),
            )
            .await
            .unwrap();

        Order {
            cart: vec![item],
            email_address: email.to_string(),
            payment_required,
            payment_is_apple_pay: false,
            payment_method_id: Some("pm_1".to_string()),
            payment_transaction: None,
            shipping_address: Address {
                first_name: "Ada".to_string(),
                last_name: "Lovelace".to_string(),
                address1: "2501 N Lincoln St".to_string(),
                city: "Arlington".to_string(),
                province_code: "VA".to_string(),
                country_code: "US".to_string(),
                zip: "22207".to_string(),
                ..Address::default()
            },
            shipping_rate: ShippingRate {
                handle: "rate-1".to_string(),
                title: "Economy".to_string(),
                ..ShippingRate::default()
            },
            completion_status: OrderStatus::Processing,
            completion_failure: None,
            offer_id: offer_id.to_string(),
            advertiser_id: "adv-1".to_string(),
            account_id: String::new(),
            order_handle: None,
            incoming_order_hash: None,
            created_at: chrono::Utc::now(),
            last_updated: chrono::Utc::now(),
        }
    }

    async fn stored_order(&self, handle: &OrderHandle) -> Order {
        self.store
            .get(handle)
            .await
            .unwrap()
            .unwrap()
            .payload_as()
            .unwrap()
    }
}

#[tokio::test]
async fn test_unpaid_order_is_fulfilled_and_recorded_as_purchase() {
    let h = TestHarness::new().await;
    let order = h.order("a@example.com", "offer-1", false).await;

    let report = h
        .runner
        .submit_and_wait(vec![Some(order)], ACCOUNT, 4)
        .await
        .unwrap();

    assert_eq!(report.successful(), 1);
    let outcome = &report.outcomes[0];
    let remote_id = outcome
        .result
        .as_ref()
        .and_then(|r| r.confirmed_order_id.clone())
        .unwrap();

    let record = h.poller.poll(&outcome.order_handle).await.unwrap().unwrap();
    assert_eq!(record.status, OrderStatus::Successful);
    assert!(record.failure.is_none());

    let purchases = h.accounts.list_purchases(ACCOUNT).await.unwrap();
    assert_eq!(purchases.len(), 1);
    assert_eq!(purchases[0].order_id, remote_id);
    assert_eq!(purchases[0].order_hash, Some(outcome.order_handle.clone()));
    assert!(h.accounts.get_cart(ACCOUNT).await.unwrap().is_empty());

    let account = h.accounts.load_account(ACCOUNT).await.unwrap().unwrap();
    assert!(account.has_claimed_offer("offer-1"));
    assert_eq!(h.payments.capture_count(), 0);
    assert!(h.stored_order(&outcome.order_handle).await.payment_transaction.is_none());
}

#[tokio::test]
async fn test_paid_order_captures_discounted_total() {
    let h = TestHarness::new().await;
    let order = h.order("a@example.com", "offer-1", true).await;

    let report = h
        .runner
        .submit_and_wait(vec![Some(order)], ACCOUNT, 4)
        .await
        .unwrap();

    assert_eq!(report.successful(), 1);
    assert_eq!(h.payments.captured_amounts(), vec![Money::from_cents(600)]);

    let stored = h.stored_order(&report.outcomes[0].order_handle).await;
    let tx = stored.payment_transaction.unwrap();
    assert_eq!(tx.customer_id, "cus_1");
    assert_eq!(tx.payment_method_id, "pm_1");
    assert_eq!(tx.latest_charge_id, "CH-0001");
    assert!(h.payments.refunded_charges().is_empty());

    let acceptance = &h.offers.acceptances()[0];
    assert_eq!(acceptance.phone, "5550100");
    assert_eq!(acceptance.first_name, "Ada");
}

#[tokio::test]
async fn test_apple_pay_order_is_not_captured() {
    let h = TestHarness::new().await;
    let mut order = h.order("a@example.com", "offer-1", true).await;
    order.payment_is_apple_pay = true;

    let report = h
        .runner
        .submit_and_wait(vec![Some(order)], ACCOUNT, 4)
        .await
        .unwrap();

    assert_eq!(report.successful(), 1);
    assert_eq!(h.payments.capture_count(), 0);
    assert!(
        h.stored_order(&report.outcomes[0].order_handle)
            .await
            .payment_transaction
            .is_none()
    );
}

#[tokio::test]
async fn test_unconfirmed_remote_order_refunds_exactly_once() {
    let h = TestHarness::new().await;
    h.commerce.set_decline_completion(true);
    let order = h.order("a@example.com", "offer-1", true).await;

    let report = h
        .runner
        .submit_and_wait(vec![Some(order)], ACCOUNT, 4)
        .await
        .unwrap();

    let outcome = &report.outcomes[0];
    assert_eq!(outcome.status, OrderStatus::Unsuccessful);
    assert_eq!(outcome.failure.as_deref(), Some("REMOTE_ORDER_NOT_CONFIRMED"));

    let stored = h.stored_order(&outcome.order_handle).await;
    let charge = stored.payment_transaction.unwrap().latest_charge_id;
    assert_eq!(h.payments.refunded_charges(), vec![charge]);

    assert!(h.accounts.list_purchases(ACCOUNT).await.unwrap().is_empty());
    assert_eq!(h.accounts.get_cart(ACCOUNT).await.unwrap().len(), 1);
    assert!(h.offers.acceptances().is_empty());
}

#[tokio::test]
async fn test_missing_remote_order_refunds_exactly_once() {
    let h = TestHarness::new().await;
    h.commerce.set_decline_draft(true);
    let order = h.order("a@example.com", "offer-1", true).await;

    let report = h
        .runner
        .submit_and_wait(vec![Some(order)], ACCOUNT, 4)
        .await
        .unwrap();

    let record = h
        .poller
        .poll(&report.outcomes[0].order_handle)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.status, OrderStatus::Unsuccessful);
    assert_eq!(record.failure.as_deref(), Some("REMOTE_ORDER_NOT_CREATED"));
    assert_eq!(h.payments.refunded_charges(), vec!["CH-0001".to_string()]);
}

#[tokio::test]
async fn test_unpaid_remote_failure_has_nothing_to_refund() {
    let h = TestHarness::new().await;
    h.commerce.set_fail_on_create(true);
    let order = h.order("a@example.com", "offer-1", false).await;

    let report = h
        .runner
        .submit_and_wait(vec![Some(order)], ACCOUNT, 4)
        .await
        .unwrap();

    assert_eq!(report.unsuccessful(), 1);
    assert!(h.payments.refunded_charges().is_empty());
    assert!(
        h.stored_order(&report.outcomes[0].order_handle)
            .await
            .payment_transaction
            .is_none()
    );
}

#[tokio::test]
async fn test_capture_failure_stops_before_remote_order() {
    let h = TestHarness::new().await;
    h.payments.set_fail_on_capture(true);
    let order = h.order("a@example.com", "offer-1", true).await;

    let report = h
        .runner
        .submit_and_wait(vec![Some(order)], ACCOUNT, 4)
        .await
        .unwrap();

    let outcome = &report.outcomes[0];
    assert_eq!(outcome.failure.as_deref(), Some("FAILED_TO_CAPTURE_PAYMENT"));
    assert_eq!(h.commerce.draft_count(), 0);
    assert!(h.payments.refunded_charges().is_empty());
    assert!(h.stored_order(&outcome.order_handle).await.payment_transaction.is_none());
}

#[tokio::test]
async fn test_unknown_account_never_reaches_payment_or_storefront() {
    let h = TestHarness::new().await;
    let order = h.order("a@example.com", "offer-1", true).await;

    let report = h
        .runner
        .submit_and_wait(vec![Some(order)], "ghost", 4)
        .await
        .unwrap();

    let outcome = &report.outcomes[0];
    assert_eq!(outcome.status, OrderStatus::Unsuccessful);
    assert_eq!(outcome.failure.as_deref(), Some("NO_ACCOUNT_FOUND"));
    assert_eq!(h.payments.capture_count(), 0);
    assert_eq!(h.commerce.draft_count(), 0);
}

#[tokio::test]
async fn test_offer_acceptance_failure_is_not_compensated() {
    let h = TestHarness::new().await;
    h.offers.set_fail_on_accept(true);
    let order = h.order("a@example.com", "offer-1", true).await;

    let report = h
        .runner
        .submit_and_wait(vec![Some(order)], ACCOUNT, 4)
        .await
        .unwrap();

    let outcome = &report.outcomes[0];
    assert_eq!(outcome.status, OrderStatus::Unsuccessful);
    assert_eq!(outcome.failure.as_deref(), Some("FAILED_ACCEPTING_OFFER"));
    assert_eq!(h.commerce.order_count(), 1);
    assert_eq!(h.payments.capture_count(), 1);
    assert!(h.payments.refunded_charges().is_empty());
}

#[tokio::test]
async fn test_failures_are_isolated_within_a_batch() {
    let h = TestHarness::new().await;
    let first = h.order("a@example.com", "offer-1", false).await;
    let mut second = h.order("b@example.com", "offer-2", true).await;
    second.payment_method_id = None;
    let third = h.order("c@example.com", "offer-3", false).await;

    let report = h
        .runner
        .submit_and_wait(vec![Some(first), None, Some(second), Some(third)], ACCOUNT, 2)
        .await
        .unwrap();

    assert_eq!(report.outcomes.len(), 3);
    let statuses: Vec<OrderStatus> = report.outcomes.iter().map(|o| o.status).collect();
    assert_eq!(
        statuses,
        vec![
            OrderStatus::Successful,
            OrderStatus::Unsuccessful,
            OrderStatus::Successful
        ]
    );
}

#[tokio::test]
async fn test_concurrency_limit_bounds_sagas_in_flight() {
    let h = TestHarness::new().await;
    h.commerce.set_latency(Duration::from_millis(50));

    let mut orders = Vec::new();
    for i in 0..5 {
        orders.push(Some(h.order(&format!("o{i}@example.com"), &format!("offer-{i}"), false).await));
    }

    let report = h.runner.submit_and_wait(orders, ACCOUNT, 2).await.unwrap();
    assert_eq!(report.successful(), 5);
    assert_eq!(h.commerce.max_in_flight(), 2);

    let calls = h.commerce.calls();
    let position = |call: CommerceCall| calls.iter().position(|c| *c == call).unwrap();
    let chunks = [vec![0, 1], vec![2, 3], vec![4]];
    for pair in chunks.windows(2) {
        let last_finish = pair[0]
            .iter()
            .map(|i| position(CommerceCall::Finished(format!("o{i}@example.com"))))
            .max()
            .unwrap();
        let first_start = pair[1]
            .iter()
            .map(|i| position(CommerceCall::Started(format!("o{i}@example.com"))))
            .min()
            .unwrap();
        assert!(
            last_finish < first_start,
            "chunk {:?} started before chunk {:?} finished",
            pair[1],
            pair[0]
        );
    }
}

#[tokio::test]
async fn test_submit_is_pollable_immediately() {
    let h = TestHarness::new().await;
    h.commerce.set_latency(Duration::from_millis(50));
    let order = h.order("a@example.com", "offer-1", false).await;

    let batch = h.runner.submit(vec![Some(order)], ACCOUNT, 4).await.unwrap();

    let record = h
        .poller
        .resolve(batch.as_str())
        .await
        .unwrap()
        .expect("admitted order is visible before processing finishes");
    assert_eq!(record.status, OrderStatus::Processing);
    assert_eq!(record.batch_handle, batch);

    let mut status = record.status;
    for _ in 0..100 {
        tokio::time::sleep(Duration::from_millis(10)).await;
        status = h
            .poller
            .resolve(batch.as_str())
            .await
            .unwrap()
            .unwrap()
            .status;
        if status.is_terminal() {
            break;
        }
    }
    assert_eq!(status, OrderStatus::Successful);
}

#[tokio::test]
async fn test_terminal_status_never_changes() {
    let h = TestHarness::new().await;
    let order = h.order("a@example.com", "offer-1", false).await;

    let report = h
        .runner
        .submit_and_wait(vec![Some(order.clone())], ACCOUNT, 1)
        .await
        .unwrap();
    let handle = &report.outcomes[0].order_handle;

    let err = h
        .store
        .update(handle, StatusUpdate::unsuccessful(&order, "LATE").unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, StatusStoreError::TerminalState { .. }));

    let record = h.poller.poll(handle).await.unwrap().unwrap();
    assert_eq!(record.status, OrderStatus::Successful);
}

#[tokio::test]
async fn test_polling_twice_yields_identical_data() {
    let h = TestHarness::new().await;
    let order = h.order("a@example.com", "offer-1", false).await;
    let report = h
        .runner
        .submit_and_wait(vec![Some(order)], ACCOUNT, 1)
        .await
        .unwrap();

    let batch: &BatchHandle = &report.batch_handle;
    let first = h.poller.resolve(batch.as_str()).await.unwrap();
    let second = h.poller.resolve(batch.as_str()).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_cart_over_ceiling_is_rejected_before_any_order() {
    let h = TestHarness::new().await;
    h.accounts
        .add_line_item(
            ACCOUNT,
            CartLineItem::new("expensive", "offer-1", Money::from_dollars(200), Money::from_dollars(149)),
        )
        .await
        .unwrap();

    let err = h
        .accounts
        .add_line_item(
            ACCOUNT,
            CartLineItem::new("one-more", "offer-2", Money::from_dollars(5), Money::from_dollars(2)),
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        DomainError::Cart(CartError::CartValueExceedsLimit { .. })
    ));
    assert_eq!(h.accounts.get_cart(ACCOUNT).await.unwrap().len(), 1);
    assert_eq!(h.store.record_count().await, 0);
}
