use std::sync::Arc;

use common::OrderStatus;
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use domain::{Account, Address, CartLineItem, InMemoryAccountGateway, Money, Order, ShippingRate};
use fulfillment::{
    BatchRunner, FulfillmentSaga, InMemoryOfferService, InMemoryPaymentService,
    InMemoryRemoteCommerceService,
};
use status_store::InMemoryStatusStore;
use tokio::runtime::Runtime;

fn order(index: usize) -> Order {
    Order {
        cart: vec![
            CartLineItem::new("product", "offer", Money::from_cents(2999), Money::from_cents(600))
                .with_options(vec![format!("gid://shopify/ProductVariant/{index}")]),
        ],
        email_address: format!("shopper{index}@example.com"),
        payment_required: true,
        payment_is_apple_pay: false,
        payment_method_id: Some("pm_bench".to_string()),
        payment_transaction: None,
        shipping_address: Address::default(),
        shipping_rate: ShippingRate::default(),
        completion_status: OrderStatus::Processing,
        completion_failure: None,
        offer_id: format!("offer-{index}"),
        advertiser_id: "adv-bench".to_string(),
        account_id: String::new(),
        order_handle: None,
        incoming_order_hash: None,
        created_at: chrono::Utc::now(),
        last_updated: chrono::Utc::now(),
    }
}

async fn runner() -> BatchRunner {
    let accounts = Arc::new(InMemoryAccountGateway::new());
    accounts
        .insert_account(Account::new("bench").with_payment_customer("cus_bench"))
        .await;
    let store = Arc::new(InMemoryStatusStore::new());
    let saga = FulfillmentSaga::new(
        accounts,
        Arc::new(InMemoryPaymentService::new()),
        Arc::new(InMemoryRemoteCommerceService::new()),
        Arc::new(InMemoryOfferService::new()),
        store.clone(),
    );
    BatchRunner::new(store, Arc::new(saga))
}

fn bench_batch_runner(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("batch_runner");

    for limit in [1usize, 4, 16] {
        group.bench_with_input(BenchmarkId::new("submit_and_wait_32", limit), &limit, |b, &limit| {
            b.to_async(&rt).iter(|| async move {
                let runner = runner().await;
                let orders = (0..32).map(|i| Some(order(i))).collect();
                runner.submit_and_wait(orders, "bench", limit).await.unwrap()
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_batch_runner);
criterion_main!(benches);
