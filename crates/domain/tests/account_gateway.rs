//! Integration tests for the in-memory account gateway.

use chrono::Utc;
use domain::{
    Account, AccountGateway, Address, CartError, CartLineItem, DomainError,
    InMemoryAccountGateway, Money, Purchase,
};

async fn gateway_with_account() -> InMemoryAccountGateway {
    let gateway = InMemoryAccountGateway::new();
    gateway
        .insert_account(
            Account::new("acc-1")
                .with_payment_customer("cus_1")
                .with_phone("+15550100"),
        )
        .await;
    gateway
}

fn item(id: &str, offer: &str, cents: i64) -> CartLineItem {
    CartLineItem::new(id, offer, Money::from_cents(cents), Money::from_cents(cents))
        .with_options(vec![format!("variant-{id}")])
}

#[tokio::test]
async fn add_line_item_stamps_instance_id() {
    let gateway = gateway_with_account().await;

    let added = gateway
        .add_line_item("acc-1", item("shirt", "offer-1", 600))
        .await
        .unwrap();

    let uuid = added.uuid.clone().unwrap();
    assert_eq!(uuid.len(), common::HANDLE_LENGTH);

    let cart = gateway.get_cart("acc-1").await.unwrap();
    assert_eq!(cart, vec![added]);
}

#[tokio::test]
async fn duplicate_product_is_rejected() {
    let gateway = gateway_with_account().await;
    gateway
        .add_line_item("acc-1", item("shirt", "offer-1", 600))
        .await
        .unwrap();

    let result = gateway
        .add_line_item("acc-1", item("shirt", "offer-1", 600))
        .await;
    assert!(matches!(
        result,
        Err(DomainError::Cart(CartError::ProductAlreadyInCart(_)))
    ));
    assert_eq!(gateway.get_cart("acc-1").await.unwrap().len(), 1);
}

#[tokio::test]
async fn cart_ceiling_rejects_before_any_order_exists() {
    let gateway = gateway_with_account().await;
    gateway
        .add_line_item("acc-1", item("a", "offer-1", 14_000))
        .await
        .unwrap();

    let result = gateway
        .add_line_item("acc-1", item("b", "offer-1", 1_001))
        .await;
    let err = result.unwrap_err();
    assert_eq!(err.code(), "CART_VALUE_EXCEEDS_LIMIT");
    assert_eq!(gateway.get_cart("acc-1").await.unwrap().len(), 1);
}

#[tokio::test]
async fn negative_price_cannot_make_room_under_ceiling() {
    let gateway = gateway_with_account().await;

    let result = gateway
        .add_line_item("acc-1", item("credit", "offer-1", -1_000_000))
        .await;
    assert_eq!(result.unwrap_err().code(), "INVALID_PRICE");

    let result = gateway
        .add_line_item("acc-1", item("tv", "offer-1", 900_000))
        .await;
    assert_eq!(result.unwrap_err().code(), "CART_VALUE_EXCEEDS_LIMIT");
    assert!(gateway.get_cart("acc-1").await.unwrap().is_empty());
}

#[tokio::test]
async fn overflowing_price_is_over_ceiling() {
    let gateway = gateway_with_account().await;
    gateway
        .add_line_item("acc-1", item("a", "offer-1", 100))
        .await
        .unwrap();

    let result = gateway
        .add_line_item("acc-1", item("b", "offer-1", i64::MAX))
        .await;
    assert_eq!(result.unwrap_err().code(), "CART_VALUE_EXCEEDS_LIMIT");
    assert_eq!(gateway.get_cart("acc-1").await.unwrap().len(), 1);
}

#[tokio::test]
async fn claimed_offer_is_rejected() {
    let gateway = gateway_with_account().await;
    gateway
        .record_accepted_offer("acc-1", "offer-1")
        .await
        .unwrap();

    let err = gateway
        .add_line_item("acc-1", item("a", "offer-1", 100))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "PRODUCTS_ALREADY_CLAIMED");

    gateway
        .add_line_item("acc-1", item("a", "offer-2", 100))
        .await
        .unwrap();
}

#[tokio::test]
async fn unknown_account_is_reported() {
    let gateway = InMemoryAccountGateway::new();
    assert!(gateway.load_account("nobody").await.unwrap().is_none());

    let err = gateway
        .add_line_item("nobody", item("a", "offer-1", 100))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "NO_ACCOUNT_FOUND");
}

#[tokio::test]
async fn remove_and_clear_cart() {
    let gateway = gateway_with_account().await;
    let first = gateway
        .add_line_item("acc-1", item("a", "offer-1", 100))
        .await
        .unwrap();
    gateway
        .add_line_item("acc-1", item("b", "offer-1", 100))
        .await
        .unwrap();

    let remaining = gateway
        .remove_line_item("acc-1", first.uuid.as_deref().unwrap())
        .await
        .unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, "b");

    gateway.clear_cart("acc-1").await.unwrap();
    assert!(gateway.get_cart("acc-1").await.unwrap().is_empty());
}

#[tokio::test]
async fn address_book_round_trip() {
    let gateway = gateway_with_account().await;
    let address = Address {
        first_name: "Ada".into(),
        address1: "1 Main St".into(),
        city: "Austin".into(),
        province_code: "TX".into(),
        country_code: "US".into(),
        zip: "78701".into(),
        ..Address::default()
    };

    let addresses = gateway.add_address("acc-1", address).await.unwrap();
    let address_id = addresses[0].address_id.clone().unwrap();
    assert_eq!(gateway.list_addresses("acc-1").await.unwrap().len(), 1);

    let remaining = gateway.remove_address("acc-1", &address_id).await.unwrap();
    assert!(remaining.is_empty());

    let err = gateway
        .remove_address("acc-1", &address_id)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::AddressNotFound(_)));
}

#[tokio::test]
async fn purchases_are_found_by_trailing_id() {
    let gateway = gateway_with_account().await;
    gateway
        .store_purchase(
            "acc-1",
            Purchase {
                items: vec![],
                order_hash: None,
                order_id: "gid://shopify/Order/42".into(),
                customer_email: Some("a@b.c".into()),
                shipping_address: None,
                required_payment: false,
                transaction: None,
                offer_id: "offer-1".into(),
                advertiser_id: "adv-1".into(),
                created_at: Utc::now(),
            },
        )
        .await
        .unwrap();

    assert_eq!(gateway.list_purchases("acc-1").await.unwrap().len(), 1);
    assert!(gateway.get_purchase("acc-1", "42").await.unwrap().is_some());
    assert!(gateway.get_purchase("acc-1", "43").await.unwrap().is_none());
}

#[tokio::test]
async fn unavailable_gateway_fails_every_call() {
    let gateway = gateway_with_account().await;
    gateway.set_unavailable(true);

    let err = gateway.load_account("acc-1").await.unwrap_err();
    assert!(matches!(err, DomainError::Unavailable(_)));

    gateway.set_unavailable(false);
    assert!(gateway.load_account("acc-1").await.unwrap().is_some());
}
