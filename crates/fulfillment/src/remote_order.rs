//! Combined create-then-confirm of a remote storefront order.

use std::sync::Arc;

use chrono::Utc;
use common::OrderHandle;
use domain::{AccountGateway, PaymentTransaction, Purchase, RemoteLineItem, RemoteOrderResult};

use crate::error::{FulfillmentError, Result};
use crate::services::{DraftOrderInput, RemoteCommerceService};

/// Everything needed to place one remote order for an account.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteOrderRequest {
    pub account_id: String,
    pub order_handle: Option<OrderHandle>,
    pub offer_id: String,
    pub advertiser_id: String,
    pub input: DraftOrderInput,
    pub required_payment: bool,
    pub transaction: Option<PaymentTransaction>,
}

/// Drafts, completes and records a remote order.
///
/// On confirmation the account's cart is cleared and a `Purchase` carrying
/// the paid price of every line item is stored on the account.
#[derive(Clone)]
pub struct RemoteOrderProcessor {
    commerce: Arc<dyn RemoteCommerceService>,
    accounts: Arc<dyn AccountGateway>,
}

impl RemoteOrderProcessor {
    /// Creates a processor over a storefront and an account gateway.
    pub fn new(
        commerce: Arc<dyn RemoteCommerceService>,
        accounts: Arc<dyn AccountGateway>,
    ) -> Self {
        Self { commerce, accounts }
    }

    /// Places the order.
    ///
    /// Returns `None` when the storefront produced no draft, and a result
    /// without a confirmed id when the draft could not be completed.
    #[tracing::instrument(
        skip(self, request),
        fields(account_id = %request.account_id, advertiser_id = %request.advertiser_id)
    )]
    pub async fn process_and_complete(
        &self,
        request: &RemoteOrderRequest,
    ) -> Result<Option<RemoteOrderResult>> {
        let account = self
            .accounts
            .load_account(&request.account_id)
            .await?
            .ok_or_else(|| FulfillmentError::NoAccountFound(request.account_id.clone()))?;

        if account.has_claimed_offer(&request.offer_id) {
            return Err(FulfillmentError::ProductsAlreadyClaimed(
                request.offer_id.clone(),
            ));
        }

        let Some(draft_id) = self
            .commerce
            .create_draft_order(&request.advertiser_id, &request.input)
            .await?
        else {
            tracing::warn!("storefront returned no draft order");
            return Ok(None);
        };

        let Some(completed) = self
            .commerce
            .complete_draft_order(&request.advertiser_id, &draft_id)
            .await?
        else {
            tracing::warn!(%draft_id, "storefront did not complete draft order");
            return Ok(Some(RemoteOrderResult {
                confirmed_order_id: None,
                advertiser_id: Some(request.advertiser_id.clone()),
                line_items: Vec::new(),
            }));
        };

        self.accounts.clear_cart(&request.account_id).await?;

        let line_items = price_line_items(completed.line_items, request);
        let purchase = Purchase {
            items: line_items.clone(),
            order_hash: request.order_handle.clone(),
            order_id: completed.id.clone(),
            customer_email: completed.email,
            shipping_address: completed.shipping_address,
            required_payment: request.required_payment,
            transaction: request.transaction.clone(),
            offer_id: request.offer_id.clone(),
            advertiser_id: request.advertiser_id.clone(),
            created_at: Utc::now(),
        };
        self.accounts
            .store_purchase(&request.account_id, purchase)
            .await?;

        tracing::info!(order_id = %completed.id, "remote order confirmed");
        Ok(Some(RemoteOrderResult {
            confirmed_order_id: Some(completed.id),
            advertiser_id: Some(request.advertiser_id.clone()),
            line_items,
        }))
    }
}

/// Attaches the submitted price to each remote line item by variant id.
fn price_line_items(
    items: Vec<RemoteLineItem>,
    request: &RemoteOrderRequest,
) -> Vec<RemoteLineItem> {
    items
        .into_iter()
        .map(|mut item| {
            item.price_paid = request
                .input
                .line_items
                .iter()
                .find(|draft| draft.variant_id.is_some() && draft.variant_id == item.variant_id)
                .map(|draft| draft.price_paid);
            item
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use domain::{Account, Address, CartLineItem, DraftLineItem, InMemoryAccountGateway, Money};

    use super::*;
    use crate::services::{InMemoryRemoteCommerceService, ShippingLine};

    fn request() -> RemoteOrderRequest {
        RemoteOrderRequest {
            account_id: "account-1".to_string(),
            order_handle: Some(OrderHandle::new("order-1")),
            offer_id: "offer-1".to_string(),
            advertiser_id: "adv-1".to_string(),
            input: DraftOrderInput {
                address: Address::default(),
                email: "a@example.com".to_string(),
                phone: None,
                line_items: vec![
                    DraftLineItem {
                        quantity: 1,
                        variant_id: Some("gid://shopify/ProductVariant/1".to_string()),
                        price_paid: Money::from_cents(600),
                    },
                    DraftLineItem {
                        quantity: 1,
                        variant_id: Some("gid://shopify/ProductVariant/2".to_string()),
                        price_paid: Money::zero(),
                    },
                ],
                presentment_currency_code: "USD".to_string(),
                source_name: "CHECKOUT".to_string(),
                shipping_line: ShippingLine {
                    title: "Economy".to_string(),
                    shipping_rate_handle: "rate-1".to_string(),
                },
            },
            required_payment: false,
            transaction: None,
        }
    }

    async fn setup() -> (
        RemoteOrderProcessor,
        Arc<InMemoryRemoteCommerceService>,
        Arc<InMemoryAccountGateway>,
    ) {
        let commerce = Arc::new(InMemoryRemoteCommerceService::new());
        let accounts = Arc::new(InMemoryAccountGateway::new());
        accounts.insert_account(Account::new("account-1")).await;
        accounts
            .add_line_item(
                "account-1",
                CartLineItem::new("shirt", "offer-1", Money::from_cents(2999), Money::from_cents(600)),
            )
            .await
            .unwrap();
        (
            RemoteOrderProcessor::new(commerce.clone(), accounts.clone()),
            commerce,
            accounts,
        )
    }

    #[tokio::test]
    async fn test_confirmed_order_clears_cart_and_stores_purchase() {
        let (processor, _, accounts) = setup().await;

        let result = processor
            .process_and_complete(&request())
            .await
            .unwrap()
            .unwrap();

        assert!(result.is_confirmed());
        assert_eq!(result.line_items[0].price_paid, Some(Money::from_cents(600)));
        assert_eq!(result.line_items[1].price_paid, Some(Money::zero()));
        assert!(accounts.get_cart("account-1").await.unwrap().is_empty());

        let purchases = accounts.list_purchases("account-1").await.unwrap();
        assert_eq!(purchases.len(), 1);
        assert_eq!(
            Some(purchases[0].order_id.clone()),
            result.confirmed_order_id
        );
        assert_eq!(purchases[0].order_hash, Some(OrderHandle::new("order-1")));
    }

    #[tokio::test]
    async fn test_claimed_offer_is_rejected_before_drafting() {
        let (processor, commerce, accounts) = setup().await;
        accounts
            .record_accepted_offer("account-1", "offer-1")
            .await
            .unwrap();

        let err = processor.process_and_complete(&request()).await.unwrap_err();
        assert!(matches!(err, FulfillmentError::ProductsAlreadyClaimed(_)));
        assert_eq!(commerce.draft_count(), 0);
    }

    #[tokio::test]
    async fn test_no_draft_yields_no_result() {
        let (processor, commerce, accounts) = setup().await;
        commerce.set_decline_draft(true);

        let result = processor.process_and_complete(&request()).await.unwrap();
        assert!(result.is_none());
        assert_eq!(accounts.get_cart("account-1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_uncompleted_draft_is_not_confirmed() {
        let (processor, commerce, accounts) = setup().await;
        commerce.set_decline_completion(true);

        let result = processor
            .process_and_complete(&request())
            .await
            .unwrap()
            .unwrap();
        assert!(!result.is_confirmed());
        assert!(accounts.list_purchases("account-1").await.unwrap().is_empty());
    }
}
