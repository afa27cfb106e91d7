//! Remote storefront order service trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use domain::{Address, DraftLineItem, RemoteLineItem};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{read, write};
use crate::error::FulfillmentError;

/// Shipping method attached to a draft order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingLine {
    pub title: String,
    pub shipping_rate_handle: String,
}

/// Everything the storefront needs to draft an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftOrderInput {
    /// Used as both billing and shipping address.
    pub address: Address,
    pub email: String,
    pub phone: Option<String>,
    pub line_items: Vec<DraftLineItem>,
    pub presentment_currency_code: String,
    pub source_name: String,
    pub shipping_line: ShippingLine,
}

/// A confirmed storefront order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedOrder {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub total_price: Option<String>,
    #[serde(default)]
    pub shipping_address: Option<serde_json::Value>,
    #[serde(default)]
    pub line_items: Vec<RemoteLineItem>,
}

/// Trait for remote storefront order operations.
///
/// Each advertiser has its own storefront; every call names the advertiser
/// whose store it targets. `Ok(None)` means the storefront answered but
/// produced no order.
#[async_trait]
pub trait RemoteCommerceService: Send + Sync {
    /// Creates a draft order and returns its id.
    async fn create_draft_order(
        &self,
        advertiser_id: &str,
        input: &DraftOrderInput,
    ) -> Result<Option<String>, FulfillmentError>;

    /// Completes a draft order, turning it into a confirmed order.
    async fn complete_draft_order(
        &self,
        advertiser_id: &str,
        draft_id: &str,
    ) -> Result<Option<CompletedOrder>, FulfillmentError>;

    /// Looks up an order with its fulfillment details.
    async fn get_order(
        &self,
        advertiser_id: &str,
        order_id: &str,
    ) -> Result<Option<serde_json::Value>, FulfillmentError>;
}

/// One observed draft call, used to verify scheduling in tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommerceCall {
    Started(String),
    Finished(String),
}

#[derive(Debug, Default)]
struct InMemoryCommerceState {
    drafts: HashMap<String, (String, DraftOrderInput)>,
    orders: HashMap<String, (String, CompletedOrder)>,
    calls: Vec<CommerceCall>,
    next_id: u32,
    lookups: usize,
    fail_on_create: bool,
    decline_draft: bool,
    decline_completion: bool,
}

/// In-memory storefront for testing.
///
/// Completed orders keep their draft id, so purchase lookups by the
/// trailing id segment work the same way they do against the live store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRemoteCommerceService {
    state: Arc<RwLock<InMemoryCommerceState>>,
    latency: Arc<RwLock<Duration>>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl InMemoryRemoteCommerceService {
    /// Creates a new in-memory storefront.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes draft creation hold for `latency` before answering.
    pub fn set_latency(&self, latency: Duration) {
        *write(&self.latency) = latency;
    }

    /// Configures draft creation to fail with a transport-level error.
    pub fn set_fail_on_create(&self, fail: bool) {
        write(&self.state).fail_on_create = fail;
    }

    /// Configures draft creation to answer without a draft.
    pub fn set_decline_draft(&self, decline: bool) {
        write(&self.state).decline_draft = decline;
    }

    /// Configures completion to answer without a confirmed order.
    pub fn set_decline_completion(&self, decline: bool) {
        write(&self.state).decline_completion = decline;
    }

    /// Returns the number of drafts created.
    pub fn draft_count(&self) -> usize {
        read(&self.state).drafts.len()
    }

    /// Returns the number of confirmed orders.
    pub fn order_count(&self) -> usize {
        read(&self.state).orders.len()
    }

    /// Returns the number of order lookups served.
    pub fn lookup_count(&self) -> usize {
        read(&self.state).lookups
    }

    /// Returns the draft input stored under a draft id.
    pub fn draft(&self, draft_id: &str) -> Option<DraftOrderInput> {
        read(&self.state)
            .drafts
            .get(draft_id)
            .map(|(_, input)| input.clone())
    }

    /// Returns the start/finish log of draft calls, keyed by email.
    pub fn calls(&self) -> Vec<CommerceCall> {
        read(&self.state).calls.clone()
    }

    /// Returns the highest number of concurrent draft calls observed.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteCommerceService for InMemoryRemoteCommerceService {
    async fn create_draft_order(
        &self,
        advertiser_id: &str,
        input: &DraftOrderInput,
    ) -> Result<Option<String>, FulfillmentError> {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        write(&self.state)
            .calls
            .push(CommerceCall::Started(input.email.clone()));

        let latency = *read(&self.latency);
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        let result = {
            let mut state = write(&self.state);
            state.calls.push(CommerceCall::Finished(input.email.clone()));
            if state.fail_on_create {
                Err(FulfillmentError::RemoteCommerce(
                    "Storefront unavailable".to_string(),
                ))
            } else if state.decline_draft {
                Ok(None)
            } else {
                state.next_id += 1;
                let draft_id = format!("gid://shopify/DraftOrder/{}", 1000 + state.next_id);
                state
                    .drafts
                    .insert(draft_id.clone(), (advertiser_id.to_string(), input.clone()));
                Ok(Some(draft_id))
            }
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    async fn complete_draft_order(
        &self,
        advertiser_id: &str,
        draft_id: &str,
    ) -> Result<Option<CompletedOrder>, FulfillmentError> {
        let mut state = write(&self.state);

        if state.decline_completion {
            return Ok(None);
        }

        let Some((owner, input)) = state.drafts.get(draft_id).cloned() else {
            return Ok(None);
        };
        if owner != advertiser_id {
            return Ok(None);
        }

        let order = CompletedOrder {
            id: draft_id.to_string(),
            email: Some(input.email.clone()),
            total_price: None,
            shipping_address: serde_json::to_value(&input.address).ok(),
            line_items: input
                .line_items
                .iter()
                .enumerate()
                .map(|(index, item)| RemoteLineItem {
                    id: Some(format!("{draft_id}/line/{index}")),
                    title: None,
                    variant_id: item.variant_id.clone(),
                    quantity: item.quantity,
                    price_paid: None,
                })
                .collect(),
        };
        state
            .orders
            .insert(draft_id.to_string(), (owner, order.clone()));
        Ok(Some(order))
    }

    async fn get_order(
        &self,
        advertiser_id: &str,
        order_id: &str,
    ) -> Result<Option<serde_json::Value>, FulfillmentError> {
        let mut state = write(&self.state);
        state.lookups += 1;

        let found = state
            .orders
            .get(order_id)
            .filter(|(owner, _)| owner == advertiser_id)
            .map(|(_, order)| {
                json!({
                    "id": order.id,
                    "email": order.email,
                    "shippingAddress": order.shipping_address,
                    "fulfillments": [],
                })
            });
        Ok(found)
    }
}
