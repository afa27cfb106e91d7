//! Remote commerce capability backed by the Shopify Admin GraphQL API.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use domain::{Address, RemoteLineItem};
use reqwest::Client;
use serde_json::{Value, json};

use super::http_client;
use crate::error::FulfillmentError;
use crate::services::{CompletedOrder, DraftOrderInput, RemoteCommerceService};

/// Admin API version the queries are written against.
pub const ADMIN_API_VERSION: &str = "2023-07";

const DRAFT_ORDER_CREATE: &str = r#"mutation draftOrderCreate($input: DraftOrderInput!) {
  draftOrderCreate(input: $input) {
    draftOrder { id }
    userErrors { field message }
  }
}"#;

const DRAFT_ORDER_COMPLETE: &str = r#"mutation draftOrderComplete($id: ID!) {
  draftOrderComplete(id: $id) {
    draftOrder {
      id
      email
      totalPrice
      shippingAddress { address1 address2 city provinceCode countryCodeV2 zip firstName lastName }
      lineItems(first: 10) {
        nodes { title variant { id title } quantity image { url } }
      }
    }
    userErrors { field message }
  }
}"#;

const DRAFT_ORDER_QUERY: &str = r#"query draftOrder($id: ID!) {
  draftOrder(id: $id) {
    id
    status
    order {
      confirmationNumber
      confirmed
      displayFulfillmentStatus
      shippingAddress { address1 address2 city provinceCode countryCodeV2 zip firstName lastName }
      lineItems(first: 5) {
        nodes {
          title
          variantTitle
          variant { displayName title selectedOptions { name value } }
          quantity
          image { url }
        }
      }
      fulfillments(first: 3) {
        name
        displayStatus
        estimatedDeliveryAt
        status
        trackingInfo(first: 3) { number url }
      }
    }
  }
}"#;

/// Admin API credentials of one advertiser's store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreCredentials {
    /// The `<store>` part of `<store>.myshopify.com`.
    pub store_name: String,
    pub access_token: String,
}

impl StoreCredentials {
    pub fn new(store_name: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            store_name: store_name.into(),
            access_token: access_token.into(),
        }
    }

    /// Admin GraphQL endpoint of the store.
    pub fn endpoint(&self) -> String {
        format!(
            "https://{}.myshopify.com/admin/api/{ADMIN_API_VERSION}/graphql.json",
            self.store_name
        )
    }
}

/// Resolves the store an advertiser sells through.
#[async_trait]
pub trait StoreCredentialsProvider: Send + Sync {
    async fn credentials(
        &self,
        advertiser_id: &str,
    ) -> Result<Option<StoreCredentials>, FulfillmentError>;
}

/// Fixed advertiser to store mapping, loaded at startup.
#[derive(Debug, Clone, Default)]
pub struct StaticStoreCredentials {
    stores: HashMap<String, StoreCredentials>,
}

impl StaticStoreCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_store(mut self, advertiser_id: impl Into<String>, store: StoreCredentials) -> Self {
        self.stores.insert(advertiser_id.into(), store);
        self
    }
}

#[async_trait]
impl StoreCredentialsProvider for StaticStoreCredentials {
    async fn credentials(
        &self,
        advertiser_id: &str,
    ) -> Result<Option<StoreCredentials>, FulfillmentError> {
        Ok(self.stores.get(advertiser_id).cloned())
    }
}

fn address_input(address: &Address) -> Value {
    json!({
        "address1": address.address1,
        "address2": address.address2,
        "city": address.city,
        "countryCode": address.country_code,
        "firstName": address.first_name,
        "lastName": address.last_name,
        "provinceCode": address.province_code,
        "zip": address.zip,
    })
}

/// GraphQL request creating a draft order.
pub fn draft_order_create_payload(input: &DraftOrderInput) -> Value {
    let line_items: Vec<Value> = input
        .line_items
        .iter()
        .map(|item| json!({ "quantity": item.quantity, "variantId": item.variant_id }))
        .collect();

    json!({
        "query": DRAFT_ORDER_CREATE,
        "variables": {
            "input": {
                "billingAddress": address_input(&input.address),
                "shippingAddress": address_input(&input.address),
                "email": input.email,
                "lineItems": line_items,
                "phone": input.phone,
                "presentmentCurrencyCode": input.presentment_currency_code,
                "sourceName": input.source_name,
                "shippingLine": {
                    "title": input.shipping_line.title,
                    "shippingRateHandle": input.shipping_line.shipping_rate_handle,
                },
            }
        }
    })
}

/// GraphQL request completing a draft order.
pub fn draft_order_complete_payload(draft_id: &str) -> Value {
    json!({ "query": DRAFT_ORDER_COMPLETE, "variables": { "id": draft_id } })
}

/// GraphQL request reading a draft order with its fulfillments.
pub fn draft_order_query_payload(draft_id: &str) -> Value {
    json!({ "query": DRAFT_ORDER_QUERY, "variables": { "id": draft_id } })
}

fn log_user_errors(operation: &str, payload: &Value) {
    if let Some(errors) = payload["userErrors"].as_array().filter(|e| !e.is_empty()) {
        tracing::warn!(operation, user_errors = %serde_json::Value::from(errors.clone()), "storefront rejected request");
    }
}

/// Extracts the draft id from a `draftOrderCreate` response.
pub fn parse_draft_order_id(response: &Value) -> Option<String> {
    let payload = &response["data"]["draftOrderCreate"];
    log_user_errors("draftOrderCreate", payload);
    payload["draftOrder"]["id"].as_str().map(str::to_string)
}

/// Extracts the confirmed order from a `draftOrderComplete` response.
pub fn parse_completed_order(response: &Value) -> Option<CompletedOrder> {
    let payload = &response["data"]["draftOrderComplete"];
    log_user_errors("draftOrderComplete", payload);

    let order = &payload["draftOrder"];
    let id = order["id"].as_str()?;
    let line_items = order["lineItems"]["nodes"]
        .as_array()
        .map(|nodes| {
            nodes
                .iter()
                .map(|node| RemoteLineItem {
                    id: None,
                    title: node["title"].as_str().map(str::to_string),
                    variant_id: node["variant"]["id"].as_str().map(str::to_string),
                    quantity: node["quantity"].as_u64().unwrap_or(1) as u32,
                    price_paid: None,
                })
                .collect()
        })
        .unwrap_or_default();

    Some(CompletedOrder {
        id: id.to_string(),
        email: order["email"].as_str().map(str::to_string),
        total_price: order["totalPrice"].as_str().map(str::to_string),
        shipping_address: Some(order["shippingAddress"].clone()).filter(|a| !a.is_null()),
        line_items,
    })
}

/// Extracts the draft order from a `draftOrder` query response.
pub fn parse_draft_order(response: &Value) -> Option<Value> {
    Some(response["data"]["draftOrder"].clone()).filter(|order| !order.is_null())
}

/// Shopify-backed storefront.
pub struct ShopifyCommerceClient {
    client: Client,
    credentials: Arc<dyn StoreCredentialsProvider>,
}

impl ShopifyCommerceClient {
    pub fn new(
        credentials: Arc<dyn StoreCredentialsProvider>,
        timeout: Duration,
    ) -> Result<Self, FulfillmentError> {
        Ok(Self {
            client: http_client(timeout)?,
            credentials,
        })
    }

    async fn execute(&self, advertiser_id: &str, payload: Value) -> Result<Value, FulfillmentError> {
        let store = self
            .credentials
            .credentials(advertiser_id)
            .await?
            .ok_or_else(|| {
                FulfillmentError::RemoteCommerce(format!(
                    "no storefront configured for advertiser {advertiser_id}"
                ))
            })?;

        let response = self
            .client
            .post(store.endpoint())
            .header("X-Shopify-Access-Token", &store.access_token)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FulfillmentError::RemoteCommerce(format!(
                "storefront answered {status}"
            )));
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl RemoteCommerceService for ShopifyCommerceClient {
    #[tracing::instrument(skip(self, input))]
    async fn create_draft_order(
        &self,
        advertiser_id: &str,
        input: &DraftOrderInput,
    ) -> Result<Option<String>, FulfillmentError> {
        let response = self
            .execute(advertiser_id, draft_order_create_payload(input))
            .await?;
        Ok(parse_draft_order_id(&response))
    }

    #[tracing::instrument(skip(self))]
    async fn complete_draft_order(
        &self,
        advertiser_id: &str,
        draft_id: &str,
    ) -> Result<Option<CompletedOrder>, FulfillmentError> {
        let response = self
            .execute(advertiser_id, draft_order_complete_payload(draft_id))
            .await?;
        Ok(parse_completed_order(&response))
    }

    #[tracing::instrument(skip(self))]
    async fn get_order(
        &self,
        advertiser_id: &str,
        order_id: &str,
    ) -> Result<Option<Value>, FulfillmentError> {
        let response = self
            .execute(advertiser_id, draft_order_query_payload(order_id))
            .await?;
        Ok(parse_draft_order(&response))
    }
}
