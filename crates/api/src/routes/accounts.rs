//! Cart, address book and purchase history endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use domain::{Address, CartLineItem, DomainError};
use serde::Deserialize;
use serde_json::{Value, json};

use super::{AppState, success};
use crate::error::ApiError;

fn parse_body<T: serde::de::DeserializeOwned>(body: Value) -> Result<T, ApiError> {
    serde_json::from_value(body).map_err(|e| ApiError::MissingFields(e.to_string()))
}

/// GET /accounts/{id}/cart
pub async fn get_cart(
    State(state): State<Arc<AppState>>,
    Path(account_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let cart = state.accounts.get_cart(&account_id).await?;
    Ok(success(json!({ "cart": cart })))
}

/// POST /accounts/{id}/cart: add a line item, enforcing the cart rules.
#[tracing::instrument(skip(state, body))]
pub async fn add_to_cart(
    State(state): State<Arc<AppState>>,
    Path(account_id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let item: CartLineItem = parse_body(body)?;
    let item = state.accounts.add_line_item(&account_id, item).await?;
    Ok(success(json!({ "item": item })))
}

/// DELETE /accounts/{id}/cart/{uuid}
#[tracing::instrument(skip(state))]
pub async fn remove_from_cart(
    State(state): State<Arc<AppState>>,
    Path((account_id, item_uuid)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    let cart = state
        .accounts
        .remove_line_item(&account_id, &item_uuid)
        .await?;
    Ok(success(json!({ "cart": cart })))
}

/// GET /accounts/{id}/addresses
pub async fn list_addresses(
    State(state): State<Arc<AppState>>,
    Path(account_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let addresses = state.accounts.list_addresses(&account_id).await?;
    Ok(success(json!({ "addresses": addresses })))
}

/// POST /accounts/{id}/addresses
pub async fn add_address(
    State(state): State<Arc<AppState>>,
    Path(account_id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let address: Address = parse_body(body)?;
    let addresses = state.accounts.add_address(&account_id, address).await?;
    Ok(success(json!({ "addresses": addresses })))
}

/// DELETE /accounts/{id}/addresses/{addressId}
pub async fn remove_address(
    State(state): State<Arc<AppState>>,
    Path((account_id, address_id)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    let addresses = state
        .accounts
        .remove_address(&account_id, &address_id)
        .await?;
    Ok(success(json!({ "addresses": addresses })))
}

/// GET /accounts/{id}/purchases
pub async fn list_purchases(
    State(state): State<Arc<AppState>>,
    Path(account_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let purchases = state.accounts.list_purchases(&account_id).await?;
    Ok(success(json!({ "purchases": purchases })))
}

/// GET /accounts/{id}/purchases/{orderId}: accepts the full remote id or
/// its trailing numeric segment.
pub async fn get_purchase(
    State(state): State<Arc<AppState>>,
    Path((account_id, order_id)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    let purchase = state
        .accounts
        .get_purchase(&account_id, &order_id)
        .await?
        .ok_or(ApiError::NotFound("PURCHASE_NOT_FOUND"))?;
    Ok(success(json!({ "purchase": purchase })))
}

/// Body of `POST /accounts/{id}/refunds`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundRequest {
    pub charge_id: String,
}

/// POST /accounts/{id}/refunds: refunds a charge in full on behalf of an
/// existing account and reports whether the processor settled it.
#[tracing::instrument(skip(state, body))]
pub async fn refund_charge(
    State(state): State<Arc<AppState>>,
    Path(account_id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let request: RefundRequest = parse_body(body)?;
    if request.charge_id.trim().is_empty() {
        return Err(ApiError::MissingFields("chargeId".to_string()));
    }

    if state.accounts.load_account(&account_id).await?.is_none() {
        return Err(DomainError::AccountNotFound(account_id).into());
    }

    let outcome = state.payments.refund_charge(&request.charge_id).await?;
    tracing::info!(
        charge_id = %request.charge_id,
        refund_id = %outcome.refund_id,
        refunded = outcome.succeeded,
        "charge refund requested"
    );
    Ok(success(json!({
        "refunded": outcome.succeeded,
        "refundId": outcome.refund_id,
    })))
}
