//! Cached remote order lookup endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use serde::Deserialize;
use serde_json::{Value, json};

use super::{AppState, success};
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupRequest {
    pub order_id: String,
    pub advertiser_id: String,
}

/// POST /orders/lookup: read an order from the advertiser's storefront,
/// served from the lookup cache when fresh.
#[tracing::instrument(skip_all)]
pub async fn lookup(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let request: LookupRequest =
        serde_json::from_value(body).map_err(|e| ApiError::MissingFields(e.to_string()))?;

    let result = state
        .lookup
        .lookup(&request.advertiser_id, &request.order_id)
        .await?;
    let order = result.order.ok_or(ApiError::NotFound("ORDER_NOT_FOUND"))?;

    Ok(success(json!({ "order": order, "cached": result.cached })))
}
