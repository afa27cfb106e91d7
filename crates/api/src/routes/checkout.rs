//! Checkout submission and status polling endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use common::BatchHandle;
use domain::Order;
use serde::Deserialize;
use serde_json::{Value, json};

use super::{AppState, success};
use crate::error::ApiError;

/// Body of `POST /checkout`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    pub incoming_order: Vec<Option<Order>>,
    pub account_id: String,
    #[serde(default)]
    pub concurrency: Option<usize>,
}

/// POST /checkout: admit a batch and process it in the background.
#[tracing::instrument(skip_all)]
pub async fn submit(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let request: SubmitRequest =
        serde_json::from_value(body).map_err(|e| ApiError::MissingFields(e.to_string()))?;
    if request.account_id.trim().is_empty() {
        return Err(ApiError::MissingFields("accountId".to_string()));
    }

    let limit = request.concurrency.unwrap_or(state.concurrency_limit);
    let batch = state
        .runner
        .submit(request.incoming_order, &request.account_id, limit)
        .await?;

    tracing::info!(account_id = %request.account_id, batch_handle = %batch, "checkout submitted");
    Ok(success(json!({ "incomingOrderHash": batch })))
}

/// GET /checkout/{handle}: current status of an order, addressed by its
/// order handle or by its batch handle.
#[tracing::instrument(skip(state))]
pub async fn poll(
    State(state): State<Arc<AppState>>,
    Path(handle): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let record = state.poller.resolve(&handle).await?;

    Ok(success(match record {
        Some(record) => json!({
            "status": record.status,
            "failure": record.failure,
            "orderHandle": record.order_handle,
            "order": record.payload,
        }),
        None => json!({ "status": null, "order": null }),
    }))
}

/// GET /checkout/{handle}/orders: every order admitted with a batch.
#[tracing::instrument(skip(state))]
pub async fn poll_batch(
    State(state): State<Arc<AppState>>,
    Path(handle): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let records = state.poller.poll_batch(&BatchHandle::new(handle)).await?;
    Ok(success(json!({ "orders": records })))
}
