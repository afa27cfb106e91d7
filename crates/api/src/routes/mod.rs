//! HTTP route handlers.

pub mod accounts;
pub mod checkout;
pub mod lookup;
pub mod ops;

use std::sync::Arc;

use axum::Json;
use domain::AccountGateway;
use fulfillment::{BatchRunner, OrderLookup, PaymentService, Poller};
use serde_json::{Map, Value};

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub runner: BatchRunner,
    pub poller: Poller,
    pub accounts: Arc<dyn AccountGateway>,
    pub payments: Arc<dyn PaymentService>,
    pub lookup: OrderLookup,
    /// Default sagas run at once when a submission does not set one.
    pub concurrency_limit: usize,
}

/// Wraps a payload in the success envelope
/// `{ "success": true, "code": "SUCCESS", ...payload }`.
pub fn success(payload: Value) -> Json<Value> {
    let mut body = Map::new();
    body.insert("success".to_string(), Value::Bool(true));
    body.insert("code".to_string(), Value::from("SUCCESS"));
    if let Value::Object(fields) = payload {
        body.extend(fields);
    }
    Json(Value::Object(body))
}
