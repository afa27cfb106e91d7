//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::{CartError, DomainError};
use fulfillment::FulfillmentError;

/// API-level error type that maps to the failure envelope
/// `{ "success": false, "code": <reason> }`.
#[derive(Debug)]
pub enum ApiError {
    /// A required path or body field is missing or malformed.
    MissingFields(String),
    /// A resource was not found; carries the reason code.
    NotFound(&'static str),
    /// Account gateway error.
    Domain(DomainError),
    /// Batch admission, polling or lookup error.
    Fulfillment(FulfillmentError),
}

const SERVER_ERROR: &str = "SERVER_ERROR";

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match self {
            ApiError::MissingFields(detail) => {
                tracing::debug!(%detail, "rejected request with missing fields");
                (StatusCode::NOT_FOUND, "MISSING_REQUIRED_FIELDS")
            }
            ApiError::NotFound(code) => (StatusCode::NOT_FOUND, code),
            ApiError::Domain(err) => domain_error_to_response(&err),
            ApiError::Fulfillment(err) => {
                tracing::error!(error = %err, "fulfillment error");
                (StatusCode::INTERNAL_SERVER_ERROR, SERVER_ERROR)
            }
        };

        let body = serde_json::json!({ "success": false, "code": code });
        (status, axum::Json(body)).into_response()
    }
}

fn domain_error_to_response(err: &DomainError) -> (StatusCode, &'static str) {
    match err {
        DomainError::AccountNotFound(_) | DomainError::AddressNotFound(_) => {
            (StatusCode::NOT_FOUND, err.code())
        }
        DomainError::Cart(CartError::ItemNotFound(_)) => (StatusCode::NOT_FOUND, err.code()),
        DomainError::Cart(_) => (StatusCode::BAD_REQUEST, err.code()),
        DomainError::Unavailable(_) => {
            tracing::error!(error = %err, "account gateway unavailable");
            (StatusCode::INTERNAL_SERVER_ERROR, SERVER_ERROR)
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Domain(err)
    }
}

impl From<FulfillmentError> for ApiError {
    fn from(err: FulfillmentError) -> Self {
        ApiError::Fulfillment(err)
    }
}
