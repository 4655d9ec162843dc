//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::OrderError;
use order_store::StoreError;
use ordering::OrderingError;
use settlement::SettlementError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// The request lost a race or is stale; the client must re-fetch.
    Conflict(String),
    /// The operation is permanently refused (e.g. deleting a paid order).
    Forbidden(String),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

/// Stale-client and state-machine rejections are conflicts (refresh and try
/// again); malformed values are bad requests.
fn order_error_to_api(err: &OrderError, text: String) -> ApiError {
    match err {
        OrderError::ItemNotFound { .. } => ApiError::NotFound(text),
        OrderError::InvalidQuantity { .. }
        | OrderError::InvalidPrice { .. }
        | OrderError::InvalidDiscount { .. }
        | OrderError::NoItems => ApiError::BadRequest(text),
        _ => ApiError::Conflict(text),
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        let text = err.to_string();
        match &err {
            StoreError::NotFound(_) => ApiError::NotFound(text),
            StoreError::AlreadyExists(_) | StoreError::VersionConflict { .. } => {
                ApiError::Conflict(text)
            }
            StoreError::Rejected(order_err) => order_error_to_api(order_err, text),
            StoreError::Forbidden(_) => ApiError::Forbidden(text),
            StoreError::InvariantViolation(_)
            | StoreError::Database(_)
            | StoreError::Serialization(_) => ApiError::Internal(text),
        }
    }
}

impl From<OrderingError> for ApiError {
    fn from(err: OrderingError) -> Self {
        let text = err.to_string();
        match err {
            OrderingError::TableUnavailable(_) | OrderingError::MenuItemUnavailable(_) => {
                ApiError::BadRequest(text)
            }
            OrderingError::Order(ref order_err) => order_error_to_api(order_err, text),
            OrderingError::Store(store_err) => store_err.into(),
            OrderingError::Catalog(_) | OrderingError::Tables(_) => ApiError::Internal(text),
        }
    }
}

impl From<SettlementError> for ApiError {
    fn from(err: SettlementError) -> Self {
        let text = err.to_string();
        match err {
            SettlementError::NotFound(_) => ApiError::NotFound(text),
            SettlementError::InvalidState { .. } | SettlementError::Conflict(_) => {
                ApiError::Conflict(text)
            }
            SettlementError::NotSettled(_) => ApiError::Internal(text),
            SettlementError::Store(store_err) => store_err.into(),
        }
    }
}
