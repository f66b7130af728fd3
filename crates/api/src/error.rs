//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use cart::CartError;
use catalog::CatalogError;
use inventory::InventoryError;
use orders::{CheckoutError, OrderError};

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Request conflicts with current state (stock, status machine).
    Conflict(String),
    /// Payment was declined.
    PaymentRequired(String),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::PaymentRequired(msg) => (StatusCode::PAYMENT_REQUIRED, msg),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        match &err {
            CatalogError::ProductNotFound(_)
            | CatalogError::VariantNotFound(_)
            | CatalogError::ReviewNotFound(_) => ApiError::NotFound(err.to_string()),
            CatalogError::InvalidRating(_) | CatalogError::InactiveVariant(_) => {
                ApiError::BadRequest(err.to_string())
            }
            CatalogError::DuplicateReview { .. } | CatalogError::DuplicateVote { .. } => {
                ApiError::Conflict(err.to_string())
            }
        }
    }
}

impl From<InventoryError> for ApiError {
    fn from(err: InventoryError) -> Self {
        match &err {
            InventoryError::UnknownVariant(_) => ApiError::NotFound(err.to_string()),
            InventoryError::InsufficientStock { .. }
            | InventoryError::ReservationShortfall { .. } => ApiError::Conflict(err.to_string()),
        }
    }
}

impl From<CartError> for ApiError {
    fn from(err: CartError) -> Self {
        match err {
            CartError::CartNotFound(_) | CartError::ItemNotFound(_) => {
                ApiError::NotFound(err.to_string())
            }
            CartError::EmptyCart(_) | CartError::InvalidQuantity(_) => {
                ApiError::BadRequest(err.to_string())
            }
            CartError::Catalog(inner) => inner.into(),
            CartError::Inventory(inner) => inner.into(),
        }
    }
}

impl From<OrderError> for ApiError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::OrderNotFound(_) | OrderError::OrderNumberNotFound(_) => {
                ApiError::NotFound(err.to_string())
            }
            OrderError::InvalidTransition { .. } => ApiError::Conflict(err.to_string()),
            OrderError::Inventory(inner) => inner.into(),
        }
    }
}

impl From<CheckoutError> for ApiError {
    fn from(err: CheckoutError) -> Self {
        match err {
            CheckoutError::PaymentFailed { .. } => ApiError::PaymentRequired(err.to_string()),
            CheckoutError::VariantMissing(_) => ApiError::Conflict(err.to_string()),
            CheckoutError::Cart(inner) => inner.into(),
            CheckoutError::Catalog(inner) => inner.into(),
            CheckoutError::Inventory(inner) => inner.into(),
        }
    }
}
