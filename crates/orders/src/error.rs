use cart::CartError;
use catalog::{CatalogError, VariantKey};
use common::OrderId;
use inventory::InventoryError;
use thiserror::Error;

use crate::status::OrderStatus;

/// Errors raised by order lifecycle operations.
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("order not found: {0}")]
    OrderNotFound(OrderId),

    #[error("order not found: {0}")]
    OrderNumberNotFound(String),

    #[error("invalid status transition: {from} -> {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error(transparent)]
    Inventory(#[from] InventoryError),
}

/// Errors raised by checkout.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("payment declined: {reason}")]
    PaymentFailed { reason: String },

    #[error("variant no longer in catalog: {0}")]
    VariantMissing(VariantKey),

    #[error(transparent)]
    Cart(#[from] CartError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Inventory(#[from] InventoryError),
}
