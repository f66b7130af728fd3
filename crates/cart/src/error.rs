use catalog::{CatalogError, VariantKey};
use common::CartOwner;
use inventory::InventoryError;
use thiserror::Error;

/// Errors raised by cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    #[error("no cart for {0}")]
    CartNotFound(CartOwner),

    #[error("cart for {0} is empty")]
    EmptyCart(CartOwner),

    #[error("item not in cart: {0}")]
    ItemNotFound(VariantKey),

    #[error("invalid quantity: {0}")]
    InvalidQuantity(u32),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Inventory(#[from] InventoryError),
}
