use catalog::VariantKey;
use thiserror::Error;

/// Errors raised by ledger operations.
#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("variant not tracked by the ledger: {0}")]
    UnknownVariant(VariantKey),

    #[error("insufficient stock for {variant}: requested {requested}, available {available}")]
    InsufficientStock {
        variant: VariantKey,
        requested: u32,
        available: u32,
    },

    #[error("cannot commit {requested} units for {variant}: only {reserved} reserved")]
    ReservationShortfall {
        variant: VariantKey,
        requested: u32,
        reserved: u32,
    },
}
