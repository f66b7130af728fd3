//! Per-variant inventory ledger.
//!
//! Tracks on-hand quantity and active reservations per variant. Reservations
//! hold stock for in-flight carts and checkouts; committing a reservation
//! turns the hold into a real decrement when an order ships.

pub mod error;
pub mod ledger;

pub use error::InventoryError;
pub use ledger::{InMemoryLedger, InventoryLedger, StockLevel};
