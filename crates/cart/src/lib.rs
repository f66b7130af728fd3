//! Shopping carts with inventory-backed line items.
//!
//! Every line item in a live cart is backed by a reservation in the
//! inventory ledger, so two shoppers can never both hold the last unit.
//! Carts expire after a period of inactivity, returning their holds.

pub mod cart;
pub mod error;
pub mod pricing;
pub mod service;

pub use cart::{Cart, CartTotals, LineItem};
pub use error::CartError;
pub use pricing::{PricingEstimate, PricingPolicy, StandardPricing};
pub use service::CartService;
