//! Order lifecycle and checkout.
//!
//! Orders are created by checkout from a validated cart snapshot and move
//! through a fixed status machine. Every transition is recorded on an
//! append-only timeline. Shipping commits the inventory reservations the
//! checkout inherited from the cart; cancellation releases them.

pub mod checkout;
pub mod error;
pub mod order;
pub mod payment;
pub mod service;
pub mod status;
pub mod store;
pub mod verify;

pub use checkout::{CheckoutRequest, CheckoutService};
pub use error::{CheckoutError, OrderError};
pub use order::{Order, OrderItem, OrderSummary, PaymentRecord, TimelineEntry};
pub use payment::{
    ChargeReceipt, InMemoryPaymentProcessor, PaymentDeclined, PaymentMethod, PaymentProcessor,
};
pub use service::OrderService;
pub use status::OrderStatus;
pub use store::OrderStore;
