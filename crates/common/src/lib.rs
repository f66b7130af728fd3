pub mod types;

pub use types::{Address, CartOwner, CustomerId, OrderId, ReviewId, SessionId};
