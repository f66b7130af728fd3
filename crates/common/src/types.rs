use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates an identifier from an existing UUID.
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the underlying UUID.
            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

uuid_id! {
    /// Unique identifier for a registered customer.
    ///
    /// Wraps a UUID to prevent mixing up customer identifiers with other
    /// UUID-based identifiers.
    CustomerId
}

uuid_id! {
    /// Identifier for an anonymous browsing session.
    SessionId
}

uuid_id! {
    /// Unique identifier for an order.
    OrderId
}

uuid_id! {
    /// Unique identifier for a product review.
    ReviewId
}

/// The owner of a shopping cart: either a registered customer or an
/// anonymous session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum CartOwner {
    /// A cart belonging to a signed-in customer.
    Customer(CustomerId),

    /// A cart belonging to an anonymous browsing session.
    Anonymous(SessionId),
}

impl CartOwner {
    /// Returns the customer ID if this is a customer-owned cart.
    pub fn customer_id(&self) -> Option<CustomerId> {
        match self {
            CartOwner::Customer(id) => Some(*id),
            CartOwner::Anonymous(_) => None,
        }
    }
}

impl std::fmt::Display for CartOwner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CartOwner::Customer(id) => write!(f, "customer:{id}"),
            CartOwner::Anonymous(id) => write!(f, "session:{id}"),
        }
    }
}

/// A postal address.
///
/// Orders keep their own copy of the shipping and billing address at the
/// time of checkout; there is no live reference back to a mutable address
/// book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub recipient: String,
    pub line1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line2: Option<String>,
    pub city: String,
    pub region: String,
    pub postal_code: String,
    pub country: String,
}
