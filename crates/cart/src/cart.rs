//! Cart aggregate and totals.

use catalog::{Money, ProductId, VariantId, VariantKey};
use chrono::{DateTime, Duration, Utc};
use common::CartOwner;
use serde::{Deserialize, Serialize};

/// A line in a cart, holding the price captured when it was added.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItem {
    pub product_id: ProductId,
    pub variant_id: VariantId,
    pub quantity: u32,

    /// Price at the time the line was added; later catalog price changes do
    /// not affect it.
    pub unit_price: Money,

    pub added_at: DateTime<Utc>,
}

impl LineItem {
    /// The variant this line reserves stock for.
    pub fn key(&self) -> VariantKey {
        VariantKey {
            product_id: self.product_id.clone(),
            variant_id: self.variant_id.clone(),
        }
    }

    pub fn line_total(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }
}

/// Computed cart totals. Derived on demand, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartTotals {
    /// Total units across all lines.
    pub item_count: u32,
    pub subtotal: Money,
    pub estimated_tax: Money,
    pub estimated_shipping: Money,
    pub estimated_total: Money,
}

/// A shopper's cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cart {
    pub owner: CartOwner,
    pub items: Vec<LineItem>,

    /// Whether the lines are currently backed by ledger reservations.
    /// False after a failed checkout released them; the next mutation or
    /// checkout attempt re-reserves before proceeding.
    pub holds_reservations: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Cart {
    pub(crate) fn new(owner: CartOwner, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            owner,
            items: Vec::new(),
            holds_reservations: true,
            created_at: now,
            updated_at: now,
            expires_at: now + ttl,
        }
    }

    /// Bumps activity timestamps, pushing expiry out by the full TTL.
    pub(crate) fn touch(&mut self, ttl: Duration) {
        self.updated_at = Utc::now();
        self.expires_at = self.updated_at + ttl;
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub(crate) fn line_mut(&mut self, key: &VariantKey) -> Option<&mut LineItem> {
        self.items.iter_mut().find(|item| &item.key() == key)
    }

    pub fn line(&self, key: &VariantKey) -> Option<&LineItem> {
        self.items.iter().find(|item| &item.key() == key)
    }

    pub fn subtotal(&self) -> Money {
        self.items.iter().map(LineItem::line_total).sum()
    }

    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }
}
