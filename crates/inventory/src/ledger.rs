//! Ledger trait and its in-memory implementation.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use catalog::VariantKey;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::error::InventoryError;

/// Stock position of a single variant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLevel {
    /// Units physically on hand.
    pub quantity: u32,

    /// Units held by active reservations. Never exceeds `quantity`.
    pub reserved: u32,
}

impl StockLevel {
    /// Units available for new reservations.
    pub fn available(&self) -> u32 {
        self.quantity.saturating_sub(self.reserved)
    }
}

/// Inventory operations.
///
/// Each call is atomic with respect to the others: a reservation either
/// takes the full requested amount or fails leaving the ledger unchanged.
#[async_trait]
pub trait InventoryLedger: Send + Sync {
    /// Sets the on-hand quantity for a variant, creating the entry if
    /// needed. The quantity is clamped so it never drops below the amount
    /// currently reserved.
    async fn set_stock(&self, variant: &VariantKey, quantity: u32) -> StockLevel;

    /// Returns the current stock position of a variant.
    async fn stock(&self, variant: &VariantKey) -> Result<StockLevel, InventoryError>;

    /// Places a hold on `quantity` units.
    ///
    /// Fails with [`InventoryError::InsufficientStock`] when fewer than
    /// `quantity` units are available, in which case nothing is held.
    async fn reserve(
        &self,
        variant: &VariantKey,
        quantity: u32,
    ) -> Result<StockLevel, InventoryError>;

    /// Releases up to `quantity` held units back to availability.
    ///
    /// Releasing more than is currently reserved floors the reservation at
    /// zero rather than failing, so compensation paths stay idempotent.
    async fn release(
        &self,
        variant: &VariantKey,
        quantity: u32,
    ) -> Result<StockLevel, InventoryError>;

    /// Converts `quantity` held units into a real stock decrement.
    ///
    /// Both `quantity` and `reserved` drop by the amount. Fails with
    /// [`InventoryError::ReservationShortfall`] when fewer units are
    /// reserved than requested.
    async fn commit(
        &self,
        variant: &VariantKey,
        quantity: u32,
    ) -> Result<StockLevel, InventoryError>;
}

/// In-memory ledger backed by a single `RwLock`-guarded map.
///
/// All mutating operations take the write lock for their full duration,
/// which is what makes concurrent reservations against the same variant
/// serialize correctly.
#[derive(Clone, Default)]
pub struct InMemoryLedger {
    levels: Arc<RwLock<HashMap<VariantKey, StockLevel>>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl InventoryLedger for InMemoryLedger {
    async fn set_stock(&self, variant: &VariantKey, quantity: u32) -> StockLevel {
        let mut levels = self.levels.write().await;
        let level = levels.entry(variant.clone()).or_default();
        // Restocks below the reserved amount would make holds unbacked.
        level.quantity = quantity.max(level.reserved);
        debug!(variant = %variant, quantity = level.quantity, reserved = level.reserved, "Stock set");
        *level
    }

    async fn stock(&self, variant: &VariantKey) -> Result<StockLevel, InventoryError> {
        let levels = self.levels.read().await;
        levels
            .get(variant)
            .copied()
            .ok_or_else(|| InventoryError::UnknownVariant(variant.clone()))
    }

    async fn reserve(
        &self,
        variant: &VariantKey,
        quantity: u32,
    ) -> Result<StockLevel, InventoryError> {
        let mut levels = self.levels.write().await;
        let level = levels
            .get_mut(variant)
            .ok_or_else(|| InventoryError::UnknownVariant(variant.clone()))?;

        let available = level.available();
        if available < quantity {
            warn!(
                variant = %variant,
                requested = quantity,
                available,
                "Reservation rejected"
            );
            metrics::counter!("inventory_reservations_rejected_total").increment(1);
            return Err(InventoryError::InsufficientStock {
                variant: variant.clone(),
                requested: quantity,
                available,
            });
        }

        level.reserved += quantity;
        metrics::counter!("inventory_reservations_total").increment(1);
        debug!(variant = %variant, quantity, reserved = level.reserved, "Stock reserved");
        Ok(*level)
    }

    async fn release(
        &self,
        variant: &VariantKey,
        quantity: u32,
    ) -> Result<StockLevel, InventoryError> {
        let mut levels = self.levels.write().await;
        let level = levels
            .get_mut(variant)
            .ok_or_else(|| InventoryError::UnknownVariant(variant.clone()))?;

        level.reserved = level.reserved.saturating_sub(quantity);
        metrics::counter!("inventory_releases_total").increment(1);
        debug!(variant = %variant, quantity, reserved = level.reserved, "Reservation released");
        Ok(*level)
    }

    async fn commit(
        &self,
        variant: &VariantKey,
        quantity: u32,
    ) -> Result<StockLevel, InventoryError> {
        let mut levels = self.levels.write().await;
        let level = levels
            .get_mut(variant)
            .ok_or_else(|| InventoryError::UnknownVariant(variant.clone()))?;

        if level.reserved < quantity {
            return Err(InventoryError::ReservationShortfall {
                variant: variant.clone(),
                requested: quantity,
                reserved: level.reserved,
            });
        }

        level.quantity -= quantity;
        level.reserved -= quantity;
        metrics::counter!("inventory_commits_total").increment(1);
        debug!(variant = %variant, quantity, remaining = level.quantity, "Reservation committed");
        Ok(*level)
    }
}
