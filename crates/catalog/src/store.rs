//! In-memory product store.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::error::CatalogError;
use crate::money::Money;
use crate::product::{Product, ProductId, RatingSummary, VariantKey};

/// Thread-safe in-memory store of catalog products.
#[derive(Clone, Default)]
pub struct ProductStore {
    products: Arc<RwLock<HashMap<ProductId, Product>>>,
}

impl ProductStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a product.
    pub async fn insert(&self, product: Product) {
        let mut products = self.products.write().await;
        products.insert(product.id.clone(), product);
    }

    /// Returns a product by ID.
    pub async fn get(&self, id: &ProductId) -> Result<Product, CatalogError> {
        let products = self.products.read().await;
        products
            .get(id)
            .cloned()
            .ok_or_else(|| CatalogError::ProductNotFound(id.clone()))
    }

    /// Returns all products, sorted by ID.
    pub async fn all(&self) -> Vec<Product> {
        let products = self.products.read().await;
        let mut all: Vec<Product> = products.values().cloned().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        all
    }

    /// Resolves the current price of an active variant.
    ///
    /// Fails if the product or variant is unknown, or the variant is
    /// inactive. Carts call this when adding a line so the price is
    /// captured at add time.
    pub async fn variant_price(&self, key: &VariantKey) -> Result<Money, CatalogError> {
        let products = self.products.read().await;
        let product = products
            .get(&key.product_id)
            .ok_or_else(|| CatalogError::ProductNotFound(key.product_id.clone()))?;
        let variant = product
            .variant(&key.variant_id)
            .ok_or_else(|| CatalogError::VariantNotFound(key.clone()))?;
        if !variant.is_active {
            return Err(CatalogError::InactiveVariant(key.clone()));
        }
        Ok(variant.price)
    }

    /// Writes a freshly recomputed rating summary onto a product.
    pub(crate) async fn apply_rating_summary(
        &self,
        id: &ProductId,
        summary: RatingSummary,
    ) -> Result<(), CatalogError> {
        let mut products = self.products.write().await;
        let product = products
            .get_mut(id)
            .ok_or_else(|| CatalogError::ProductNotFound(id.clone()))?;
        product.set_rating_summary(summary);
        Ok(())
    }
}
