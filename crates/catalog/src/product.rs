//! Product and variant models.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

/// Product identifier (catalog-level SKU).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    /// Creates a new product ID from a string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the product ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ProductId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ProductId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Identifier for a purchasable variant within a product.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariantId(String);

impl VariantId {
    /// Creates a new variant ID from a string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the variant ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for VariantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for VariantId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Composite key identifying a purchasable SKU: `(product_id, variant_id)`.
///
/// This is the granularity at which stock is tracked.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VariantKey {
    pub product_id: ProductId,
    pub variant_id: VariantId,
}

impl VariantKey {
    /// Creates a variant key.
    pub fn new(product_id: impl Into<ProductId>, variant_id: impl Into<VariantId>) -> Self {
        Self {
            product_id: product_id.into(),
            variant_id: variant_id.into(),
        }
    }
}

impl std::fmt::Display for VariantKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.product_id, self.variant_id)
    }
}

/// A variant attribute value, restricted to a closed set of scalar types.
///
/// Free-form attribute maps are validated into this representation at the
/// boundary instead of being stored as untyped JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Text(String),
    Integer(i64),
    Flag(bool),
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        AttributeValue::Text(s.to_string())
    }
}

impl From<i64> for AttributeValue {
    fn from(v: i64) -> Self {
        AttributeValue::Integer(v)
    }
}

impl From<bool> for AttributeValue {
    fn from(v: bool) -> Self {
        AttributeValue::Flag(v)
    }
}

/// A purchasable variant of a product (e.g., a color/size combination).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variant {
    /// Variant identifier, unique within the product.
    pub variant_id: VariantId,

    /// Stock keeping unit for the variant.
    pub sku: String,

    /// Display name (e.g., "Midnight Blue / L").
    pub name: String,

    /// Current catalog price.
    pub price: Money,

    /// Variant attributes (color, size, ...).
    #[serde(default)]
    pub attributes: BTreeMap<String, AttributeValue>,

    /// Inactive variants cannot be added to carts.
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl Variant {
    /// Creates an active variant with no attributes.
    pub fn new(
        variant_id: impl Into<VariantId>,
        sku: impl Into<String>,
        name: impl Into<String>,
        price: Money,
    ) -> Self {
        Self {
            variant_id: variant_id.into(),
            sku: sku.into(),
            name: name.into(),
            price,
            attributes: BTreeMap::new(),
            is_active: true,
        }
    }
}

/// Cached rating summary for a product.
///
/// This is a derived view over approved reviews. It is recomputed as a whole
/// by the review service and never edited field by field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RatingSummary {
    /// Mean rating over approved reviews, 0.0 when there are none.
    pub average_rating: f64,

    /// Number of approved reviews.
    pub total_reviews: u64,

    /// Count of approved reviews per star value; index 0 holds 1-star counts.
    pub histogram: [u64; 5],
}

impl RatingSummary {
    /// Returns the count of approved reviews with the given star value (1-5).
    pub fn star_count(&self, star: u8) -> u64 {
        debug_assert!((1..=5).contains(&star));
        self.histogram[usize::from(star) - 1]
    }
}

/// A catalog product with its purchasable variants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub brand: String,
    pub base_price: Money,
    pub variants: Vec<Variant>,
    rating_summary: RatingSummary,
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// Creates a new product.
    pub fn new(
        id: impl Into<ProductId>,
        name: impl Into<String>,
        brand: impl Into<String>,
        base_price: Money,
        variants: Vec<Variant>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            brand: brand.into(),
            base_price,
            variants,
            rating_summary: RatingSummary::default(),
            created_at: Utc::now(),
        }
    }

    /// Returns the variant with the given ID, if any.
    pub fn variant(&self, variant_id: &VariantId) -> Option<&Variant> {
        self.variants.iter().find(|v| &v.variant_id == variant_id)
    }

    /// Returns the cached rating summary.
    pub fn rating_summary(&self) -> &RatingSummary {
        &self.rating_summary
    }

    /// Replaces the cached rating summary.
    ///
    /// Only the review service's recompute path calls this.
    pub(crate) fn set_rating_summary(&mut self, summary: RatingSummary) {
        self.rating_summary = summary;
    }

    /// Returns the `(min, max)` price across active variants.
    pub fn price_range(&self) -> (Money, Money) {
        let prices: Vec<Money> = self
            .variants
            .iter()
            .filter(|v| v.is_active)
            .map(|v| v.price)
            .collect();
        match (prices.iter().min(), prices.iter().max()) {
            (Some(min), Some(max)) => (*min, *max),
            _ => (Money::zero(), Money::zero()),
        }
    }
}
