//! Product catalog for the storefront core.
//!
//! This crate provides:
//! - [`Money`] as an integer-cents value object
//! - Product and variant models with a closed-scalar attribute map
//! - The derived [`RatingSummary`] cache, writable only through
//!   [`ReviewService::recompute_summary`]
//! - Review submission with verified-purchase detection behind the
//!   [`PurchaseVerifier`] seam and moderation behind [`ModerationPolicy`]

pub mod error;
pub mod money;
pub mod product;
pub mod review;
pub mod service;
pub mod store;

pub use error::CatalogError;
pub use money::Money;
pub use product::{
    AttributeValue, Product, ProductId, RatingSummary, Variant, VariantId, VariantKey,
};
pub use review::{
    AutoApprove, HoldForReview, ModerationPolicy, NewReview, NoPurchaseHistory, PurchaseVerifier,
    Review, ReviewStatus,
};
pub use service::ReviewService;
pub use store::ProductStore;
