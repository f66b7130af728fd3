use common::{CustomerId, ReviewId};
use thiserror::Error;

use crate::product::{ProductId, VariantKey};

/// Errors raised by catalog and review operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("product not found: {0}")]
    ProductNotFound(ProductId),

    #[error("variant not found: {0}")]
    VariantNotFound(VariantKey),

    #[error("variant is not active: {0}")]
    InactiveVariant(VariantKey),

    #[error("customer {customer_id} has already reviewed product {product_id}")]
    DuplicateReview {
        product_id: ProductId,
        customer_id: CustomerId,
    },

    #[error("review not found: {0}")]
    ReviewNotFound(ReviewId),

    #[error("rating must be between 1 and 5, got {0}")]
    InvalidRating(u8),

    #[error("customer {customer_id} has already voted on review {review_id}")]
    DuplicateVote {
        review_id: ReviewId,
        customer_id: CustomerId,
    },
}
