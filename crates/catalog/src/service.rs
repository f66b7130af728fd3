//! Review submission, moderation, and rating-summary recomputation.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use common::{CustomerId, ReviewId};
use tokio::sync::RwLock;
use tracing::info;

use crate::error::CatalogError;
use crate::product::{ProductId, RatingSummary};
use crate::review::{ModerationPolicy, NewReview, PurchaseVerifier, Review, ReviewStatus};
use crate::store::ProductStore;

#[derive(Default)]
struct ReviewState {
    reviews: HashMap<ReviewId, Review>,
    // One vote per customer per review.
    votes: HashSet<(ReviewId, CustomerId)>,
}

/// Manages reviews for the products in a [`ProductStore`].
///
/// The service is the sole writer of each product's cached rating summary:
/// any change to the set of approved reviews triggers a full recomputation
/// from the surviving reviews, so the summary can never drift.
pub struct ReviewService {
    products: Arc<ProductStore>,
    state: RwLock<ReviewState>,
    verifier: Arc<dyn PurchaseVerifier>,
    moderation: Arc<dyn ModerationPolicy>,
}

impl ReviewService {
    pub fn new(
        products: Arc<ProductStore>,
        verifier: Arc<dyn PurchaseVerifier>,
        moderation: Arc<dyn ModerationPolicy>,
    ) -> Self {
        Self {
            products,
            state: RwLock::new(ReviewState::default()),
            verifier,
            moderation,
        }
    }

    /// Submits a review for a product.
    ///
    /// The rating must be 1-5, the product must exist, and a customer can
    /// review a product at most once. The `verified_purchase` flag is derived
    /// from the customer's fulfilled orders, not from the request.
    #[tracing::instrument(skip(self, review), fields(product_id = %review.product_id))]
    pub async fn submit(
        &self,
        customer_id: CustomerId,
        review: NewReview,
    ) -> Result<Review, CatalogError> {
        if !(1..=5).contains(&review.rating) {
            return Err(CatalogError::InvalidRating(review.rating));
        }
        // Existence check also guards against reviews for deleted products.
        self.products.get(&review.product_id).await?;

        {
            let state = self.state.read().await;
            if state
                .reviews
                .values()
                .any(|r| r.product_id == review.product_id && r.customer_id == customer_id)
            {
                return Err(CatalogError::DuplicateReview {
                    product_id: review.product_id,
                    customer_id,
                });
            }
        }

        let verified = self
            .verifier
            .has_fulfilled_purchase(customer_id, &review.product_id)
            .await;

        let mut stored = Review {
            id: ReviewId::new(),
            product_id: review.product_id.clone(),
            customer_id,
            order_id: review.order_id,
            rating: review.rating,
            title: review.title,
            body: review.body,
            verified_purchase: verified,
            status: ReviewStatus::Pending,
            helpful_votes: 0,
            total_votes: 0,
            created_at: Utc::now(),
        };
        stored.status = self.moderation.classify(&stored);

        let result = stored.clone();
        {
            // Re-check under the write lock: another submission by the same
            // customer may have landed while the verifier call was in flight.
            let mut state = self.state.write().await;
            if state
                .reviews
                .values()
                .any(|r| r.product_id == result.product_id && r.customer_id == customer_id)
            {
                return Err(CatalogError::DuplicateReview {
                    product_id: result.product_id,
                    customer_id,
                });
            }
            state.reviews.insert(stored.id, stored);
        }

        metrics::counter!("reviews_submitted_total").increment(1);
        info!(
            review_id = %result.id,
            status = %result.status,
            verified = result.verified_purchase,
            "Review submitted"
        );

        if result.status == ReviewStatus::Approved {
            self.recompute_summary(&result.product_id).await?;
        }
        Ok(result)
    }

    /// Approves a pending or rejected review and refreshes the summary.
    pub async fn approve(&self, review_id: ReviewId) -> Result<Review, CatalogError> {
        self.moderate(review_id, ReviewStatus::Approved).await
    }

    /// Rejects a review and refreshes the summary.
    pub async fn reject(&self, review_id: ReviewId) -> Result<Review, CatalogError> {
        self.moderate(review_id, ReviewStatus::Rejected).await
    }

    async fn moderate(
        &self,
        review_id: ReviewId,
        status: ReviewStatus,
    ) -> Result<Review, CatalogError> {
        let review = {
            let mut state = self.state.write().await;
            let review = state
                .reviews
                .get_mut(&review_id)
                .ok_or(CatalogError::ReviewNotFound(review_id))?;
            review.status = status;
            review.clone()
        };
        info!(review_id = %review_id, status = %status, "Review moderated");
        self.recompute_summary(&review.product_id).await?;
        Ok(review)
    }

    /// Records a helpfulness vote. Each customer may vote once per review.
    pub async fn vote(
        &self,
        review_id: ReviewId,
        customer_id: CustomerId,
        helpful: bool,
    ) -> Result<Review, CatalogError> {
        let mut state = self.state.write().await;
        if !state.reviews.contains_key(&review_id) {
            return Err(CatalogError::ReviewNotFound(review_id));
        }
        if !state.votes.insert((review_id, customer_id)) {
            return Err(CatalogError::DuplicateVote {
                review_id,
                customer_id,
            });
        }
        let review = state
            .reviews
            .get_mut(&review_id)
            .ok_or(CatalogError::ReviewNotFound(review_id))?;
        review.total_votes += 1;
        if helpful {
            review.helpful_votes += 1;
        }
        Ok(review.clone())
    }

    /// Returns a review by ID.
    pub async fn get(&self, review_id: ReviewId) -> Result<Review, CatalogError> {
        let state = self.state.read().await;
        state
            .reviews
            .get(&review_id)
            .cloned()
            .ok_or(CatalogError::ReviewNotFound(review_id))
    }

    /// Lists reviews for a product, newest first.
    ///
    /// With `approved_only` set, pending and rejected reviews are hidden;
    /// this is the customer-facing listing.
    pub async fn list_for_product(
        &self,
        product_id: &ProductId,
        approved_only: bool,
    ) -> Vec<Review> {
        let state = self.state.read().await;
        let mut reviews: Vec<Review> = state
            .reviews
            .values()
            .filter(|r| &r.product_id == product_id)
            .filter(|r| !approved_only || r.status == ReviewStatus::Approved)
            .cloned()
            .collect();
        reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        reviews
    }

    /// Recomputes a product's rating summary from its approved reviews and
    /// writes it back to the product store.
    pub async fn recompute_summary(
        &self,
        product_id: &ProductId,
    ) -> Result<RatingSummary, CatalogError> {
        let summary = {
            let state = self.state.read().await;
            let mut histogram = [0u64; 5];
            let mut sum: u64 = 0;
            let mut count: u64 = 0;
            for review in state.reviews.values() {
                if &review.product_id == product_id && review.status == ReviewStatus::Approved {
                    histogram[usize::from(review.rating) - 1] += 1;
                    sum += u64::from(review.rating);
                    count += 1;
                }
            }
            RatingSummary {
                average_rating: if count == 0 {
                    0.0
                } else {
                    sum as f64 / count as f64
                },
                total_reviews: count,
                histogram,
            }
        };
        self.products
            .apply_rating_summary(product_id, summary.clone())
            .await?;
        Ok(summary)
    }
}
