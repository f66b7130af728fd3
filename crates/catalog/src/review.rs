//! Customer reviews and moderation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{CustomerId, OrderId, ReviewId};
use serde::{Deserialize, Serialize};

use crate::product::ProductId;

/// Moderation status of a review.
///
/// Only approved reviews contribute to a product's rating summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    Pending,
    Approved,
    Rejected,
}

impl ReviewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewStatus::Pending => "pending",
            ReviewStatus::Approved => "approved",
            ReviewStatus::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A customer review of a product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub id: ReviewId,
    pub product_id: ProductId,
    pub customer_id: CustomerId,

    /// Order the reviewer cites as their purchase, if any.
    pub order_id: Option<OrderId>,

    /// Star rating, 1 through 5.
    pub rating: u8,

    pub title: String,
    pub body: String,

    /// Set at submission time from the customer's fulfilled orders; never
    /// claimed by the customer directly.
    pub verified_purchase: bool,

    pub status: ReviewStatus,

    /// Count of "helpful" votes.
    pub helpful_votes: u64,

    /// Total votes cast, helpful or not.
    pub total_votes: u64,

    pub created_at: DateTime<Utc>,
}

/// Input for submitting a review.
#[derive(Debug, Clone, Deserialize)]
pub struct NewReview {
    pub product_id: ProductId,
    #[serde(default)]
    pub order_id: Option<OrderId>,
    pub rating: u8,
    pub title: String,
    pub body: String,
}

/// Decides the initial moderation status of a submitted review.
pub trait ModerationPolicy: Send + Sync {
    fn classify(&self, review: &Review) -> ReviewStatus;
}

/// Approves every review immediately.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoApprove;

impl ModerationPolicy for AutoApprove {
    fn classify(&self, _review: &Review) -> ReviewStatus {
        ReviewStatus::Approved
    }
}

/// Queues every review for manual moderation.
#[derive(Debug, Clone, Copy, Default)]
pub struct HoldForReview;

impl ModerationPolicy for HoldForReview {
    fn classify(&self, _review: &Review) -> ReviewStatus {
        ReviewStatus::Pending
    }
}

/// Checks whether a customer has a fulfilled purchase of a product.
///
/// Implemented against the order store; the catalog only depends on this
/// seam so reviews can be marked `verified_purchase`.
#[async_trait]
pub trait PurchaseVerifier: Send + Sync {
    async fn has_fulfilled_purchase(&self, customer_id: CustomerId, product_id: &ProductId)
    -> bool;
}

/// A verifier that never confirms a purchase. Useful in tests and for
/// deployments without order history access.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPurchaseHistory;

#[async_trait]
impl PurchaseVerifier for NoPurchaseHistory {
    async fn has_fulfilled_purchase(
        &self,
        _customer_id: CustomerId,
        _product_id: &ProductId,
    ) -> bool {
        false
    }
}
