//! Review and rating endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use catalog::{NewReview, ProductId, Review};
use common::{OrderId, ReviewId};
use inventory::InventoryLedger;
use serde::{Deserialize, Serialize};

use crate::context::RequestContext;
use crate::error::ApiError;
use crate::routes::products::{RatingResponse, rating_response};
use crate::state::AppState;

// -- Request types --

#[derive(Deserialize)]
pub struct SubmitReviewRequest {
    #[serde(default)]
    pub order_id: Option<OrderId>,
    pub rating: u8,
    pub title: String,
    pub body: String,
}

#[derive(Deserialize)]
pub struct VoteRequest {
    pub helpful: bool,
}

// -- Response types --

#[derive(Serialize)]
pub struct ReviewResponse {
    pub id: String,
    pub product_id: String,
    pub customer_id: String,
    pub rating: u8,
    pub title: String,
    pub body: String,
    pub verified_purchase: bool,
    pub status: String,
    pub helpful_votes: u64,
    pub total_votes: u64,
    pub created_at: String,
}

fn review_response(review: &Review) -> ReviewResponse {
    ReviewResponse {
        id: review.id.to_string(),
        product_id: review.product_id.to_string(),
        customer_id: review.customer_id.to_string(),
        rating: review.rating,
        title: review.title.clone(),
        body: review.body.clone(),
        verified_purchase: review.verified_purchase,
        status: review.status.to_string(),
        helpful_votes: review.helpful_votes,
        total_votes: review.total_votes,
        created_at: review.created_at.to_rfc3339(),
    }
}

fn parse_review_id(id: &str) -> Result<ReviewId, ApiError> {
    let uuid = uuid::Uuid::parse_str(id)
        .map_err(|e| ApiError::BadRequest(format!("invalid review ID: {e}")))?;
    Ok(ReviewId::from_uuid(uuid))
}

// -- Handlers --

/// POST /products/:id/reviews — submit a review.
#[tracing::instrument(skip(state, ctx, req))]
pub async fn submit<L: InventoryLedger + 'static>(
    State(state): State<Arc<AppState<L>>>,
    ctx: RequestContext,
    Path(id): Path<String>,
    Json(req): Json<SubmitReviewRequest>,
) -> Result<(StatusCode, Json<ReviewResponse>), ApiError> {
    let customer_id = ctx.require_customer()?;
    let review = state
        .reviews
        .submit(
            customer_id,
            NewReview {
                product_id: ProductId::new(id),
                order_id: req.order_id,
                rating: req.rating,
                title: req.title,
                body: req.body,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(review_response(&review))))
}

/// GET /products/:id/reviews — approved reviews, newest first.
#[tracing::instrument(skip(state))]
pub async fn list<L: InventoryLedger + 'static>(
    State(state): State<Arc<AppState<L>>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<ReviewResponse>>, ApiError> {
    let product_id = ProductId::new(id);
    // 404 for unknown products rather than an empty list.
    state.products.get(&product_id).await?;
    let reviews = state.reviews.list_for_product(&product_id, true).await;
    Ok(Json(reviews.iter().map(review_response).collect()))
}

/// GET /products/:id/rating — the product's cached rating summary.
#[tracing::instrument(skip(state))]
pub async fn rating<L: InventoryLedger + 'static>(
    State(state): State<Arc<AppState<L>>>,
    Path(id): Path<String>,
) -> Result<Json<RatingResponse>, ApiError> {
    let product = state.products.get(&ProductId::new(id)).await?;
    Ok(Json(rating_response(product.rating_summary())))
}

/// POST /reviews/:id/vote — record a helpfulness vote.
#[tracing::instrument(skip(state, ctx, req))]
pub async fn vote<L: InventoryLedger + 'static>(
    State(state): State<Arc<AppState<L>>>,
    ctx: RequestContext,
    Path(id): Path<String>,
    Json(req): Json<VoteRequest>,
) -> Result<Json<ReviewResponse>, ApiError> {
    let customer_id = ctx.require_customer()?;
    let review = state
        .reviews
        .vote(parse_review_id(&id)?, customer_id, req.helpful)
        .await?;
    Ok(Json(review_response(&review)))
}

/// POST /reviews/:id/approve — approve a review (moderation).
#[tracing::instrument(skip(state))]
pub async fn approve<L: InventoryLedger + 'static>(
    State(state): State<Arc<AppState<L>>>,
    Path(id): Path<String>,
) -> Result<Json<ReviewResponse>, ApiError> {
    let review = state.reviews.approve(parse_review_id(&id)?).await?;
    Ok(Json(review_response(&review)))
}

/// POST /reviews/:id/reject — reject a review (moderation).
#[tracing::instrument(skip(state))]
pub async fn reject<L: InventoryLedger + 'static>(
    State(state): State<Arc<AppState<L>>>,
    Path(id): Path<String>,
) -> Result<Json<ReviewResponse>, ApiError> {
    let review = state.reviews.reject(parse_review_id(&id)?).await?;
    Ok(Json(review_response(&review)))
}
