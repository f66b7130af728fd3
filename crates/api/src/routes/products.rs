//! Product catalog and stock endpoints.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use catalog::{
    AttributeValue, Money, Product, ProductId, RatingSummary, Variant, VariantId, VariantKey,
};
use inventory::InventoryLedger;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::state::AppState;

// -- Request types --

#[derive(Deserialize)]
pub struct CreateProductRequest {
    pub id: String,
    pub name: String,
    pub brand: String,
    pub base_price_cents: i64,
    pub variants: Vec<VariantRequest>,
}

#[derive(Deserialize)]
pub struct VariantRequest {
    pub variant_id: String,
    pub sku: String,
    pub name: String,
    pub price_cents: i64,
    #[serde(default)]
    pub attributes: BTreeMap<String, AttributeValue>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Deserialize)]
pub struct SetStockRequest {
    pub quantity: u32,
}

// -- Response types --

#[derive(Serialize)]
pub struct ProductResponse {
    pub id: String,
    pub name: String,
    pub brand: String,
    pub base_price_cents: i64,
    pub min_price_cents: i64,
    pub max_price_cents: i64,
    pub variants: Vec<VariantResponse>,
    pub rating: RatingResponse,
    pub created_at: String,
}

#[derive(Serialize)]
pub struct VariantResponse {
    pub variant_id: String,
    pub sku: String,
    pub name: String,
    pub price_cents: i64,
    pub attributes: BTreeMap<String, AttributeValue>,
    pub is_active: bool,
}

#[derive(Serialize)]
pub struct RatingResponse {
    pub average_rating: f64,
    pub total_reviews: u64,
    pub histogram: [u64; 5],
}

#[derive(Serialize)]
pub struct StockResponse {
    pub product_id: String,
    pub variant_id: String,
    pub quantity: u32,
    pub reserved: u32,
    pub available: u32,
}

pub(crate) fn rating_response(summary: &RatingSummary) -> RatingResponse {
    RatingResponse {
        average_rating: summary.average_rating,
        total_reviews: summary.total_reviews,
        histogram: std::array::from_fn(|i| summary.star_count(i as u8 + 1)),
    }
}

pub(crate) fn product_response(product: &Product) -> ProductResponse {
    let (min_price, max_price) = product.price_range();
    ProductResponse {
        id: product.id.to_string(),
        name: product.name.clone(),
        brand: product.brand.clone(),
        base_price_cents: product.base_price.cents(),
        min_price_cents: min_price.cents(),
        max_price_cents: max_price.cents(),
        variants: product
            .variants
            .iter()
            .map(|v| VariantResponse {
                variant_id: v.variant_id.to_string(),
                sku: v.sku.clone(),
                name: v.name.clone(),
                price_cents: v.price.cents(),
                attributes: v.attributes.clone(),
                is_active: v.is_active,
            })
            .collect(),
        rating: rating_response(product.rating_summary()),
        created_at: product.created_at.to_rfc3339(),
    }
}

// -- Handlers --

/// POST /products — register a product with its variants.
#[tracing::instrument(skip(state, req))]
pub async fn create<L: InventoryLedger + 'static>(
    State(state): State<Arc<AppState<L>>>,
    Json(req): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<ProductResponse>), ApiError> {
    if req.variants.is_empty() {
        return Err(ApiError::BadRequest(
            "a product needs at least one variant".to_string(),
        ));
    }

    let variants: Vec<Variant> = req
        .variants
        .into_iter()
        .map(|v| {
            let mut variant = Variant::new(
                v.variant_id.as_str(),
                v.sku,
                v.name,
                Money::from_cents(v.price_cents),
            );
            variant.attributes = v.attributes;
            variant.is_active = v.is_active;
            variant
        })
        .collect();

    let product = Product::new(
        req.id,
        req.name,
        req.brand,
        Money::from_cents(req.base_price_cents),
        variants,
    );
    let response = product_response(&product);
    state.products.insert(product).await;

    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /products — list all products.
#[tracing::instrument(skip(state))]
pub async fn list<L: InventoryLedger + 'static>(
    State(state): State<Arc<AppState<L>>>,
) -> Json<Vec<ProductResponse>> {
    let products = state.products.all().await;
    Json(products.iter().map(product_response).collect())
}

/// GET /products/:id — fetch a single product.
#[tracing::instrument(skip(state))]
pub async fn get<L: InventoryLedger + 'static>(
    State(state): State<Arc<AppState<L>>>,
    Path(id): Path<String>,
) -> Result<Json<ProductResponse>, ApiError> {
    let product = state.products.get(&ProductId::new(id)).await?;
    Ok(Json(product_response(&product)))
}

/// PUT /products/:id/variants/:variant_id/stock — set on-hand quantity.
#[tracing::instrument(skip(state, req))]
pub async fn set_stock<L: InventoryLedger + 'static>(
    State(state): State<Arc<AppState<L>>>,
    Path((id, variant_id)): Path<(String, String)>,
    Json(req): Json<SetStockRequest>,
) -> Result<Json<StockResponse>, ApiError> {
    let key = VariantKey::new(id.as_str(), variant_id.as_str());

    // Only variants the catalog knows about get ledger entries.
    let product = state.products.get(&key.product_id).await?;
    if product.variant(&VariantId::new(variant_id)).is_none() {
        return Err(ApiError::NotFound(format!("variant not found: {key}")));
    }

    let level = state.ledger.set_stock(&key, req.quantity).await;
    Ok(Json(StockResponse {
        product_id: key.product_id.to_string(),
        variant_id: key.variant_id.to_string(),
        quantity: level.quantity,
        reserved: level.reserved,
        available: level.available(),
    }))
}

/// GET /products/:id/variants/:variant_id/stock — current stock position.
#[tracing::instrument(skip(state))]
pub async fn stock<L: InventoryLedger + 'static>(
    State(state): State<Arc<AppState<L>>>,
    Path((id, variant_id)): Path<(String, String)>,
) -> Result<Json<StockResponse>, ApiError> {
    let key = VariantKey::new(id.as_str(), variant_id.as_str());
    let level = state.ledger.stock(&key).await?;
    Ok(Json(StockResponse {
        product_id: key.product_id.to_string(),
        variant_id: key.variant_id.to_string(),
        quantity: level.quantity,
        reserved: level.reserved,
        available: level.available(),
    }))
}
