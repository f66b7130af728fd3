//! Cart endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use catalog::VariantKey;
use cart::{Cart, CartTotals};
use inventory::InventoryLedger;
use serde::{Deserialize, Serialize};

use crate::context::RequestContext;
use crate::error::ApiError;
use crate::state::AppState;

// -- Request types --

#[derive(Deserialize)]
pub struct CartItemRequest {
    pub product_id: String,
    pub variant_id: String,
    pub quantity: u32,
}

// -- Response types --

#[derive(Serialize)]
pub struct CartResponse {
    pub owner: String,
    pub items: Vec<CartLineResponse>,
    pub totals: CartTotalsResponse,
    pub holds_reservations: bool,
    pub expires_at: String,
}

#[derive(Serialize)]
pub struct CartLineResponse {
    pub product_id: String,
    pub variant_id: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
    pub line_total_cents: i64,
}

#[derive(Serialize)]
pub struct CartTotalsResponse {
    pub item_count: u32,
    pub subtotal_cents: i64,
    pub estimated_tax_cents: i64,
    pub estimated_shipping_cents: i64,
    pub estimated_total_cents: i64,
}

fn cart_response(cart: &Cart, totals: &CartTotals) -> CartResponse {
    CartResponse {
        owner: cart.owner.to_string(),
        items: cart
            .items
            .iter()
            .map(|item| CartLineResponse {
                product_id: item.product_id.to_string(),
                variant_id: item.variant_id.to_string(),
                quantity: item.quantity,
                unit_price_cents: item.unit_price.cents(),
                line_total_cents: item.line_total().cents(),
            })
            .collect(),
        totals: CartTotalsResponse {
            item_count: totals.item_count,
            subtotal_cents: totals.subtotal.cents(),
            estimated_tax_cents: totals.estimated_tax.cents(),
            estimated_shipping_cents: totals.estimated_shipping.cents(),
            estimated_total_cents: totals.estimated_total.cents(),
        },
        holds_reservations: cart.holds_reservations,
        expires_at: cart.expires_at.to_rfc3339(),
    }
}

// -- Handlers --

/// GET /cart — the caller's cart with computed totals.
#[tracing::instrument(skip(state, ctx))]
pub async fn view<L: InventoryLedger + 'static>(
    State(state): State<Arc<AppState<L>>>,
    ctx: RequestContext,
) -> Result<Json<CartResponse>, ApiError> {
    let owner = ctx.owner()?;
    let (cart, totals) = state.carts.totals(&owner).await?;
    Ok(Json(cart_response(&cart, &totals)))
}

/// POST /cart/items — add a variant to the cart.
#[tracing::instrument(skip(state, ctx, req))]
pub async fn add_item<L: InventoryLedger + 'static>(
    State(state): State<Arc<AppState<L>>>,
    ctx: RequestContext,
    Json(req): Json<CartItemRequest>,
) -> Result<Json<CartResponse>, ApiError> {
    let owner = ctx.owner()?;
    let key = VariantKey::new(req.product_id.as_str(), req.variant_id.as_str());
    let cart = state.carts.add_item(&owner, &key, req.quantity).await?;
    let totals = state.carts.totals_for(&cart.items, None);
    Ok(Json(cart_response(&cart, &totals)))
}

/// PUT /cart/items — set a line's quantity (0 removes it).
#[tracing::instrument(skip(state, ctx, req))]
pub async fn update_item<L: InventoryLedger + 'static>(
    State(state): State<Arc<AppState<L>>>,
    ctx: RequestContext,
    Json(req): Json<CartItemRequest>,
) -> Result<Json<CartResponse>, ApiError> {
    let owner = ctx.owner()?;
    let key = VariantKey::new(req.product_id.as_str(), req.variant_id.as_str());
    let cart = state.carts.update_item(&owner, &key, req.quantity).await?;
    let totals = state.carts.totals_for(&cart.items, None);
    Ok(Json(cart_response(&cart, &totals)))
}

/// DELETE /cart/items/:product_id/:variant_id — remove a line.
#[tracing::instrument(skip(state, ctx))]
pub async fn remove_item<L: InventoryLedger + 'static>(
    State(state): State<Arc<AppState<L>>>,
    ctx: RequestContext,
    Path((product_id, variant_id)): Path<(String, String)>,
) -> Result<Json<CartResponse>, ApiError> {
    let owner = ctx.owner()?;
    let key = VariantKey::new(product_id.as_str(), variant_id.as_str());
    let cart = state.carts.remove_item(&owner, &key).await?;
    let totals = state.carts.totals_for(&cart.items, None);
    Ok(Json(cart_response(&cart, &totals)))
}

/// POST /cart/merge — fold the caller's session cart into their customer
/// cart at sign-in. Requires both identity headers.
#[tracing::instrument(skip(state, ctx))]
pub async fn merge<L: InventoryLedger + 'static>(
    State(state): State<Arc<AppState<L>>>,
    ctx: RequestContext,
) -> Result<Json<CartResponse>, ApiError> {
    let customer_id = ctx.require_customer()?;
    let session_id = ctx
        .session_id
        .ok_or_else(|| ApiError::BadRequest("x-session-id header required".to_string()))?;

    let cart = state.carts.merge(session_id, customer_id).await?;
    let totals = state.carts.totals_for(&cart.items, None);
    Ok(Json(cart_response(&cart, &totals)))
}
