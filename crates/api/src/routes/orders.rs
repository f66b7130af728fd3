//! Checkout and order lifecycle endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::OrderId;
use inventory::InventoryLedger;
use orders::{CheckoutRequest, Order};
use serde::{Deserialize, Serialize};

use crate::context::RequestContext;
use crate::error::ApiError;
use crate::state::AppState;

// -- Request types --

#[derive(Default, Deserialize)]
pub struct CancelRequest {
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Deserialize)]
pub struct ShipRequest {
    pub tracking_number: String,
}

// -- Response types --

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: String,
    pub order_number: String,
    pub status: String,
    pub items: Vec<OrderItemResponse>,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub shipping_cents: i64,
    pub total_cents: i64,
    pub payment: PaymentResponse,
    pub tracking_number: Option<String>,
    pub created_at: String,
}

#[derive(Serialize)]
pub struct OrderItemResponse {
    pub product_id: String,
    pub variant_id: String,
    pub sku: String,
    pub name: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
    pub total_cents: i64,
}

#[derive(Serialize)]
pub struct PaymentResponse {
    pub method: String,
    pub transaction_id: String,
    pub amount_cents: i64,
}

#[derive(Serialize)]
pub struct TimelineEntryResponse {
    pub status: String,
    pub timestamp: String,
    pub note: Option<String>,
}

fn order_response(order: &Order) -> OrderResponse {
    OrderResponse {
        id: order.id().to_string(),
        order_number: order.order_number().to_string(),
        status: order.status().to_string(),
        items: order
            .items()
            .iter()
            .map(|item| OrderItemResponse {
                product_id: item.product_id.to_string(),
                variant_id: item.variant_id.to_string(),
                sku: item.sku.clone(),
                name: item.name.clone(),
                quantity: item.quantity,
                unit_price_cents: item.unit_price.cents(),
                total_cents: item.total.cents(),
            })
            .collect(),
        subtotal_cents: order.summary().subtotal.cents(),
        tax_cents: order.summary().tax.cents(),
        shipping_cents: order.summary().shipping.cents(),
        total_cents: order.summary().total.cents(),
        payment: PaymentResponse {
            method: order.payment().method.to_string(),
            transaction_id: order.payment().transaction_id.clone(),
            amount_cents: order.payment().amount.cents(),
        },
        tracking_number: order.tracking_number().map(String::from),
        created_at: order.created_at().to_rfc3339(),
    }
}

fn parse_order_id(id: &str) -> Result<OrderId, ApiError> {
    let uuid = uuid::Uuid::parse_str(id)
        .map_err(|e| ApiError::BadRequest(format!("invalid order ID: {e}")))?;
    Ok(OrderId::from_uuid(uuid))
}

// -- Handlers --

/// POST /checkout — place an order from the caller's cart.
#[tracing::instrument(skip(state, ctx, req))]
pub async fn checkout<L: InventoryLedger + 'static>(
    State(state): State<Arc<AppState<L>>>,
    ctx: RequestContext,
    Json(req): Json<CheckoutRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    let customer_id = ctx.require_customer()?;
    let order = state.checkout.checkout(customer_id, req).await?;
    Ok((StatusCode::CREATED, Json(order_response(&order))))
}

/// GET /orders — the caller's orders, newest first.
#[tracing::instrument(skip(state, ctx))]
pub async fn list<L: InventoryLedger + 'static>(
    State(state): State<Arc<AppState<L>>>,
    ctx: RequestContext,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let customer_id = ctx.require_customer()?;
    let orders = state.orders.store().list_for_customer(customer_id).await;
    Ok(Json(orders.iter().map(order_response).collect()))
}

/// GET /orders/:id — a single order.
#[tracing::instrument(skip(state))]
pub async fn get<L: InventoryLedger + 'static>(
    State(state): State<Arc<AppState<L>>>,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order = state.orders.store().get(parse_order_id(&id)?).await?;
    Ok(Json(order_response(&order)))
}

/// GET /orders/number/:order_number — look up an order by its number.
#[tracing::instrument(skip(state))]
pub async fn get_by_number<L: InventoryLedger + 'static>(
    State(state): State<Arc<AppState<L>>>,
    Path(order_number): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order = state.orders.store().get_by_number(&order_number).await?;
    Ok(Json(order_response(&order)))
}

/// GET /orders/:id/timeline — the order's status history.
#[tracing::instrument(skip(state))]
pub async fn timeline<L: InventoryLedger + 'static>(
    State(state): State<Arc<AppState<L>>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<TimelineEntryResponse>>, ApiError> {
    let order = state.orders.store().get(parse_order_id(&id)?).await?;
    Ok(Json(
        order
            .timeline()
            .iter()
            .map(|entry| TimelineEntryResponse {
                status: entry.status.to_string(),
                timestamp: entry.timestamp.to_rfc3339(),
                note: entry.note.clone(),
            })
            .collect(),
    ))
}

/// POST /orders/:id/cancel — cancel a pending or processing order.
#[tracing::instrument(skip(state, req))]
pub async fn cancel<L: InventoryLedger + 'static>(
    State(state): State<Arc<AppState<L>>>,
    Path(id): Path<String>,
    req: Option<Json<CancelRequest>>,
) -> Result<Json<OrderResponse>, ApiError> {
    let reason = req.and_then(|Json(req)| req.reason);
    let order = state.orders.cancel(parse_order_id(&id)?, reason).await?;
    Ok(Json(order_response(&order)))
}

/// POST /orders/:id/processing — mark a pending order as processing.
#[tracing::instrument(skip(state))]
pub async fn mark_processing<L: InventoryLedger + 'static>(
    State(state): State<Arc<AppState<L>>>,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order = state.orders.mark_processing(parse_order_id(&id)?).await?;
    Ok(Json(order_response(&order)))
}

/// POST /orders/:id/ship — ship a processing order.
#[tracing::instrument(skip(state, req))]
pub async fn ship<L: InventoryLedger + 'static>(
    State(state): State<Arc<AppState<L>>>,
    Path(id): Path<String>,
    Json(req): Json<ShipRequest>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order = state
        .orders
        .ship(parse_order_id(&id)?, req.tracking_number)
        .await?;
    Ok(Json(order_response(&order)))
}

/// POST /orders/:id/deliver — mark a shipped order as delivered.
#[tracing::instrument(skip(state))]
pub async fn deliver<L: InventoryLedger + 'static>(
    State(state): State<Arc<AppState<L>>>,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order = state.orders.deliver(parse_order_id(&id)?).await?;
    Ok(Json(order_response(&order)))
}
