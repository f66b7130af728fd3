//! HTTP API server for the storefront core.
//!
//! Exposes the catalog, carts, checkout, order lifecycle, and reviews over
//! REST, with structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod context;
pub mod error;
pub mod routes;
pub mod state;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, post, put};
use inventory::InventoryLedger;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use state::{AppState, create_default_state};

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<L: InventoryLedger + 'static>(
    state: Arc<AppState<L>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/products", post(routes::products::create::<L>))
        .route("/products", get(routes::products::list::<L>))
        .route("/products/{id}", get(routes::products::get::<L>))
        .route(
            "/products/{id}/variants/{variant_id}/stock",
            put(routes::products::set_stock::<L>),
        )
        .route(
            "/products/{id}/variants/{variant_id}/stock",
            get(routes::products::stock::<L>),
        )
        .route("/products/{id}/reviews", post(routes::reviews::submit::<L>))
        .route("/products/{id}/reviews", get(routes::reviews::list::<L>))
        .route("/products/{id}/rating", get(routes::reviews::rating::<L>))
        .route("/reviews/{id}/vote", post(routes::reviews::vote::<L>))
        .route("/reviews/{id}/approve", post(routes::reviews::approve::<L>))
        .route("/reviews/{id}/reject", post(routes::reviews::reject::<L>))
        .route("/cart", get(routes::cart::view::<L>))
        .route("/cart/items", post(routes::cart::add_item::<L>))
        .route("/cart/items", put(routes::cart::update_item::<L>))
        .route(
            "/cart/items/{product_id}/{variant_id}",
            delete(routes::cart::remove_item::<L>),
        )
        .route("/cart/merge", post(routes::cart::merge::<L>))
        .route("/checkout", post(routes::orders::checkout::<L>))
        .route("/orders", get(routes::orders::list::<L>))
        .route("/orders/{id}", get(routes::orders::get::<L>))
        .route(
            "/orders/number/{order_number}",
            get(routes::orders::get_by_number::<L>),
        )
        .route("/orders/{id}/timeline", get(routes::orders::timeline::<L>))
        .route("/orders/{id}/cancel", post(routes::orders::cancel::<L>))
        .route(
            "/orders/{id}/processing",
            post(routes::orders::mark_processing::<L>),
        )
        .route("/orders/{id}/ship", post(routes::orders::ship::<L>))
        .route("/orders/{id}/deliver", post(routes::orders::deliver::<L>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
