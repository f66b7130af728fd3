//! Shared application state.

use std::sync::Arc;

use cart::{CartService, StandardPricing};
use catalog::{AutoApprove, ProductStore, ReviewService};
use chrono::Duration;
use inventory::{InMemoryLedger, InventoryLedger};
use orders::{CheckoutService, InMemoryPaymentProcessor, OrderService, OrderStore};

/// Shared application state accessible from all handlers.
pub struct AppState<L: InventoryLedger> {
    pub products: Arc<ProductStore>,
    pub ledger: L,
    pub carts: Arc<CartService<L>>,
    pub orders: OrderService<L>,
    pub checkout: CheckoutService<L>,
    pub reviews: ReviewService,
}

/// Creates the default application state backed by in-memory stores.
///
/// Returns the payment processor alongside the state so callers (mainly
/// tests) can toggle charge failures.
pub fn create_default_state(
    cart_ttl: Duration,
) -> (Arc<AppState<InMemoryLedger>>, InMemoryPaymentProcessor) {
    let products = Arc::new(ProductStore::new());
    let ledger = InMemoryLedger::new();
    let payment = InMemoryPaymentProcessor::new();
    let order_store = OrderStore::new();

    let carts = Arc::new(CartService::new(
        ledger.clone(),
        products.clone(),
        Arc::new(StandardPricing::default()),
        cart_ttl,
    ));
    let checkout = CheckoutService::new(
        carts.clone(),
        products.clone(),
        Arc::new(payment.clone()),
        order_store.clone(),
    );
    let orders = OrderService::new(order_store.clone(), ledger.clone());
    let reviews = ReviewService::new(
        products.clone(),
        Arc::new(order_store),
        Arc::new(AutoApprove),
    );

    let state = Arc::new(AppState {
        products,
        ledger,
        carts,
        orders,
        checkout,
        reviews,
    });
    (state, payment)
}
