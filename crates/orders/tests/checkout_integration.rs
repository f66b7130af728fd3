//! End-to-end checkout flow against in-memory stores.

use std::sync::Arc;

use async_trait::async_trait;
use cart::{CartError, CartService, StandardPricing};
use catalog::{
    AutoApprove, Money, NewReview, Product, ProductId, ProductStore, ReviewService, Variant,
    VariantKey,
};
use chrono::Duration;
use common::{Address, CartOwner, CustomerId};
use inventory::{InMemoryLedger, InventoryLedger};
use orders::{
    ChargeReceipt, CheckoutError, CheckoutRequest, CheckoutService, InMemoryPaymentProcessor,
    OrderService, OrderStatus, OrderStore, PaymentDeclined, PaymentMethod, PaymentProcessor,
};
use tokio::sync::Notify;

struct Harness {
    products: Arc<ProductStore>,
    ledger: InMemoryLedger,
    carts: Arc<CartService<InMemoryLedger>>,
    payment: InMemoryPaymentProcessor,
    checkout: CheckoutService<InMemoryLedger>,
    orders: OrderService<InMemoryLedger>,
    store: OrderStore,
}

async fn harness() -> Harness {
    let products = Arc::new(ProductStore::new());
    products
        .insert(Product::new(
            "P-100",
            "Trail Jacket",
            "Northwind",
            Money::from_cents(2000),
            vec![Variant::new("V-1", "TJ-M", "Medium", Money::from_cents(2000))],
        ))
        .await;

    let ledger = InMemoryLedger::new();
    ledger.set_stock(&VariantKey::new("P-100", "V-1"), 10).await;

    let carts = Arc::new(CartService::new(
        ledger.clone(),
        products.clone(),
        Arc::new(StandardPricing::default()),
        Duration::hours(1),
    ));

    let payment = InMemoryPaymentProcessor::new();
    let store = OrderStore::new();
    let checkout = CheckoutService::new(
        carts.clone(),
        products.clone(),
        Arc::new(payment.clone()),
        store.clone(),
    );
    let orders = OrderService::new(store.clone(), ledger.clone());

    Harness {
        products,
        ledger,
        carts,
        payment,
        checkout,
        orders,
        store,
    }
}

fn address() -> Address {
    Address {
        recipient: "Jo Marsh".to_string(),
        line1: "1 Main St".to_string(),
        line2: None,
        city: "Springfield".to_string(),
        region: "OR".to_string(),
        postal_code: "97477".to_string(),
        country: "US".to_string(),
    }
}

fn request() -> CheckoutRequest {
    CheckoutRequest {
        shipping_address: address(),
        billing_address: None,
        payment_method: PaymentMethod::CreditCard,
    }
}

fn key() -> VariantKey {
    VariantKey::new("P-100", "V-1")
}

#[tokio::test]
async fn successful_checkout_places_pending_order() {
    let h = harness().await;
    let customer = CustomerId::new();
    let owner = CartOwner::Customer(customer);

    h.carts.add_item(&owner, &key(), 2).await.unwrap();
    let order = h.checkout.checkout(customer, request()).await.unwrap();

    assert_eq!(order.status(), OrderStatus::Pending);
    assert_eq!(order.items().len(), 1);
    assert_eq!(order.items()[0].name, "Trail Jacket - Medium");
    // $40 subtotal is under the $50 free-shipping threshold.
    assert_eq!(order.summary().subtotal, Money::from_cents(4000));
    assert_eq!(order.summary().tax, Money::from_cents(320));
    assert_eq!(order.summary().shipping, Money::from_cents(999));
    assert_eq!(order.summary().total, Money::from_cents(5319));
    assert_eq!(order.payment().transaction_id, "TXN-0001");

    // The cart is gone; its reservations belong to the order now.
    let err = h.carts.totals(&owner).await.unwrap_err();
    assert!(matches!(err, CartError::CartNotFound(_)));
    let level = h.ledger.stock(&key()).await.unwrap();
    assert_eq!(level.quantity, 10);
    assert_eq!(level.reserved, 2);
}

#[tokio::test]
async fn payment_failure_releases_holds_but_keeps_cart() {
    let h = harness().await;
    let customer = CustomerId::new();
    let owner = CartOwner::Customer(customer);

    h.carts.add_item(&owner, &key(), 3).await.unwrap();
    h.payment.set_fail_on_charge(true).await;

    let err = h.checkout.checkout(customer, request()).await.unwrap_err();
    assert!(matches!(err, CheckoutError::PaymentFailed { .. }));

    // Stock is back on sale, the cart still has its items.
    let level = h.ledger.stock(&key()).await.unwrap();
    assert_eq!(level.reserved, 0);
    let (cart, _) = h.carts.totals(&owner).await.unwrap();
    assert_eq!(cart.items[0].quantity, 3);
    assert!(!cart.holds_reservations);

    // A retry with working payment re-reserves and succeeds.
    h.payment.set_fail_on_charge(false).await;
    let order = h.checkout.checkout(customer, request()).await.unwrap();
    assert_eq!(order.status(), OrderStatus::Pending);
    assert_eq!(h.ledger.stock(&key()).await.unwrap().reserved, 3);
}

/// Parks every charge until the test says to continue.
struct GatedProcessor {
    started: Arc<Notify>,
    resume: Arc<Notify>,
}

#[async_trait]
impl PaymentProcessor for GatedProcessor {
    async fn charge(
        &self,
        _method: PaymentMethod,
        _amount: Money,
    ) -> Result<ChargeReceipt, PaymentDeclined> {
        self.started.notify_one();
        self.resume.notified().await;
        Ok(ChargeReceipt {
            transaction_id: "TXN-9001".to_string(),
        })
    }
}

#[tokio::test]
async fn items_added_during_charge_keep_their_cart_and_holds() {
    let h = harness().await;
    let customer = CustomerId::new();
    let owner = CartOwner::Customer(customer);
    h.carts.add_item(&owner, &key(), 2).await.unwrap();

    let started = Arc::new(Notify::new());
    let resume = Arc::new(Notify::new());
    let checkout = CheckoutService::new(
        h.carts.clone(),
        h.products.clone(),
        Arc::new(GatedProcessor {
            started: started.clone(),
            resume: resume.clone(),
        }),
        h.store.clone(),
    );
    let task = tokio::spawn(async move { checkout.checkout(customer, request()).await });

    // The shopper adds another unit while the charge is in flight.
    started.notified().await;
    h.carts.add_item(&owner, &key(), 1).await.unwrap();
    resume.notify_one();

    let order = task.await.unwrap().unwrap();
    assert_eq!(order.items()[0].quantity, 2);

    // The extra unit keeps its cart and its hold; no reservation is left
    // without an owner.
    let (cart, _) = h.carts.totals(&owner).await.unwrap();
    assert_eq!(cart.items[0].quantity, 1);
    assert!(cart.holds_reservations);
    let level = h.ledger.stock(&key()).await.unwrap();
    assert_eq!(level.reserved, 3);
}

#[tokio::test]
async fn empty_cart_cannot_check_out() {
    let h = harness().await;
    let customer = CustomerId::new();

    let err = h.checkout.checkout(customer, request()).await.unwrap_err();
    assert!(matches!(err, CheckoutError::Cart(CartError::CartNotFound(_))));
    assert_eq!(h.payment.charge_count().await, 0);
}

#[tokio::test]
async fn full_lifecycle_commits_stock_at_shipment() {
    let h = harness().await;
    let customer = CustomerId::new();
    let owner = CartOwner::Customer(customer);

    h.carts.add_item(&owner, &key(), 2).await.unwrap();
    let order = h.checkout.checkout(customer, request()).await.unwrap();

    h.orders.mark_processing(order.id()).await.unwrap();
    h.orders.ship(order.id(), "1Z999".to_string()).await.unwrap();
    let delivered = h.orders.deliver(order.id()).await.unwrap();

    assert_eq!(delivered.status(), OrderStatus::Delivered);
    assert_eq!(delivered.timeline().len(), 4);

    let level = h.ledger.stock(&key()).await.unwrap();
    assert_eq!(level.quantity, 8);
    assert_eq!(level.reserved, 0);
}

#[tokio::test]
async fn cancelled_order_returns_stock() {
    let h = harness().await;
    let customer = CustomerId::new();
    let owner = CartOwner::Customer(customer);

    h.carts.add_item(&owner, &key(), 4).await.unwrap();
    let order = h.checkout.checkout(customer, request()).await.unwrap();
    h.orders.cancel(order.id(), None).await.unwrap();

    let level = h.ledger.stock(&key()).await.unwrap();
    assert_eq!(level.quantity, 10);
    assert_eq!(level.reserved, 0);
}

#[tokio::test]
async fn shipped_order_verifies_purchase_for_reviews() {
    let h = harness().await;
    let customer = CustomerId::new();
    let owner = CartOwner::Customer(customer);

    let reviews = ReviewService::new(
        h.products.clone(),
        Arc::new(h.store.clone()),
        Arc::new(AutoApprove),
    );

    h.carts.add_item(&owner, &key(), 1).await.unwrap();
    let order = h.checkout.checkout(customer, request()).await.unwrap();

    // Before shipment the purchase is not yet fulfilled.
    let review = reviews
        .submit(
            CustomerId::new(),
            NewReview {
                product_id: ProductId::new("P-100"),
                order_id: None,
                rating: 4,
                title: "Fine".to_string(),
                body: "Never bought it though.".to_string(),
            },
        )
        .await
        .unwrap();
    assert!(!review.verified_purchase);

    h.orders.mark_processing(order.id()).await.unwrap();
    h.orders.ship(order.id(), "1Z999".to_string()).await.unwrap();

    let review = reviews
        .submit(
            customer,
            NewReview {
                product_id: ProductId::new("P-100"),
                order_id: Some(order.id()),
                rating: 5,
                title: "Great".to_string(),
                body: "Kept me dry.".to_string(),
            },
        )
        .await
        .unwrap();
    assert!(review.verified_purchase);

    let product = h.products.get(&ProductId::new("P-100")).await.unwrap();
    assert_eq!(product.rating_summary().total_reviews, 2);
    assert_eq!(product.rating_summary().average_rating, 4.5);
}
