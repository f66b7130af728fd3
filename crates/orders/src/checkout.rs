//! Checkout: cart snapshot -> charge -> order.
//!
//! The cart's reservations act as the inventory hold for the whole flow.
//! On a successful charge they transfer to the order; on a declined charge
//! they are released and the cart keeps its items so the shopper can retry.

use std::sync::Arc;

use cart::{CartService, LineItem};
use catalog::ProductStore;
use chrono::Utc;
use common::{Address, CartOwner, CustomerId};
use inventory::InventoryLedger;
use serde::Deserialize;
use tracing::{info, warn};

use crate::error::CheckoutError;
use crate::order::{Order, OrderItem, OrderSummary, PaymentRecord};
use crate::payment::{PaymentMethod, PaymentProcessor};
use crate::store::OrderStore;

/// Input for placing an order.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutRequest {
    pub shipping_address: Address,

    /// Defaults to the shipping address.
    #[serde(default)]
    pub billing_address: Option<Address>,

    pub payment_method: PaymentMethod,
}

/// Turns a validated cart into a placed order.
pub struct CheckoutService<L: InventoryLedger> {
    carts: Arc<CartService<L>>,
    products: Arc<ProductStore>,
    payment: Arc<dyn PaymentProcessor>,
    orders: OrderStore,
}

impl<L: InventoryLedger> CheckoutService<L> {
    pub fn new(
        carts: Arc<CartService<L>>,
        products: Arc<ProductStore>,
        payment: Arc<dyn PaymentProcessor>,
        orders: OrderStore,
    ) -> Self {
        Self {
            carts,
            products,
            payment,
            orders,
        }
    }

    /// Places an order from the customer's cart.
    ///
    /// Steps: validate the cart snapshot (re-reserving any released holds),
    /// price it against the shipping address, charge, then either record
    /// the order and drop the cart, or release the holds and surface
    /// [`CheckoutError::PaymentFailed`] with the cart intact.
    #[tracing::instrument(skip(self, request), fields(customer = %customer_id))]
    pub async fn checkout(
        &self,
        customer_id: CustomerId,
        request: CheckoutRequest,
    ) -> Result<Order, CheckoutError> {
        let owner = CartOwner::Customer(customer_id);
        let snapshot = self.carts.snapshot_for_checkout(&owner).await?;

        let items = self.build_items(&snapshot.items).await?;
        let totals = self
            .carts
            .totals_for(&snapshot.items, Some(&request.shipping_address));
        let summary = OrderSummary {
            subtotal: totals.subtotal,
            tax: totals.estimated_tax,
            shipping: totals.estimated_shipping,
            total: totals.estimated_total,
        };

        let receipt = match self
            .payment
            .charge(request.payment_method, summary.total)
            .await
        {
            Ok(receipt) => receipt,
            Err(declined) => {
                // Put the stock back on sale; the cart keeps its items and
                // will re-reserve on the next attempt.
                self.carts.release_holds(&owner).await?;
                metrics::counter!("checkouts_failed_total").increment(1);
                warn!(reason = declined.reason, "Checkout payment declined");
                return Err(CheckoutError::PaymentFailed {
                    reason: declined.reason,
                });
            }
        };

        let billing = request
            .billing_address
            .unwrap_or_else(|| request.shipping_address.clone());
        let order = Order::place(
            customer_id,
            items,
            summary,
            request.shipping_address,
            billing,
            PaymentRecord {
                method: request.payment_method,
                transaction_id: receipt.transaction_id,
                amount: summary.total,
                processed_at: Utc::now(),
            },
        );

        self.orders.insert(order.clone()).await;
        // Only the snapshotted lines leave the cart: anything added while
        // the charge was in flight keeps its holds under the cart.
        self.carts.clear_after_checkout(&owner, &snapshot.items).await;

        metrics::counter!("checkouts_completed_total").increment(1);
        metrics::histogram!("checkout_order_total_cents").record(summary.total.cents() as f64);
        info!(
            order_number = order.order_number(),
            total = %order.summary().total,
            "Order placed"
        );
        Ok(order)
    }

    async fn build_items(&self, lines: &[LineItem]) -> Result<Vec<OrderItem>, CheckoutError> {
        let mut items = Vec::with_capacity(lines.len());
        for line in lines {
            let product = self.products.get(&line.product_id).await?;
            let variant = product
                .variant(&line.variant_id)
                .ok_or_else(|| CheckoutError::VariantMissing(line.key()))?;
            items.push(OrderItem {
                product_id: line.product_id.clone(),
                variant_id: line.variant_id.clone(),
                sku: variant.sku.clone(),
                name: format!("{} - {}", product.name, variant.name),
                quantity: line.quantity,
                unit_price: line.unit_price,
                total: line.line_total(),
            });
        }
        Ok(items)
    }
}
