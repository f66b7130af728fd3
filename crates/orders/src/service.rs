//! Post-placement order lifecycle.

use common::OrderId;
use inventory::InventoryLedger;
use tracing::info;

use crate::error::OrderError;
use crate::order::Order;
use crate::status::OrderStatus;
use crate::store::OrderStore;

/// Drives orders through their lifecycle and keeps the inventory ledger in
/// step: shipping commits the order's reservations, cancellation releases
/// them.
///
/// Each operation holds the store's write lock across its ledger calls so
/// an order's status and its inventory effect change together.
pub struct OrderService<L: InventoryLedger> {
    store: OrderStore,
    ledger: L,
}

impl<L: InventoryLedger> OrderService<L> {
    pub fn new(store: OrderStore, ledger: L) -> Self {
        Self { store, ledger }
    }

    pub fn store(&self) -> &OrderStore {
        &self.store
    }

    /// Cancels a pending or processing order, releasing its reservations.
    #[tracing::instrument(skip(self))]
    pub async fn cancel(
        &self,
        order_id: OrderId,
        reason: Option<String>,
    ) -> Result<Order, OrderError> {
        let mut orders = self.store.orders.write().await;
        let order = orders
            .get_mut(&order_id)
            .ok_or(OrderError::OrderNotFound(order_id))?;

        // Validate before touching the ledger so an invalid cancellation
        // releases nothing.
        if !order.status().can_transition_to(OrderStatus::Cancelled) {
            return Err(OrderError::InvalidTransition {
                from: order.status(),
                to: OrderStatus::Cancelled,
            });
        }

        for item in order.items() {
            let key = catalog::VariantKey {
                product_id: item.product_id.clone(),
                variant_id: item.variant_id.clone(),
            };
            self.ledger.release(&key, item.quantity).await?;
        }

        order.transition(
            OrderStatus::Cancelled,
            reason.or_else(|| Some("Cancelled by customer".to_string())),
        )?;
        metrics::counter!("orders_cancelled_total").increment(1);
        info!(order_number = order.order_number(), "Order cancelled");
        Ok(order.clone())
    }

    /// Marks a pending order as processing (picked for fulfilment).
    #[tracing::instrument(skip(self))]
    pub async fn mark_processing(&self, order_id: OrderId) -> Result<Order, OrderError> {
        let mut orders = self.store.orders.write().await;
        let order = orders
            .get_mut(&order_id)
            .ok_or(OrderError::OrderNotFound(order_id))?;
        order.transition(
            OrderStatus::Processing,
            Some("Order is being prepared".to_string()),
        )?;
        Ok(order.clone())
    }

    /// Ships a processing order: commits every reservation and records the
    /// tracking number.
    #[tracing::instrument(skip(self))]
    pub async fn ship(
        &self,
        order_id: OrderId,
        tracking_number: String,
    ) -> Result<Order, OrderError> {
        let mut orders = self.store.orders.write().await;
        let order = orders
            .get_mut(&order_id)
            .ok_or(OrderError::OrderNotFound(order_id))?;

        if !order.status().can_transition_to(OrderStatus::Shipped) {
            return Err(OrderError::InvalidTransition {
                from: order.status(),
                to: OrderStatus::Shipped,
            });
        }

        // Check every line is still covered before committing any of them,
        // so a shortfall on one line leaves the ledger untouched.
        let keys: Vec<catalog::VariantKey> = order
            .items()
            .iter()
            .map(|item| catalog::VariantKey {
                product_id: item.product_id.clone(),
                variant_id: item.variant_id.clone(),
            })
            .collect();
        for (key, item) in keys.iter().zip(order.items()) {
            let level = self.ledger.stock(key).await?;
            if level.reserved < item.quantity {
                return Err(OrderError::Inventory(
                    inventory::InventoryError::ReservationShortfall {
                        variant: key.clone(),
                        requested: item.quantity,
                        reserved: level.reserved,
                    },
                ));
            }
        }
        for (key, item) in keys.iter().zip(order.items()) {
            self.ledger.commit(key, item.quantity).await?;
        }

        order.set_tracking_number(tracking_number.clone());
        order.transition(
            OrderStatus::Shipped,
            Some(format!("Shipped, tracking {tracking_number}")),
        )?;
        metrics::counter!("orders_shipped_total").increment(1);
        info!(order_number = order.order_number(), "Order shipped");
        Ok(order.clone())
    }

    /// Marks a shipped order as delivered.
    #[tracing::instrument(skip(self))]
    pub async fn deliver(&self, order_id: OrderId) -> Result<Order, OrderError> {
        let mut orders = self.store.orders.write().await;
        let order = orders
            .get_mut(&order_id)
            .ok_or(OrderError::OrderNotFound(order_id))?;
        order.transition(OrderStatus::Delivered, Some("Delivered".to_string()))?;
        metrics::counter!("orders_delivered_total").increment(1);
        Ok(order.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::{OrderItem, OrderSummary, PaymentRecord};
    use crate::payment::PaymentMethod;
    use catalog::{Money, ProductId, VariantId, VariantKey};
    use chrono::Utc;
    use common::{Address, CustomerId};
    use inventory::InMemoryLedger;

    fn sample_address() -> Address {
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

    fn key() -> VariantKey {
        VariantKey::new("P-100", "V-1")
    }

    async fn setup() -> (OrderService<InMemoryLedger>, InMemoryLedger, OrderId) {
        let ledger = InMemoryLedger::new();
        ledger.set_stock(&key(), 10).await;
        ledger.reserve(&key(), 2).await.unwrap();

        let order = Order::place(
            CustomerId::new(),
            vec![OrderItem {
                product_id: ProductId::new("P-100"),
                variant_id: VariantId::new("V-1"),
                sku: "TJ-M".to_string(),
                name: "Trail Jacket - Medium".to_string(),
                quantity: 2,
                unit_price: Money::from_cents(2000),
                total: Money::from_cents(4000),
            }],
            OrderSummary {
                subtotal: Money::from_cents(4000),
                tax: Money::from_cents(320),
                shipping: Money::from_cents(999),
                total: Money::from_cents(5319),
            },
            sample_address(),
            sample_address(),
            PaymentRecord {
                method: PaymentMethod::CreditCard,
                transaction_id: "TXN-0001".to_string(),
                amount: Money::from_cents(5319),
                processed_at: Utc::now(),
            },
        );
        let order_id = order.id();

        let store = OrderStore::new();
        store.insert(order).await;
        (OrderService::new(store, ledger.clone()), ledger, order_id)
    }

    #[tokio::test]
    async fn cancel_pending_releases_reservations() {
        let (service, ledger, order_id) = setup().await;

        let order = service.cancel(order_id, None).await.unwrap();
        assert_eq!(order.status(), OrderStatus::Cancelled);
        assert_eq!(
            order.timeline().last().unwrap().note.as_deref(),
            Some("Cancelled by customer")
        );

        let level = ledger.stock(&key()).await.unwrap();
        assert_eq!(level.reserved, 0);
        assert_eq!(level.quantity, 10);
    }

    #[tokio::test]
    async fn ship_commits_reservations_and_sets_tracking() {
        let (service, ledger, order_id) = setup().await;
        service.mark_processing(order_id).await.unwrap();

        let order = service.ship(order_id, "1Z999".to_string()).await.unwrap();
        assert_eq!(order.status(), OrderStatus::Shipped);
        assert_eq!(order.tracking_number(), Some("1Z999"));

        let level = ledger.stock(&key()).await.unwrap();
        assert_eq!(level.quantity, 8);
        assert_eq!(level.reserved, 0);
    }

    #[tokio::test]
    async fn ship_shortfall_on_one_line_commits_nothing() {
        let key_a = VariantKey::new("P-100", "V-1");
        let key_b = VariantKey::new("P-100", "V-2");
        let ledger = InMemoryLedger::new();
        ledger.set_stock(&key_a, 10).await;
        ledger.set_stock(&key_b, 10).await;
        ledger.reserve(&key_a, 2).await.unwrap();
        ledger.reserve(&key_b, 1).await.unwrap();

        let order = Order::place(
            CustomerId::new(),
            vec![
                OrderItem {
                    product_id: ProductId::new("P-100"),
                    variant_id: VariantId::new("V-1"),
                    sku: "TJ-M".to_string(),
                    name: "Trail Jacket - Medium".to_string(),
                    quantity: 2,
                    unit_price: Money::from_cents(2000),
                    total: Money::from_cents(4000),
                },
                OrderItem {
                    product_id: ProductId::new("P-100"),
                    variant_id: VariantId::new("V-2"),
                    sku: "TJ-L".to_string(),
                    name: "Trail Jacket - Large".to_string(),
                    quantity: 1,
                    unit_price: Money::from_cents(2200),
                    total: Money::from_cents(2200),
                },
            ],
            OrderSummary {
                subtotal: Money::from_cents(6200),
                tax: Money::from_cents(496),
                shipping: Money::from_cents(0),
                total: Money::from_cents(6696),
            },
            sample_address(),
            sample_address(),
            PaymentRecord {
                method: PaymentMethod::CreditCard,
                transaction_id: "TXN-0001".to_string(),
                amount: Money::from_cents(6696),
                processed_at: Utc::now(),
            },
        );
        let order_id = order.id();
        let store = OrderStore::new();
        store.insert(order).await;
        let service = OrderService::new(store, ledger.clone());
        service.mark_processing(order_id).await.unwrap();

        // The second line's hold disappears out from under the order.
        ledger.release(&key_b, 1).await.unwrap();

        let err = service
            .ship(order_id, "1Z999".to_string())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            OrderError::Inventory(inventory::InventoryError::ReservationShortfall { .. })
        ));

        // The first line was not committed and the order did not move.
        let level = ledger.stock(&key_a).await.unwrap();
        assert_eq!(level.quantity, 10);
        assert_eq!(level.reserved, 2);
        let order = service.store().get(order_id).await.unwrap();
        assert_eq!(order.status(), OrderStatus::Processing);
        assert!(order.tracking_number().is_none());
    }

    #[tokio::test]
    async fn cannot_cancel_after_shipment() {
        let (service, ledger, order_id) = setup().await;
        service.mark_processing(order_id).await.unwrap();
        service.ship(order_id, "1Z999".to_string()).await.unwrap();

        let err = service.cancel(order_id, None).await.unwrap_err();
        assert!(matches!(
            err,
            OrderError::InvalidTransition {
                from: OrderStatus::Shipped,
                to: OrderStatus::Cancelled,
            }
        ));

        // The rejected cancellation released nothing.
        let level = ledger.stock(&key()).await.unwrap();
        assert_eq!(level.quantity, 8);
    }

    #[tokio::test]
    async fn deliver_requires_shipped() {
        let (service, _, order_id) = setup().await;
        let err = service.deliver(order_id).await.unwrap_err();
        assert!(matches!(err, OrderError::InvalidTransition { .. }));

        service.mark_processing(order_id).await.unwrap();
        service.ship(order_id, "1Z999".to_string()).await.unwrap();
        let order = service.deliver(order_id).await.unwrap();
        assert_eq!(order.status(), OrderStatus::Delivered);
        assert_eq!(order.timeline().len(), 4);
    }

    #[tokio::test]
    async fn unknown_order_fails() {
        let (service, _, _) = setup().await;
        let err = service.cancel(OrderId::new(), None).await.unwrap_err();
        assert!(matches!(err, OrderError::OrderNotFound(_)));
    }
}
