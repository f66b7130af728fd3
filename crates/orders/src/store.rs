//! In-memory order store.

use std::collections::HashMap;
use std::sync::Arc;

use common::{CustomerId, OrderId};
use tokio::sync::RwLock;

use crate::error::OrderError;
use crate::order::Order;

/// Thread-safe in-memory store of placed orders.
#[derive(Clone, Default)]
pub struct OrderStore {
    pub(crate) orders: Arc<RwLock<HashMap<OrderId, Order>>>,
}

impl OrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, order: Order) {
        let mut orders = self.orders.write().await;
        orders.insert(order.id(), order);
    }

    pub async fn get(&self, id: OrderId) -> Result<Order, OrderError> {
        let orders = self.orders.read().await;
        orders
            .get(&id)
            .cloned()
            .ok_or(OrderError::OrderNotFound(id))
    }

    pub async fn get_by_number(&self, order_number: &str) -> Result<Order, OrderError> {
        let orders = self.orders.read().await;
        orders
            .values()
            .find(|order| order.order_number() == order_number)
            .cloned()
            .ok_or_else(|| OrderError::OrderNumberNotFound(order_number.to_string()))
    }

    /// All orders for a customer, newest first.
    pub async fn list_for_customer(&self, customer_id: CustomerId) -> Vec<Order> {
        let orders = self.orders.read().await;
        let mut result: Vec<Order> = orders
            .values()
            .filter(|order| order.customer_id() == customer_id)
            .cloned()
            .collect();
        result.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        result
    }
}
