//! Purchase verification backed by order history.

use async_trait::async_trait;
use catalog::{ProductId, PurchaseVerifier};
use common::CustomerId;

use crate::store::OrderStore;

/// A purchase counts as fulfilled once the order has shipped.
#[async_trait]
impl PurchaseVerifier for OrderStore {
    async fn has_fulfilled_purchase(
        &self,
        customer_id: CustomerId,
        product_id: &ProductId,
    ) -> bool {
        let orders = self.orders.read().await;
        orders.values().any(|order| {
            order.customer_id() == customer_id
                && order.status().is_fulfilled()
                && order.contains_product(product_id)
        })
    }
}
