//! Order aggregate.

use catalog::{Money, ProductId, VariantId};
use chrono::{DateTime, Utc};
use common::{Address, CustomerId, OrderId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::OrderError;
use crate::payment::PaymentMethod;
use crate::status::OrderStatus;

/// A line of an order, snapshotted from the cart at checkout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: ProductId,
    pub variant_id: VariantId,
    pub sku: String,

    /// Display name, "{product} - {variant}".
    pub name: String,

    pub quantity: u32,
    pub unit_price: Money,
    pub total: Money,
}

/// Frozen money breakdown of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSummary {
    pub subtotal: Money,
    pub tax: Money,
    pub shipping: Money,
    pub total: Money,
}

/// Payment captured at checkout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub method: PaymentMethod,
    pub transaction_id: String,
    pub amount: Money,
    pub processed_at: DateTime<Utc>,
}

/// One entry in an order's append-only history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub status: OrderStatus,
    pub timestamp: DateTime<Utc>,
    pub note: Option<String>,
}

/// A placed order.
///
/// Fields are private; the only way to change status is through
/// [`Order::transition`], which enforces the status machine and appends to
/// the timeline. Items and money amounts are frozen at checkout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    order_number: String,
    customer_id: CustomerId,
    status: OrderStatus,
    items: Vec<OrderItem>,
    summary: OrderSummary,
    shipping_address: Address,
    billing_address: Address,
    payment: PaymentRecord,
    tracking_number: Option<String>,
    timeline: Vec<TimelineEntry>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Order {
    /// Creates a pending order. The timeline starts with a placement entry.
    pub(crate) fn place(
        customer_id: CustomerId,
        items: Vec<OrderItem>,
        summary: OrderSummary,
        shipping_address: Address,
        billing_address: Address,
        payment: PaymentRecord,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: OrderId::new(),
            order_number: generate_order_number(now),
            customer_id,
            status: OrderStatus::Pending,
            items,
            summary,
            shipping_address,
            billing_address,
            payment,
            tracking_number: None,
            timeline: vec![TimelineEntry {
                status: OrderStatus::Pending,
                timestamp: now,
                note: Some("Order placed".to_string()),
            }],
            created_at: now,
            updated_at: now,
        }
    }

    pub fn id(&self) -> OrderId {
        self.id
    }

    /// Human-facing order number, e.g. `ORD-20260829-3F9A01BC`.
    pub fn order_number(&self) -> &str {
        &self.order_number
    }

    pub fn customer_id(&self) -> CustomerId {
        self.customer_id
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    pub fn summary(&self) -> &OrderSummary {
        &self.summary
    }

    pub fn shipping_address(&self) -> &Address {
        &self.shipping_address
    }

    pub fn billing_address(&self) -> &Address {
        &self.billing_address
    }

    pub fn payment(&self) -> &PaymentRecord {
        &self.payment
    }

    pub fn tracking_number(&self) -> Option<&str> {
        self.tracking_number.as_deref()
    }

    /// Append-only transition history, oldest first.
    pub fn timeline(&self) -> &[TimelineEntry] {
        &self.timeline
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Moves the order to `next`, appending a timeline entry.
    pub(crate) fn transition(
        &mut self,
        next: OrderStatus,
        note: Option<String>,
    ) -> Result<(), OrderError> {
        if !self.status.can_transition_to(next) {
            return Err(OrderError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        let now = Utc::now();
        self.status = next;
        self.updated_at = now;
        self.timeline.push(TimelineEntry {
            status: next,
            timestamp: now,
            note,
        });
        Ok(())
    }

    pub(crate) fn set_tracking_number(&mut self, tracking_number: String) {
        self.tracking_number = Some(tracking_number);
    }

    /// Whether this order contains the given product.
    pub fn contains_product(&self, product_id: &ProductId) -> bool {
        self.items.iter().any(|item| &item.product_id == product_id)
    }
}

fn generate_order_number(now: DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().simple().to_string()[..8].to_uppercase();
    format!("ORD-{}-{}", now.format("%Y%m%d"), suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

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

    fn sample_order() -> Order {
        Order::place(
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
        )
    }

    #[test]
    fn placed_order_is_pending_with_timeline_entry() {
        let order = sample_order();
        assert_eq!(order.status(), OrderStatus::Pending);
        assert_eq!(order.timeline().len(), 1);
        assert_eq!(order.timeline()[0].status, OrderStatus::Pending);
        assert_eq!(order.timeline()[0].note.as_deref(), Some("Order placed"));
    }

    #[test]
    fn order_number_format() {
        let order = sample_order();
        let number = order.order_number();
        assert!(number.starts_with("ORD-"));
        let parts: Vec<&str> = number.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[1].len(), 8);
        assert_eq!(parts[2].len(), 8);
        assert!(parts[2].chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }

    #[test]
    fn transition_appends_to_timeline() {
        let mut order = sample_order();
        order
            .transition(OrderStatus::Processing, Some("Picked".to_string()))
            .unwrap();
        assert_eq!(order.status(), OrderStatus::Processing);
        assert_eq!(order.timeline().len(), 2);
        assert_eq!(order.timeline()[1].note.as_deref(), Some("Picked"));
    }

    #[test]
    fn invalid_transition_rejected_and_timeline_untouched() {
        let mut order = sample_order();
        let err = order.transition(OrderStatus::Delivered, None).unwrap_err();
        assert!(matches!(
            err,
            OrderError::InvalidTransition {
                from: OrderStatus::Pending,
                to: OrderStatus::Delivered,
            }
        ));
        assert_eq!(order.timeline().len(), 1);
        assert_eq!(order.status(), OrderStatus::Pending);
    }

    #[test]
    fn contains_product_matches_items() {
        let order = sample_order();
        assert!(order.contains_product(&ProductId::new("P-100")));
        assert!(!order.contains_product(&ProductId::new("P-999")));
    }
}
