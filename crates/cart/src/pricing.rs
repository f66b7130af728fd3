//! Tax and shipping estimation.

use catalog::Money;
use common::Address;

use crate::cart::LineItem;

/// Result of a pricing estimate over a set of lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricingEstimate {
    pub tax: Money,
    pub shipping: Money,
}

/// Computes tax and shipping estimates for a cart or checkout.
///
/// The destination address is optional because carts estimate totals before
/// the shopper has entered one.
pub trait PricingPolicy: Send + Sync {
    fn estimate(&self, items: &[LineItem], destination: Option<&Address>) -> PricingEstimate;
}

/// Flat-rate pricing: a fixed tax rate on the subtotal, flat shipping with
/// a free-shipping threshold.
#[derive(Debug, Clone)]
pub struct StandardPricing {
    /// Tax rate in basis points (800 = 8%).
    pub tax_basis_points: u32,

    /// Orders at or above this subtotal ship free.
    pub free_shipping_threshold: Money,

    /// Shipping charge below the threshold.
    pub flat_shipping: Money,
}

impl Default for StandardPricing {
    fn default() -> Self {
        Self {
            tax_basis_points: 800,
            free_shipping_threshold: Money::from_cents(5000),
            flat_shipping: Money::from_cents(999),
        }
    }
}

impl PricingPolicy for StandardPricing {
    fn estimate(&self, items: &[LineItem], _destination: Option<&Address>) -> PricingEstimate {
        let subtotal: Money = items.iter().map(LineItem::line_total).sum();
        let tax = subtotal.basis_points(self.tax_basis_points);
        let shipping = if subtotal.is_zero() || subtotal >= self.free_shipping_threshold {
            Money::zero()
        } else {
            self.flat_shipping
        };
        PricingEstimate { tax, shipping }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog::{ProductId, VariantId};
    use chrono::Utc;

    fn line(qty: u32, cents: i64) -> LineItem {
        LineItem {
            product_id: ProductId::new("P-100"),
            variant_id: VariantId::new("V-1"),
            quantity: qty,
            unit_price: Money::from_cents(cents),
            added_at: Utc::now(),
        }
    }

    #[test]
    fn small_order_pays_flat_shipping() {
        let estimate = StandardPricing::default().estimate(&[line(1, 1000)], None);
        assert_eq!(estimate.tax, Money::from_cents(80));
        assert_eq!(estimate.shipping, Money::from_cents(999));
    }

    #[test]
    fn threshold_order_ships_free() {
        let estimate = StandardPricing::default().estimate(&[line(1, 5000)], None);
        assert_eq!(estimate.shipping, Money::zero());
        assert_eq!(estimate.tax, Money::from_cents(400));
    }

    #[test]
    fn empty_cart_estimates_zero() {
        let estimate = StandardPricing::default().estimate(&[], None);
        assert_eq!(estimate.tax, Money::zero());
        assert_eq!(estimate.shipping, Money::zero());
    }

    #[test]
    fn tax_rounds_half_up() {
        // 1299 * 8% = 103.92 cents, rounds to 104.
        let estimate = StandardPricing::default().estimate(&[line(1, 1299)], None);
        assert_eq!(estimate.tax, Money::from_cents(104));
    }
}
