//! Cart operations against the inventory ledger.

use std::collections::HashMap;
use std::sync::Arc;

use catalog::{ProductStore, VariantKey};
use chrono::{DateTime, Duration, Utc};
use common::{Address, CartOwner, CustomerId, SessionId};
use inventory::InventoryLedger;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::cart::{Cart, CartTotals, LineItem};
use crate::error::CartError;
use crate::pricing::PricingPolicy;

/// Manages carts and keeps their lines backed by ledger reservations.
///
/// All mutations run under a single write lock over the cart map and hold
/// it across their ledger calls. That is deliberate: a cart mutation and
/// its reservation change must be observed together or not at all.
pub struct CartService<L: InventoryLedger> {
    ledger: L,
    products: Arc<ProductStore>,
    pricing: Arc<dyn PricingPolicy>,
    ttl: Duration,
    carts: RwLock<HashMap<CartOwner, Cart>>,
}

impl<L: InventoryLedger> CartService<L> {
    pub fn new(
        ledger: L,
        products: Arc<ProductStore>,
        pricing: Arc<dyn PricingPolicy>,
        ttl: Duration,
    ) -> Self {
        Self {
            ledger,
            products,
            pricing,
            ttl,
            carts: RwLock::new(HashMap::new()),
        }
    }

    /// Adds `quantity` units of a variant, reserving them first.
    ///
    /// Adding a variant already in the cart increases its line; the price
    /// captured when the line was first added is kept.
    #[tracing::instrument(skip(self), fields(owner = %owner, variant = %key))]
    pub async fn add_item(
        &self,
        owner: &CartOwner,
        key: &VariantKey,
        quantity: u32,
    ) -> Result<Cart, CartError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity(0));
        }
        let unit_price = self.products.variant_price(key).await?;

        let mut carts = self.carts.write().await;
        let cart = self.live_cart_or_new(&mut carts, owner).await;
        self.restore_holds_locked(cart).await?;

        // Reserve the delta before touching the cart, so a rejection leaves
        // the cart exactly as it was.
        self.ledger.reserve(key, quantity).await?;

        let cart = carts
            .get_mut(owner)
            .ok_or_else(|| CartError::CartNotFound(owner.clone()))?;
        match cart.line_mut(key) {
            Some(line) => line.quantity += quantity,
            None => cart.items.push(LineItem {
                product_id: key.product_id.clone(),
                variant_id: key.variant_id.clone(),
                quantity,
                unit_price,
                added_at: Utc::now(),
            }),
        }
        cart.touch(self.ttl);

        metrics::counter!("cart_items_added_total").increment(u64::from(quantity));
        debug!(quantity, "Item added to cart");
        Ok(cart.clone())
    }

    /// Sets the quantity of an existing line.
    ///
    /// Increases reserve the difference; decreases release it. A target of
    /// zero removes the line.
    #[tracing::instrument(skip(self), fields(owner = %owner, variant = %key))]
    pub async fn update_item(
        &self,
        owner: &CartOwner,
        key: &VariantKey,
        quantity: u32,
    ) -> Result<Cart, CartError> {
        if quantity == 0 {
            return self.remove_item(owner, key).await;
        }

        let mut carts = self.carts.write().await;
        let cart = self.live_cart(&mut carts, owner).await?;
        self.restore_holds_locked(cart).await?;

        let cart = carts
            .get_mut(owner)
            .ok_or_else(|| CartError::CartNotFound(owner.clone()))?;
        let current = cart
            .line(key)
            .map(|line| line.quantity)
            .ok_or_else(|| CartError::ItemNotFound(key.clone()))?;

        if quantity > current {
            self.ledger.reserve(key, quantity - current).await?;
        } else if quantity < current {
            self.ledger.release(key, current - quantity).await?;
        }

        if let Some(line) = cart.line_mut(key) {
            line.quantity = quantity;
        }
        cart.touch(self.ttl);
        debug!(from = current, to = quantity, "Line quantity updated");
        Ok(cart.clone())
    }

    /// Removes a line, releasing its reservation.
    #[tracing::instrument(skip(self), fields(owner = %owner, variant = %key))]
    pub async fn remove_item(
        &self,
        owner: &CartOwner,
        key: &VariantKey,
    ) -> Result<Cart, CartError> {
        let mut carts = self.carts.write().await;
        let cart = self.live_cart(&mut carts, owner).await?;

        let quantity = cart
            .line(key)
            .map(|line| line.quantity)
            .ok_or_else(|| CartError::ItemNotFound(key.clone()))?;

        if cart.holds_reservations {
            self.ledger.release(key, quantity).await?;
        }
        cart.items.retain(|item| &item.key() != key);
        cart.touch(self.ttl);
        debug!(quantity, "Item removed from cart");
        Ok(cart.clone())
    }

    /// Returns a cart with computed totals.
    pub async fn totals(&self, owner: &CartOwner) -> Result<(Cart, CartTotals), CartError> {
        let mut carts = self.carts.write().await;
        let cart = self.live_cart(&mut carts, owner).await?;
        let totals = self.totals_for(&cart.items, None);
        Ok((cart.clone(), totals))
    }

    /// Computes totals for a set of lines using the configured pricing
    /// policy. Checkout uses this against the destination address.
    pub fn totals_for(&self, items: &[LineItem], destination: Option<&Address>) -> CartTotals {
        let subtotal: catalog::Money = items.iter().map(LineItem::line_total).sum();
        let estimate = self.pricing.estimate(items, destination);
        CartTotals {
            item_count: items.iter().map(|item| item.quantity).sum(),
            subtotal,
            estimated_tax: estimate.tax,
            estimated_shipping: estimate.shipping,
            estimated_total: subtotal + estimate.tax + estimate.shipping,
        }
    }

    /// Folds an anonymous session cart into a customer's cart at sign-in.
    ///
    /// Lines for the same variant merge by adding quantities, keeping the
    /// customer cart's captured price. Reservations carry over unchanged
    /// because both carts already hold them.
    #[tracing::instrument(skip(self), fields(session = %session_id, customer = %customer_id))]
    pub async fn merge(
        &self,
        session_id: SessionId,
        customer_id: CustomerId,
    ) -> Result<Cart, CartError> {
        let session_owner = CartOwner::Anonymous(session_id);
        let customer_owner = CartOwner::Customer(customer_id);

        let mut carts = self.carts.write().await;

        let session_cart = self.live_cart(&mut carts, &session_owner).await?;
        self.restore_holds_locked(session_cart).await?;
        let session_cart = carts
            .remove(&session_owner)
            .ok_or_else(|| CartError::CartNotFound(session_owner.clone()))?;

        let customer_cart = self.live_cart_or_new(&mut carts, &customer_owner).await;
        if let Err(err) = self.restore_holds_locked(customer_cart).await {
            // Put the session cart back so nothing is lost.
            carts.insert(session_owner, session_cart);
            return Err(err);
        }

        let customer_cart = carts
            .get_mut(&customer_owner)
            .ok_or_else(|| CartError::CartNotFound(customer_owner.clone()))?;
        for item in session_cart.items {
            match customer_cart.line_mut(&item.key()) {
                Some(line) => line.quantity += item.quantity,
                None => customer_cart.items.push(item),
            }
        }
        customer_cart.touch(self.ttl);

        info!(lines = customer_cart.items.len(), "Session cart merged");
        Ok(customer_cart.clone())
    }

    /// Removes carts whose expiry has passed, releasing their holds.
    /// Returns the number of carts removed. Safe to call repeatedly.
    pub async fn expire_stale(&self, now: DateTime<Utc>) -> Result<usize, CartError> {
        let mut carts = self.carts.write().await;
        let stale: Vec<CartOwner> = carts
            .iter()
            .filter(|(_, cart)| cart.is_expired_at(now))
            .map(|(owner, _)| owner.clone())
            .collect();

        for owner in &stale {
            if let Some(cart) = carts.remove(owner) {
                if cart.holds_reservations {
                    for item in &cart.items {
                        self.ledger.release(&item.key(), item.quantity).await?;
                    }
                }
                info!(owner = %owner, "Expired cart removed");
            }
        }

        if !stale.is_empty() {
            metrics::counter!("carts_expired_total").increment(stale.len() as u64);
        }
        Ok(stale.len())
    }

    /// Validates a cart for checkout and returns a snapshot of it.
    ///
    /// Ensures the cart exists, is non-empty, and that every line is backed
    /// by a live reservation (re-reserving after a previous payment failure
    /// released them).
    pub async fn snapshot_for_checkout(&self, owner: &CartOwner) -> Result<Cart, CartError> {
        let mut carts = self.carts.write().await;
        let cart = self.live_cart(&mut carts, owner).await?;
        if cart.is_empty() {
            return Err(CartError::EmptyCart(owner.clone()));
        }
        self.restore_holds_locked(cart).await?;
        let cart = carts
            .get(owner)
            .ok_or_else(|| CartError::CartNotFound(owner.clone()))?;
        Ok(cart.clone())
    }

    /// Releases all of a cart's reservations but keeps its lines.
    ///
    /// Called when checkout fails after the reservation step; the shopper
    /// keeps their cart and the stock goes back on sale.
    pub async fn release_holds(&self, owner: &CartOwner) -> Result<(), CartError> {
        let mut carts = self.carts.write().await;
        let cart = carts
            .get_mut(owner)
            .ok_or_else(|| CartError::CartNotFound(owner.clone()))?;
        if cart.holds_reservations {
            for item in &cart.items {
                self.ledger.release(&item.key(), item.quantity).await?;
            }
            cart.holds_reservations = false;
            info!(owner = %owner, "Cart holds released");
        }
        Ok(())
    }

    /// Removes the purchased lines from a cart after a successful checkout.
    ///
    /// Only the snapshotted quantities are removed: a mutation that landed
    /// while the payment was in flight reserved its own units, and those
    /// stay in the cart with their holds intact. The purchased reservations
    /// are not released; ownership of them passed to the order, which
    /// commits them at shipment.
    pub async fn clear_after_checkout(&self, owner: &CartOwner, purchased: &[LineItem]) {
        let mut carts = self.carts.write().await;
        let Some(mut cart) = carts.remove(owner) else {
            return;
        };
        for line in purchased {
            if let Some(item) = cart.line_mut(&line.key()) {
                item.quantity = item.quantity.saturating_sub(line.quantity);
            }
        }
        cart.items.retain(|item| item.quantity > 0);
        if !cart.items.is_empty() {
            cart.touch(self.ttl);
            info!(owner = %owner, lines = cart.items.len(), "Cart kept lines added during checkout");
            carts.insert(owner.clone(), cart);
        }
    }

    /// Fetches a cart, lazily expiring it if its TTL has passed. An expired
    /// cart's holds are released and the entry removed before reporting
    /// the cart as missing.
    async fn live_cart<'a>(
        &self,
        carts: &'a mut HashMap<CartOwner, Cart>,
        owner: &CartOwner,
    ) -> Result<&'a mut Cart, CartError> {
        self.expire_if_stale(carts, owner).await?;
        carts
            .get_mut(owner)
            .ok_or_else(|| CartError::CartNotFound(owner.clone()))
    }

    async fn live_cart_or_new<'a>(
        &self,
        carts: &'a mut HashMap<CartOwner, Cart>,
        owner: &CartOwner,
    ) -> &'a mut Cart {
        // Expiry failures here mean a release failed; the cart is still
        // replaced so the shopper gets a working cart.
        let _ = self.expire_if_stale(carts, owner).await;
        carts
            .entry(owner.clone())
            .or_insert_with(|| Cart::new(owner.clone(), self.ttl))
    }

    async fn expire_if_stale(
        &self,
        carts: &mut HashMap<CartOwner, Cart>,
        owner: &CartOwner,
    ) -> Result<(), CartError> {
        let expired = carts
            .get(owner)
            .is_some_and(|cart| cart.is_expired_at(Utc::now()));
        if expired {
            if let Some(cart) = carts.remove(owner) {
                if cart.holds_reservations {
                    for item in &cart.items {
                        self.ledger.release(&item.key(), item.quantity).await?;
                    }
                }
                metrics::counter!("carts_expired_total").increment(1);
            }
        }
        Ok(())
    }

    /// Re-reserves every line of a cart whose holds were released.
    ///
    /// All-or-nothing: if any line cannot be covered, the lines reserved so
    /// far are released again and the cart stays suspended.
    async fn restore_holds_locked(&self, cart: &mut Cart) -> Result<(), CartError> {
        if cart.holds_reservations {
            return Ok(());
        }
        let mut reserved: Vec<(VariantKey, u32)> = Vec::new();
        for item in &cart.items {
            match self.ledger.reserve(&item.key(), item.quantity).await {
                Ok(_) => reserved.push((item.key(), item.quantity)),
                Err(err) => {
                    for (key, quantity) in reserved {
                        self.ledger.release(&key, quantity).await?;
                    }
                    return Err(err.into());
                }
            }
        }
        cart.holds_reservations = true;
        info!(owner = %cart.owner, "Cart holds restored");
        Ok(())
    }
}
