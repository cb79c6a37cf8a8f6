//! The authoritative in-memory cart.
//!
//! Line items keep insertion order (first-added stays first unless removed)
//! and are keyed by product id. Aggregates are recomputed with a single O(n)
//! pass on every read - cart sizes are tens of items at most, so
//! correctness-by-recomputation beats incremental-update bugs.

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

use clementine_core::{CurrencyCode, Price, ProductId};

use crate::error::CartError;
use crate::product::ProductRecord;

/// One product-and-quantity pair within a cart.
///
/// The unit price is captured from the catalog at add-time and not
/// re-fetched; the stock ceiling and display fields are refreshed whenever
/// the same product is re-added with a fresh catalog record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineItem {
    pub product_id: ProductId,
    pub display_name: String,
    pub unit_price: Price,
    pub image_url: Option<String>,
    /// Maximum purchasable quantity at the time of the last catalog fetch.
    pub stock_ceiling: u32,
    /// Invariant: `1 <= quantity <= stock_ceiling` while the item is in
    /// the cart. Only cart mutations may change this.
    quantity: u32,
}

impl LineItem {
    fn new(product: &ProductRecord, quantity: u32) -> Self {
        Self {
            product_id: product.id,
            display_name: product.display_name.clone(),
            unit_price: product.unit_price,
            image_url: product.image_url.clone(),
            stock_ceiling: product.stock_ceiling,
            quantity,
        }
    }

    /// Current quantity of this line.
    #[must_use]
    pub const fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Derived line subtotal: `unit_price * quantity`.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.unit_price.amount * Decimal::from(self.quantity)
    }
}

/// Outcome of a quantity-changing mutation.
///
/// Clamping to the stock ceiling is not an error - the "+" button simply
/// disables at the ceiling - but the flag lets the presentation layer warn
/// if it wants to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuantityApplied {
    /// The quantity actually in effect after the mutation (0 means the
    /// line was removed or never created).
    pub quantity: u32,
    /// Whether the requested quantity was reduced to fit the stock ceiling.
    pub clamped: bool,
}

/// Aggregate totals, recomputed on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CartTotals {
    pub item_count: u32,
    pub total: Decimal,
    pub currency_code: CurrencyCode,
}

/// The shopper's cart: insertion-ordered line items keyed by product id.
#[derive(Debug, Clone, Default)]
pub struct Cart {
    items: Vec<LineItem>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Line items in display order.
    #[must_use]
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of distinct lines (not total quantity).
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Look up a line by product id.
    #[must_use]
    pub fn get(&self, id: ProductId) -> Option<&LineItem> {
        self.items.iter().find(|item| item.product_id == id)
    }

    /// Add a product to the cart.
    ///
    /// If the product is already present this is equivalent to setting the
    /// quantity to `existing + requested`. The resulting quantity is clamped
    /// to `[1, stock_ceiling]`; requests above the ceiling are silently
    /// reduced, never rejected. A product whose ceiling is 0 cannot be
    /// added (and an existing line for it is dropped, since the invariant
    /// `quantity >= 1` can no longer hold).
    ///
    /// # Errors
    ///
    /// Returns [`CartError::CurrencyMismatch`] when the product's price is
    /// in a different currency than the cart's existing lines. The cart's
    /// total sums a single currency, so mixed lines are refused outright
    /// and the cart is left unchanged.
    pub fn add_item(
        &mut self,
        product: &ProductRecord,
        requested: u32,
    ) -> Result<QuantityApplied, CartError> {
        if let Some(first) = self.items.first() {
            let in_cart = first.unit_price.currency_code;
            let offered = product.unit_price.currency_code;
            if in_cart != offered {
                return Err(CartError::CurrencyMismatch {
                    product: product.id,
                    in_cart,
                    offered,
                });
            }
        }

        if product.stock_ceiling == 0 {
            let removed = self.remove_item(product.id);
            debug!(product_id = %product.id, removed, "add_item on out-of-stock product");
            return Ok(QuantityApplied {
                quantity: 0,
                clamped: true,
            });
        }

        let target = if let Some(item) = self.get_mut(product.id) {
            // Refresh the advisory fields from the fresh catalog record;
            // the captured unit price stays.
            item.display_name = product.display_name.clone();
            item.image_url = product.image_url.clone();
            item.stock_ceiling = product.stock_ceiling;
            item.quantity.saturating_add(requested)
        } else {
            self.items.push(LineItem::new(product, 1));
            requested
        };

        let applied = target.clamp(1, product.stock_ceiling);
        if let Some(item) = self.get_mut(product.id) {
            item.quantity = applied;
        }

        debug!(
            product_id = %product.id,
            requested,
            applied,
            ceiling = product.stock_ceiling,
            "add_item"
        );
        Ok(QuantityApplied {
            quantity: applied,
            clamped: applied != target,
        })
    }

    /// Remove a line item. Removing an absent id is a no-op, not an error.
    ///
    /// Returns whether a line was actually removed.
    pub fn remove_item(&mut self, id: ProductId) -> bool {
        let Some(index) = self.position(id) else {
            return false;
        };
        self.items.remove(index);
        debug!(product_id = %id, "remove_item");
        true
    }

    /// Set the quantity of an existing line.
    ///
    /// A quantity of 0 removes the line (decrementing below 1 removes the
    /// row rather than rejecting the call); a quantity above the stock
    /// ceiling is clamped to the ceiling.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::ProductNotFound`] if the product is not in the
    /// cart - unlike [`Cart::add_item`], this operation updates, it never
    /// creates.
    pub fn set_quantity(
        &mut self,
        id: ProductId,
        new_quantity: u32,
    ) -> Result<QuantityApplied, CartError> {
        if new_quantity == 0 {
            if !self.remove_item(id) {
                return Err(CartError::ProductNotFound(id));
            }
            debug!(product_id = %id, "set_quantity(0) removed line");
            return Ok(QuantityApplied {
                quantity: 0,
                clamped: false,
            });
        }

        let Some(item) = self.get_mut(id) else {
            return Err(CartError::ProductNotFound(id));
        };
        let applied = new_quantity.min(item.stock_ceiling);
        item.quantity = applied;
        debug!(
            product_id = %id,
            requested = new_quantity,
            applied,
            ceiling = item.stock_ceiling,
            "set_quantity"
        );
        Ok(QuantityApplied {
            quantity: applied,
            clamped: applied != new_quantity,
        })
    }

    /// Empty the cart unconditionally. Idempotent.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Total quantity across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(LineItem::quantity).sum()
    }

    /// Sum of line subtotals.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.items.iter().map(LineItem::subtotal).sum()
    }

    /// Currency of the cart, taken from the first line (empty carts report
    /// the default currency). [`Cart::add_item`] refuses mixed currencies,
    /// so every line shares it.
    #[must_use]
    pub fn currency_code(&self) -> CurrencyCode {
        self.items
            .first()
            .map_or_else(CurrencyCode::default, |item| {
                item.unit_price.currency_code
            })
    }

    /// Aggregate totals, derived in a single pass.
    #[must_use]
    pub fn totals(&self) -> CartTotals {
        CartTotals {
            item_count: self.item_count(),
            total: self.total(),
            currency_code: self.currency_code(),
        }
    }

    fn position(&self, id: ProductId) -> Option<usize> {
        self.items.iter().position(|item| item.product_id == id)
    }

    fn get_mut(&mut self, id: ProductId) -> Option<&mut LineItem> {
        self.items.iter_mut().find(|item| item.product_id == id)
    }
}
