//! The typed subset of the catalog the cart depends on.

use serde::{Deserialize, Serialize};

use clementine_core::{CategoryId, Price, ProductId};

/// A catalog record as the cart sees it.
///
/// This is deliberately narrower than the full catalog schema: the cart only
/// needs identity, price, and the stock ceiling, plus the display fields it
/// echoes back to the presentation layer. The stock ceiling is advisory -
/// inventory can change under us - so the engine re-clamps on every mutation
/// rather than trusting a single fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub id: ProductId,
    pub display_name: String,
    pub unit_price: Price,
    /// Maximum purchasable quantity, sourced from inventory.
    pub stock_ceiling: u32,
    pub image_url: Option<String>,
    pub category: Option<CategoryId>,
}
