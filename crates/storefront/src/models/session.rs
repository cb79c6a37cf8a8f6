//! Session-related types.
//!
//! The session stores nothing but the shopper's cart id; the cart itself
//! lives in the in-process [`crate::carts::CartStore`].

/// Session keys for storefront data.
pub mod keys {
    /// Key for storing the shopper's cart ID.
    pub const CART_ID: &str = "cart_id";
}
