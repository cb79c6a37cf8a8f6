//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                        - Health check
//!
//! # Cart (JSON)
//! GET    /api/cart                    - Current cart, totals, checkout state
//! GET    /api/cart/count              - Item count badge
//! POST   /api/cart/items              - Add a product (creates cart if needed)
//! PATCH  /api/cart/items              - Set a line's quantity
//! DELETE /api/cart/items              - Remove a line
//! POST   /api/cart/clear              - Empty the cart
//!
//! # Checkout (JSON)
//! POST /api/cart/checkout             - Submit the cart to the order service
//! POST /api/cart/checkout/acknowledge - Dismiss a succeeded/failed state
//! ```

pub mod cart;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the application router (without global layers).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/cart", get(cart::show))
        .route("/api/cart/count", get(cart::count))
        .route(
            "/api/cart/items",
            post(cart::add).patch(cart::update).delete(cart::remove),
        )
        .route("/api/cart/clear", post(cart::clear))
        .route("/api/cart/checkout", post(cart::checkout))
        .route("/api/cart/checkout/acknowledge", post(cart::acknowledge))
}
