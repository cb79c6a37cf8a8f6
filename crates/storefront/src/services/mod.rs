//! Clients for the external services the storefront consumes.
//!
//! - [`catalog`] - read-only catalog/stock lookups (cached)
//! - [`orders`] - order submission (implements the cart engine's
//!   `OrderSubmitter` seam)

pub mod catalog;
pub mod orders;
