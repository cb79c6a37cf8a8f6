//! Clementine Cart - the cart engine.
//!
//! Owns the set of line items a shopper has selected, enforces per-item
//! quantity bounds against available stock, derives aggregate totals, and
//! drives a linear checkout lifecycle.
//!
//! # Architecture
//!
//! - [`Cart`] holds insertion-ordered line items keyed by product id. Every
//!   mutation re-clamps quantities against the advisory stock ceiling;
//!   totals are recomputed with a single pass, never cached.
//! - [`CartSession`] wraps a cart with the checkout state machine
//!   (idle / submitting / succeeded / failed) and a generation counter that
//!   guards against stale completions.
//! - [`OrderSubmitter`] is the seam to the external order service. The
//!   async [`submit`] driver takes the checkout snapshot, applies the
//!   submission timeout, and resolves the attempt without holding the
//!   session lock across the network round-trip - the live cart stays
//!   mutable while a submission is in flight.
//!
//! This crate has no I/O of its own beyond the submitter seam; HTTP clients
//! and session plumbing live in the storefront binary.
//!
//! # Example
//!
//! ```rust,ignore
//! use clementine_cart::{CartSession, ProductRecord, submit};
//!
//! let mut session = CartSession::new();
//! session.cart_mut().add_item(&product, 2)?;
//!
//! let shared = tokio::sync::Mutex::new(session);
//! let reference = submit(&shared, &order_client, Duration::from_secs(30)).await?;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

mod cart;
mod checkout;
mod error;
mod product;

pub use cart::{Cart, CartTotals, LineItem, QuantityApplied};
pub use checkout::{
    CartSession, CartSnapshot, CheckoutAttempt, CheckoutState, OrderReference, OrderSubmitter,
    SnapshotLine, submit,
};
pub use error::{CartError, SubmissionError};
pub use product::ProductRecord;
