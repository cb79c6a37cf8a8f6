//! Checkout lifecycle: snapshot, state machine, and submission driver.
//!
//! ```text
//! idle --begin_checkout(non-empty cart)--> submitting
//! submitting --submission succeeds--> succeeded (cart cleared)
//! submitting --submission fails--> failed (cart intact)
//! succeeded/failed --acknowledge--> idle
//! ```
//!
//! The snapshot taken at `begin_checkout` is what gets submitted; the live
//! cart stays mutable while the round-trip is in flight. A generation
//! counter ties each completion back to the attempt that produced it, so a
//! completion arriving after the attempt has been superseded is dropped
//! instead of mutating a torn-down view.

use std::time::Duration;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use clementine_core::{CurrencyCode, ProductId};

use crate::cart::Cart;
use crate::error::{CartError, SubmissionError};

/// Where the current checkout attempt stands.
///
/// `Succeeded` and `Failed` are transient display states; the presentation
/// layer collapses them back to `Idle` once the shopper has seen the toast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutState {
    #[default]
    Idle,
    Submitting,
    Succeeded,
    Failed,
}

/// One line of a checkout snapshot, as submitted to the order service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotLine {
    pub product_id: ProductId,
    pub quantity: u32,
    pub unit_price: Decimal,
}

/// Immutable copy of cart contents taken at submission time.
///
/// Concurrent cart edits during an in-flight submission cannot alter what
/// was actually ordered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartSnapshot {
    pub items: Vec<SnapshotLine>,
    pub expected_total: Decimal,
    pub currency_code: CurrencyCode,
}

impl CartSnapshot {
    /// Copy the cart's current lines and totals.
    #[must_use]
    pub fn capture(cart: &Cart) -> Self {
        Self {
            items: cart
                .items()
                .iter()
                .map(|item| SnapshotLine {
                    product_id: item.product_id,
                    quantity: item.quantity(),
                    unit_price: item.unit_price.amount,
                })
                .collect(),
            expected_total: cart.total(),
            currency_code: cart.currency_code(),
        }
    }
}

/// Success acknowledgment from the order service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderReference(String);

impl OrderReference {
    #[must_use]
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OrderReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Seam to the external order submission service.
///
/// The storefront implements this with a `reqwest` client; tests substitute
/// stubs. Implementations report upstream failures as [`SubmissionError`],
/// never by panicking.
pub trait OrderSubmitter: Send + Sync {
    /// Submit a checkout snapshot, returning the order reference on success.
    fn submit_order(
        &self,
        snapshot: &CartSnapshot,
    ) -> impl Future<Output = Result<OrderReference, SubmissionError>> + Send;
}

/// A checkout attempt handed to the submission driver.
///
/// Holds the immutable snapshot plus the generation that identifies this
/// attempt when the completion comes back.
#[derive(Debug, Clone)]
pub struct CheckoutAttempt {
    pub snapshot: CartSnapshot,
    pub generation: u64,
}

/// A shopper's cart plus its checkout lifecycle.
///
/// Owned explicitly (one per session, handed out by the cart store) rather
/// than living in ambient global state; teardown is the owner dropping it.
#[derive(Debug, Clone, Default)]
pub struct CartSession {
    cart: Cart,
    checkout: CheckoutState,
    generation: u64,
}

impl CartSession {
    /// Create a session with an empty cart.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The live cart, read-only.
    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    /// The live cart, mutable.
    ///
    /// Mutation is allowed even while a submission is in flight - the
    /// snapshot, not the live cart, is authoritative for what was
    /// submitted.
    pub const fn cart_mut(&mut self) -> &mut Cart {
        &mut self.cart
    }

    /// Current checkout state.
    #[must_use]
    pub const fn checkout_state(&self) -> CheckoutState {
        self.checkout
    }

    /// Start a checkout attempt.
    ///
    /// Snapshots the current items, bumps the generation, and enters
    /// `Submitting`. A `Succeeded`/`Failed` state left over from a previous
    /// attempt counts as idle here (retry after failure needs no explicit
    /// acknowledgment).
    ///
    /// # Errors
    ///
    /// [`CartError::CheckoutInProgress`] if an attempt is already
    /// submitting; [`CartError::EmptyCart`] if there is nothing to submit.
    /// Neither has side effects.
    pub fn begin_checkout(&mut self) -> Result<CheckoutAttempt, CartError> {
        if self.checkout == CheckoutState::Submitting {
            return Err(CartError::CheckoutInProgress);
        }
        if self.cart.is_empty() {
            return Err(CartError::EmptyCart);
        }

        self.generation += 1;
        self.checkout = CheckoutState::Submitting;
        let snapshot = CartSnapshot::capture(&self.cart);
        info!(
            generation = self.generation,
            lines = snapshot.items.len(),
            total = %snapshot.expected_total,
            "checkout submitting"
        );
        Ok(CheckoutAttempt {
            snapshot,
            generation: self.generation,
        })
    }

    /// Record the outcome of a submission round-trip.
    ///
    /// Ignored (returns `false`) unless `generation` matches a
    /// still-submitting attempt - a completion for a superseded attempt
    /// must not touch the session. On success the live cart is cleared
    /// unconditionally, whatever the shopper changed in flight; on failure
    /// the cart is left untouched for retry.
    pub fn resolve_checkout(
        &mut self,
        generation: u64,
        outcome: &Result<OrderReference, SubmissionError>,
    ) -> bool {
        if self.checkout != CheckoutState::Submitting || generation != self.generation {
            debug!(
                generation,
                current = self.generation,
                state = ?self.checkout,
                "stale checkout completion ignored"
            );
            return false;
        }

        match outcome {
            Ok(reference) => {
                self.cart.clear();
                self.checkout = CheckoutState::Succeeded;
                info!(generation, reference = %reference, "checkout succeeded");
            }
            Err(err) => {
                self.checkout = CheckoutState::Failed;
                warn!(generation, error = %err, "checkout failed");
            }
        }
        true
    }

    /// Collapse a terminal `Succeeded`/`Failed` state back to `Idle`
    /// (toast dismissal). No-op in any other state.
    pub fn acknowledge_checkout(&mut self) {
        if matches!(
            self.checkout,
            CheckoutState::Succeeded | CheckoutState::Failed
        ) {
            self.checkout = CheckoutState::Idle;
        }
    }
}

/// Drive one checkout round-trip against an order submitter.
///
/// Begins the attempt, submits the snapshot with `timeout` applied (expiry
/// becomes a [`SubmissionError::timed_out`] failure), and resolves the
/// session with the generation taken at begin time. The session lock is
/// released across the await so the shopper can keep editing the live cart
/// while the request is in flight.
///
/// # Errors
///
/// [`CartError::EmptyCart`] / [`CartError::CheckoutInProgress`] before any
/// request is made; [`CartError::SubmissionFailed`] with the upstream
/// detail when the order service rejects the snapshot or the deadline
/// expires.
pub async fn submit<S: OrderSubmitter>(
    session: &Mutex<CartSession>,
    submitter: &S,
    timeout: Duration,
) -> Result<OrderReference, CartError> {
    let attempt = session.lock().await.begin_checkout()?;

    let outcome = match tokio::time::timeout(timeout, submitter.submit_order(&attempt.snapshot))
        .await
    {
        Ok(result) => result,
        Err(_) => Err(SubmissionError::timed_out(timeout)),
    };

    session
        .lock()
        .await
        .resolve_checkout(attempt.generation, &outcome);
    outcome.map_err(CartError::SubmissionFailed)
}
