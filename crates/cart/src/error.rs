//! Cart engine error taxonomy.
//!
//! All mutation errors are local and non-fatal: the cart is always left in
//! its last valid configuration. Submission failures are the only errors
//! that cross the module boundary to the presentation layer.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use clementine_core::{CurrencyCode, ProductId};

/// Errors produced by the cart engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    /// Checkout attempted with zero line items.
    #[error("cart is empty")]
    EmptyCart,

    /// A second checkout attempt while one is in flight.
    #[error("a checkout is already in progress")]
    CheckoutInProgress,

    /// An update referenced a product not present in the cart.
    #[error("product {0} is not in the cart")]
    ProductNotFound(ProductId),

    /// An add offered a price in a different currency than the cart holds.
    /// Totals sum a single currency; a mixed cart cannot be labeled.
    #[error("cart holds {in_cart:?} but product {product} is priced in {offered:?}")]
    CurrencyMismatch {
        product: ProductId,
        in_cart: CurrencyCode,
        offered: CurrencyCode,
    },

    /// The order service returned a failure or the request timed out.
    /// The live cart is preserved intact so the shopper can retry.
    #[error("order submission failed: {0}")]
    SubmissionFailed(SubmissionError),
}

/// Structured failure returned by the order submission service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionError {
    /// Machine-readable reason code, when the upstream provides one.
    pub code: Option<String>,
    /// Human-readable detail, surfaced to the shopper with a retry
    /// affordance.
    pub message: String,
}

impl SubmissionError {
    /// A submission failure with a reason code.
    #[must_use]
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            message: message.into(),
        }
    }

    /// A submission failure without a reason code.
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    /// The failure reported when the submission deadline expires.
    #[must_use]
    pub fn timed_out(after: std::time::Duration) -> Self {
        Self::new(
            "timeout",
            format!("order submission timed out after {}s", after.as_secs()),
        )
    }
}

impl std::fmt::Display for SubmissionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.code {
            Some(code) => write!(f, "{} ({code})", self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submission_error_display_includes_code() {
        let err = SubmissionError::new("card_declined", "payment was declined");
        assert_eq!(err.to_string(), "payment was declined (card_declined)");

        let err = SubmissionError::message("upstream unavailable");
        assert_eq!(err.to_string(), "upstream unavailable");
    }

    #[test]
    fn cart_error_display() {
        assert_eq!(CartError::EmptyCart.to_string(), "cart is empty");
        assert_eq!(
            CartError::ProductNotFound(ProductId::new(9)).to_string(),
            "product 9 is not in the cart"
        );
        assert_eq!(
            CartError::CurrencyMismatch {
                product: ProductId::new(2),
                in_cart: CurrencyCode::USD,
                offered: CurrencyCode::EUR,
            }
            .to_string(),
            "cart holds USD but product 2 is priced in EUR"
        );
    }
}
