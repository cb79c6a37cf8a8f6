//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use clementine_cart::CartError;

use crate::services::catalog::CatalogError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Cart engine rejected the operation.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Catalog service operation failed.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// JSON error body returned to clients.
#[derive(Debug, Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

impl AppError {
    fn code(&self) -> &'static str {
        match self {
            Self::Cart(err) => match err {
                CartError::EmptyCart => "empty_cart",
                CartError::CheckoutInProgress => "checkout_in_progress",
                CartError::ProductNotFound(_) => "product_not_found",
                CartError::CurrencyMismatch { .. } => "currency_mismatch",
                CartError::SubmissionFailed(_) => "submission_failed",
            },
            Self::Catalog(_) => "catalog_unavailable",
            Self::NotFound(_) => "not_found",
            Self::BadRequest(_) => "bad_request",
            Self::Internal(_) => "internal",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if matches!(self, Self::Internal(_) | Self::Catalog(_)) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = match &self {
            Self::Cart(err) => match err {
                // Checkout on an empty cart is a user-recoverable warning,
                // not a malformed request.
                CartError::EmptyCart => StatusCode::UNPROCESSABLE_ENTITY,
                CartError::CheckoutInProgress => StatusCode::CONFLICT,
                CartError::ProductNotFound(_) => StatusCode::NOT_FOUND,
                // The offered item conflicts with the cart's currency.
                CartError::CurrencyMismatch { .. } => StatusCode::CONFLICT,
                // Upstream order service failed; the cart is preserved and
                // the shopper gets a retry affordance.
                CartError::SubmissionFailed(_) => StatusCode::BAD_GATEWAY,
            },
            Self::Catalog(CatalogError::NotFound(_)) => StatusCode::NOT_FOUND,
            Self::Catalog(_) => StatusCode::BAD_GATEWAY,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Internal(_) => "Internal server error".to_string(),
            Self::Catalog(CatalogError::NotFound(id)) => format!("Product {id} not found"),
            Self::Catalog(_) => "Catalog service unavailable".to_string(),
            _ => self.to_string(),
        };

        let body = ErrorBody {
            code: self.code(),
            message,
        };
        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use clementine_cart::SubmissionError;
    use clementine_core::{CurrencyCode, ProductId};

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("product-123".to_string());
        assert_eq!(err.to_string(), "Not found: product-123");

        let err = AppError::Cart(CartError::EmptyCart);
        assert_eq!(err.to_string(), "Cart error: cart is empty");
    }

    #[test]
    fn test_cart_error_status_codes() {
        assert_eq!(
            get_status(AppError::Cart(CartError::EmptyCart)),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            get_status(AppError::Cart(CartError::CheckoutInProgress)),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AppError::Cart(CartError::ProductNotFound(ProductId::new(
                1
            )))),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Cart(CartError::SubmissionFailed(
                SubmissionError::message("upstream down")
            ))),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            get_status(AppError::Cart(CartError::CurrencyMismatch {
                product: ProductId::new(2),
                in_cart: CurrencyCode::USD,
                offered: CurrencyCode::EUR,
            })),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_catalog_error_status_codes() {
        assert_eq!(
            get_status(AppError::Catalog(CatalogError::NotFound(ProductId::new(
                7
            )))),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Catalog(CatalogError::Api {
                status: 500,
                message: "boom".to_string()
            })),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_general_status_codes() {
        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
