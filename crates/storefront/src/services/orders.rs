//! Order submission service client.
//!
//! Implements the cart engine's [`OrderSubmitter`] seam: a checkout
//! snapshot goes out as `POST {base}/orders` with a bearer token and a
//! per-attempt idempotency key, and comes back as either an order
//! reference or a structured rejection.

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use clementine_cart::{CartSnapshot, OrderReference, OrderSubmitter, SubmissionError};

use crate::config::OrdersConfig;

/// Header carrying the per-attempt idempotency key, so a retried request
/// after a lost response cannot double-place an order.
const IDEMPOTENCY_HEADER: &str = "Idempotency-Key";

/// Errors constructing the order client.
#[derive(Debug, Error)]
pub enum OrderClientError {
    /// The configured API token is not a valid header value.
    #[error("Invalid API token: {0}")]
    InvalidToken(String),

    /// HTTP client failed to build.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Success acknowledgment payload.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrderAccepted {
    order_reference: String,
}

/// Structured failure payload.
#[derive(Debug, Deserialize)]
struct OrderRejected {
    code: Option<String>,
    message: String,
}

/// Order submission service client.
#[derive(Clone)]
pub struct OrderClient {
    client: reqwest::Client,
    base_url: String,
}

impl OrderClient {
    /// Create a new order client.
    ///
    /// # Errors
    ///
    /// Returns error if the API token is malformed or the HTTP client
    /// fails to build.
    pub fn new(config: &OrdersConfig) -> Result<Self, OrderClientError> {
        let mut headers = HeaderMap::new();
        let auth_value = format!("Bearer {}", config.api_token.expose_secret());
        let mut auth_header = HeaderValue::from_str(&auth_value)
            .map_err(|e| OrderClientError::InvalidToken(e.to_string()))?;
        auth_header.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth_header);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .connect_timeout(std::time::Duration::from_secs(5))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn post_order(
        &self,
        snapshot: &CartSnapshot,
    ) -> Result<OrderReference, SubmissionError> {
        let url = format!("{}/orders", self.base_url);
        let idempotency_key = Uuid::new_v4().to_string();
        debug!(lines = snapshot.items.len(), %idempotency_key, "posting order");

        let response = self
            .client
            .post(&url)
            .header(IDEMPOTENCY_HEADER, &idempotency_key)
            .json(snapshot)
            .send()
            .await
            .map_err(|e| SubmissionError::message(format!("order service unreachable: {e}")))?;

        let status = response.status();
        if status.is_success() {
            let accepted: OrderAccepted = response.json().await.map_err(|e| {
                SubmissionError::message(format!("malformed order acknowledgment: {e}"))
            })?;
            return Ok(OrderReference::new(accepted.order_reference));
        }

        match response.json::<OrderRejected>().await {
            Ok(rejected) => Err(SubmissionError {
                code: rejected.code,
                message: rejected.message,
            }),
            Err(e) => {
                warn!(status = status.as_u16(), error = %e, "unstructured order rejection");
                Err(SubmissionError::new(
                    format!("http_{}", status.as_u16()),
                    "order service returned an unexpected error",
                ))
            }
        }
    }
}

impl OrderSubmitter for OrderClient {
    fn submit_order(
        &self,
        snapshot: &CartSnapshot,
    ) -> impl Future<Output = Result<OrderReference, SubmissionError>> + Send {
        self.post_order(snapshot)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn rejection_payload_parses_with_and_without_code() {
        let with_code: OrderRejected =
            serde_json::from_str(r#"{"code":"out_of_stock","message":"item 3 unavailable"}"#)
                .unwrap();
        assert_eq!(with_code.code.as_deref(), Some("out_of_stock"));

        let without_code: OrderRejected =
            serde_json::from_str(r#"{"message":"internal error"}"#).unwrap();
        assert!(without_code.code.is_none());
    }

    #[test]
    fn acknowledgment_payload_parses() {
        let accepted: OrderAccepted =
            serde_json::from_str(r#"{"orderReference":"ord_20260823_0001"}"#).unwrap();
        assert_eq!(accepted.order_reference, "ord_20260823_0001");
    }
}
