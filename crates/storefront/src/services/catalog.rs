//! Catalog/stock service client.
//!
//! Read-only lookups against `GET {base}/products/{id}`, cached in-memory
//! with `moka`. The stock ceiling in a response is advisory - the cart
//! engine re-clamps on every mutation - so the cache TTL is kept short
//! rather than trying to make stock exact.

use std::time::Duration;

use moka::future::Cache;
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, instrument};

use clementine_cart::ProductRecord;
use clementine_core::{CategoryId, CurrencyCode, Price, ProductId};

use crate::config::CatalogConfig;

/// Cache at most this many products.
const CACHE_CAPACITY: u64 = 10_000;

/// Short TTL keeps the advisory stock ceiling reasonably fresh.
const CACHE_TTL: Duration = Duration::from_secs(60);

/// Errors that can occur when talking to the catalog service.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Product does not exist in the catalog.
    #[error("Product not found: {0}")]
    NotFound(ProductId),
}

/// Product payload as the catalog service returns it.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductPayload {
    id: ProductId,
    display_name: String,
    unit_price: Decimal,
    #[serde(default)]
    currency_code: CurrencyCode,
    stock_ceiling: u32,
    image_ref: Option<String>,
    category_ref: Option<CategoryId>,
}

impl From<ProductPayload> for ProductRecord {
    fn from(payload: ProductPayload) -> Self {
        Self {
            id: payload.id,
            display_name: payload.display_name,
            unit_price: Price::new(payload.unit_price, payload.currency_code),
            stock_ceiling: payload.stock_ceiling,
            image_url: payload.image_ref,
            category: payload.category_ref,
        }
    }
}

/// Catalog service client with in-memory response caching.
#[derive(Clone)]
pub struct CatalogClient {
    client: reqwest::Client,
    base_url: String,
    cache: Cache<ProductId, ProductRecord>,
}

impl CatalogClient {
    /// Create a new catalog client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &CatalogConfig) -> Result<Self, CatalogError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(10))
            .build()?;

        let cache = Cache::builder()
            .max_capacity(CACHE_CAPACITY)
            .time_to_live(CACHE_TTL)
            .build();

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            cache,
        })
    }

    /// Look up a product by id, serving from cache when fresh.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::NotFound`] for unknown ids, or an HTTP/API
    /// error when the service is unreachable or misbehaving.
    #[instrument(skip(self))]
    pub async fn get_product(&self, id: ProductId) -> Result<ProductRecord, CatalogError> {
        if let Some(hit) = self.cache.get(&id).await {
            debug!(product_id = %id, "catalog cache hit");
            return Ok(hit);
        }

        let record = self.fetch_product(id).await?;
        self.cache.insert(id, record.clone()).await;
        Ok(record)
    }

    async fn fetch_product(&self, id: ProductId) -> Result<ProductRecord, CatalogError> {
        let url = format!("{}/products/{id}", self.base_url);
        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(CatalogError::NotFound(id));
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(CatalogError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let payload: ProductPayload = response.json().await?;
        Ok(payload.into())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn product_payload_maps_to_record() {
        let json = r#"{
            "id": 7,
            "displayName": "Clementine Crate",
            "unitPrice": "12.50",
            "currencyCode": "USD",
            "stockCeiling": 4,
            "imageRef": "https://cdn.example.com/crate.jpg",
            "categoryRef": 2
        }"#;

        let payload: ProductPayload = serde_json::from_str(json).unwrap();
        let record = ProductRecord::from(payload);

        assert_eq!(record.id, ProductId::new(7));
        assert_eq!(record.display_name, "Clementine Crate");
        assert_eq!(record.unit_price.amount, Decimal::new(1250, 2));
        assert_eq!(record.stock_ceiling, 4);
        assert_eq!(record.category, Some(CategoryId::new(2)));
    }

    #[test]
    fn currency_code_defaults_when_absent() {
        let json = r#"{
            "id": 1,
            "displayName": "Plain",
            "unitPrice": "2.00",
            "stockCeiling": 1,
            "imageRef": null,
            "categoryRef": null
        }"#;

        let payload: ProductPayload = serde_json::from_str(json).unwrap();
        assert_eq!(payload.currency_code, CurrencyCode::USD);
    }
}
