//! Application state shared across handlers.

use std::sync::Arc;

use crate::carts::CartStore;
use crate::config::StorefrontConfig;
use crate::services::catalog::{CatalogClient, CatalogError};
use crate::services::orders::{OrderClient, OrderClientError};

/// Error initializing application state.
#[derive(Debug, thiserror::Error)]
pub enum StateInitError {
    #[error("catalog client: {0}")]
    Catalog(#[from] CatalogError),
    #[error("order client: {0}")]
    Orders(#[from] OrderClientError),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like service clients and the cart store.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    catalog: CatalogClient,
    orders: OrderClient,
    carts: CartStore,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if either service client fails to build.
    pub fn new(config: StorefrontConfig) -> Result<Self, StateInitError> {
        let catalog = CatalogClient::new(&config.catalog)?;
        let orders = OrderClient::new(&config.orders)?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                catalog,
                orders,
                carts: CartStore::new(),
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the catalog service client.
    #[must_use]
    pub fn catalog(&self) -> &CatalogClient {
        &self.inner.catalog
    }

    /// Get a reference to the order service client.
    #[must_use]
    pub fn orders(&self) -> &OrderClient {
        &self.inner.orders
    }

    /// Get a reference to the cart store.
    #[must_use]
    pub fn carts(&self) -> &CartStore {
        &self.inner.carts
    }
}
