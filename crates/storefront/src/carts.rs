//! In-memory store of per-session cart engines.
//!
//! Each shopper session owns exactly one [`CartSession`], handed out as an
//! `Arc<tokio::sync::Mutex<_>>` handle so checkout can release the lock
//! across the submission round-trip. Construction is lazy (first cart
//! mutation creates it) and teardown is idle-based eviction - there is no
//! ambient global cart state, and abandoned carts do not accumulate for
//! the life of the process.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use moka::sync::Cache;
use tokio::sync::Mutex as AsyncMutex;
use tracing::debug;

use clementine_cart::CartSession;
use clementine_core::CartId;

/// Shared handle to one shopper's cart session.
pub type CartHandle = Arc<AsyncMutex<CartSession>>;

/// Carts idle this long are evicted. Matches the session cookie's two-hour
/// inactivity expiry, so a cart never outlives the cookie that references
/// it by more than the eviction lag.
const CART_IDLE_TTL: Duration = Duration::from_secs(2 * 60 * 60);

/// Maps cart ids (carried in the session cookie) to live cart sessions.
///
/// Every lookup refreshes the entry's idle timer; entries not looked up
/// within [`CART_IDLE_TTL`] expire and are dropped.
#[derive(Debug)]
pub struct CartStore {
    carts: Cache<CartId, CartHandle>,
    next_id: AtomicU64,
}

impl CartStore {
    #[must_use]
    pub fn new() -> Self {
        Self::with_idle_ttl(CART_IDLE_TTL)
    }

    fn with_idle_ttl(ttl: Duration) -> Self {
        Self {
            carts: Cache::builder().time_to_idle(ttl).build(),
            next_id: AtomicU64::new(0),
        }
    }

    /// Mint a new empty cart and return its id and handle.
    pub fn create(&self) -> (CartId, CartHandle) {
        let id = CartId::new(self.next_id.fetch_add(1, Ordering::Relaxed));
        let handle: CartHandle = Arc::new(AsyncMutex::new(CartSession::new()));
        self.carts.insert(id, Arc::clone(&handle));
        debug!(cart_id = %id, "cart created");
        (id, handle)
    }

    /// Look up an existing cart, refreshing its idle timer. Expired carts
    /// are gone: the shopper starts over with an empty cart.
    #[must_use]
    pub fn get(&self, id: CartId) -> Option<CartHandle> {
        self.carts.get(&id)
    }
}

impl Default for CartStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use clementine_cart::ProductRecord;
    use clementine_core::{CurrencyCode, Price, ProductId};

    fn product(id: i32) -> ProductRecord {
        ProductRecord {
            id: ProductId::new(id),
            display_name: format!("Product {id}"),
            unit_price: Price::from_minor_units(500, CurrencyCode::USD),
            stock_ceiling: 5,
            image_url: None,
            category: None,
        }
    }

    #[tokio::test]
    async fn carts_are_isolated_per_session() {
        let store = CartStore::new();
        let (first_id, first) = store.create();
        let (second_id, second) = store.create();
        assert_ne!(first_id, second_id);

        first
            .lock()
            .await
            .cart_mut()
            .add_item(&product(1), 2)
            .unwrap();
        assert_eq!(first.lock().await.cart().item_count(), 2);
        assert_eq!(second.lock().await.cart().item_count(), 0);
    }

    #[tokio::test]
    async fn handles_point_at_the_stored_cart() {
        let store = CartStore::new();
        let (id, handle) = store.create();

        handle
            .lock()
            .await
            .cart_mut()
            .add_item(&product(1), 1)
            .unwrap();
        let fetched = store.get(id).expect("cart should exist");
        assert_eq!(fetched.lock().await.cart().item_count(), 1);
    }

    #[test]
    fn idle_carts_are_evicted() {
        let store = CartStore::with_idle_ttl(Duration::from_millis(50));
        let (id, _handle) = store.create();
        assert!(store.get(id).is_some());

        std::thread::sleep(Duration::from_millis(150));
        assert!(store.get(id).is_none());

        // Absent ids simply miss; the handler path creates a fresh cart.
        assert!(store.get(CartId::new(99)).is_none());
    }

    #[test]
    fn lookups_keep_a_cart_alive() {
        let store = CartStore::with_idle_ttl(Duration::from_millis(300));
        let (id, _handle) = store.create();

        std::thread::sleep(Duration::from_millis(150));
        assert!(store.get(id).is_some());
        std::thread::sleep(Duration::from_millis(150));
        // 300ms since creation, but only 150ms since the last lookup.
        assert!(store.get(id).is_some());
    }
}
