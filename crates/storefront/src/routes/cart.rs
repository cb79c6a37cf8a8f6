//! Cart route handlers.
//!
//! The cart engine exposes raw state and plain results; these handlers
//! translate it to JSON for the presentation layer. Cart IDs are stored in
//! the session and mapped to in-process cart sessions by the cart store.

use axum::{Json, extract::State};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use clementine_cart::{
    CartError, CartSession, CheckoutState, LineItem, OrderReference, QuantityApplied, submit,
};
use clementine_core::{CartId, CurrencyCode, ProductId};

use crate::carts::CartHandle;
use crate::error::{AppError, Result};
use crate::models::session::keys;
use crate::state::AppState;

/// Cart line display data.
#[derive(Debug, Clone, Serialize)]
pub struct CartItemView {
    pub product_id: ProductId,
    pub display_name: String,
    pub quantity: u32,
    /// Advisory purchase ceiling; the UI disables "+" at this bound.
    pub stock_ceiling: u32,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
    pub image_url: Option<String>,
}

impl From<&LineItem> for CartItemView {
    fn from(item: &LineItem) -> Self {
        Self {
            product_id: item.product_id,
            display_name: item.display_name.clone(),
            quantity: item.quantity(),
            stock_ceiling: item.stock_ceiling,
            unit_price: item.unit_price.amount,
            subtotal: item.subtotal(),
            image_url: item.image_url.clone(),
        }
    }
}

/// Cart display data.
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub item_count: u32,
    pub total: Decimal,
    pub currency_code: CurrencyCode,
    pub checkout_state: CheckoutState,
}

impl CartView {
    /// An empty, idle cart.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            item_count: 0,
            total: Decimal::ZERO,
            currency_code: CurrencyCode::default(),
            checkout_state: CheckoutState::Idle,
        }
    }

    fn render(session: &CartSession) -> Self {
        let cart = session.cart();
        let totals = cart.totals();
        Self {
            items: cart.items().iter().map(CartItemView::from).collect(),
            item_count: totals.item_count,
            total: totals.total,
            currency_code: totals.currency_code,
            checkout_state: session.checkout_state(),
        }
    }
}

/// Response to a quantity-changing mutation.
#[derive(Debug, Serialize)]
pub struct MutationResponse {
    pub applied: QuantityApplied,
    pub cart: CartView,
}

/// Response to a successful checkout.
#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub order_reference: OrderReference,
    pub cart: CartView,
}

/// Cart count badge data.
#[derive(Debug, Serialize)]
pub struct CountResponse {
    pub item_count: u32,
}

/// Add to cart request body.
#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub product_id: ProductId,
    pub quantity: Option<u32>,
}

/// Update quantity request body.
#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Remove from cart request body.
#[derive(Debug, Deserialize)]
pub struct RemoveItemRequest {
    pub product_id: ProductId,
}

// =============================================================================
// Session Helpers
// =============================================================================

/// Get the cart ID from the session.
async fn get_cart_id(session: &Session) -> Option<CartId> {
    session.get::<CartId>(keys::CART_ID).await.ok().flatten()
}

/// Set the cart ID in the session.
async fn set_cart_id(
    session: &Session,
    cart_id: CartId,
) -> std::result::Result<(), tower_sessions::session::Error> {
    session.insert(keys::CART_ID, cart_id).await
}

/// Resolve the session's existing cart, if any.
async fn existing_cart(state: &AppState, session: &Session) -> Option<CartHandle> {
    let id = get_cart_id(session).await?;
    state.carts().get(id)
}

/// Resolve the session's cart, creating one on first use.
async fn cart_or_create(state: &AppState, session: &Session) -> Result<CartHandle> {
    if let Some(handle) = existing_cart(state, session).await {
        return Ok(handle);
    }
    let (id, handle) = state.carts().create();
    set_cart_id(session, id)
        .await
        .map_err(|e| AppError::Internal(format!("failed to persist cart id: {e}")))?;
    Ok(handle)
}

// =============================================================================
// Handlers
// =============================================================================

/// Current cart contents, totals, and checkout state.
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> Json<CartView> {
    match existing_cart(&state, &session).await {
        Some(handle) => Json(CartView::render(&*handle.lock().await)),
        None => Json(CartView::empty()),
    }
}

/// Add a product to the cart, creating the cart on first use.
///
/// The product is fetched from the catalog so the line captures the current
/// price and stock ceiling; requests above the ceiling are clamped, not
/// rejected.
#[instrument(skip(state, session))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<AddItemRequest>,
) -> Result<Json<MutationResponse>> {
    let product = state.catalog().get_product(form.product_id).await?;
    let handle = cart_or_create(&state, &session).await?;

    let mut guard = handle.lock().await;
    let applied = guard
        .cart_mut()
        .add_item(&product, form.quantity.unwrap_or(1))?;
    Ok(Json(MutationResponse {
        applied,
        cart: CartView::render(&guard),
    }))
}

/// Set the quantity of an existing line (0 removes it).
#[instrument(skip(state, session))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<UpdateItemRequest>,
) -> Result<Json<MutationResponse>> {
    let Some(handle) = existing_cart(&state, &session).await else {
        return Err(AppError::Cart(CartError::ProductNotFound(form.product_id)));
    };

    let mut guard = handle.lock().await;
    let applied = guard.cart_mut().set_quantity(form.product_id, form.quantity)?;
    Ok(Json(MutationResponse {
        applied,
        cart: CartView::render(&guard),
    }))
}

/// Remove a line from the cart. Removing an absent line is a no-op.
#[instrument(skip(state, session))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<RemoveItemRequest>,
) -> Json<CartView> {
    let Some(handle) = existing_cart(&state, &session).await else {
        return Json(CartView::empty());
    };

    let mut guard = handle.lock().await;
    guard.cart_mut().remove_item(form.product_id);
    Json(CartView::render(&guard))
}

/// Empty the cart.
#[instrument(skip(state, session))]
pub async fn clear(State(state): State<AppState>, session: Session) -> Json<CartView> {
    let Some(handle) = existing_cart(&state, &session).await else {
        return Json(CartView::empty());
    };

    let mut guard = handle.lock().await;
    guard.cart_mut().clear();
    Json(CartView::render(&guard))
}

/// Submit the cart to the order service.
///
/// On success the cart comes back empty; on failure the cart is preserved
/// and the error carries the upstream detail for a retry affordance.
#[instrument(skip(state, session))]
pub async fn checkout(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<CheckoutResponse>> {
    let Some(handle) = existing_cart(&state, &session).await else {
        // No cart yet means nothing to submit.
        return Err(AppError::Cart(CartError::EmptyCart));
    };

    let order_reference = submit(&handle, state.orders(), state.config().checkout_timeout).await?;

    let guard = handle.lock().await;
    Ok(Json(CheckoutResponse {
        order_reference,
        cart: CartView::render(&guard),
    }))
}

/// Dismiss a terminal succeeded/failed checkout state.
#[instrument(skip(state, session))]
pub async fn acknowledge(State(state): State<AppState>, session: Session) -> Json<CartView> {
    let Some(handle) = existing_cart(&state, &session).await else {
        return Json(CartView::empty());
    };

    let mut guard = handle.lock().await;
    guard.acknowledge_checkout();
    Json(CartView::render(&guard))
}

/// Cart count badge.
#[instrument(skip(state, session))]
pub async fn count(State(state): State<AppState>, session: Session) -> Json<CountResponse> {
    let item_count = match existing_cart(&state, &session).await {
        Some(handle) => handle.lock().await.cart().item_count(),
        None => 0,
    };
    Json(CountResponse { item_count })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use clementine_cart::ProductRecord;
    use clementine_core::Price;

    fn product(id: i32, cents: i64, ceiling: u32) -> ProductRecord {
        ProductRecord {
            id: ProductId::new(id),
            display_name: format!("Product {id}"),
            unit_price: Price::from_minor_units(cents, CurrencyCode::USD),
            stock_ceiling: ceiling,
            image_url: None,
            category: None,
        }
    }

    #[test]
    fn view_reflects_session_state() {
        let mut session = CartSession::new();
        session.cart_mut().add_item(&product(1, 1000, 3), 2).unwrap();
        session.cart_mut().add_item(&product(2, 550, 10), 1).unwrap();

        let view = CartView::render(&session);
        assert_eq!(view.items.len(), 2);
        assert_eq!(view.item_count, 3);
        assert_eq!(view.total, Decimal::new(2550, 2));
        assert_eq!(view.checkout_state, CheckoutState::Idle);

        let first = view.items.first().unwrap();
        assert_eq!(first.quantity, 2);
        assert_eq!(first.subtotal, Decimal::new(2000, 2));
    }

    #[test]
    fn empty_view_is_idle_and_zeroed() {
        let view = CartView::empty();
        assert!(view.items.is_empty());
        assert_eq!(view.item_count, 0);
        assert_eq!(view.total, Decimal::ZERO);
        assert_eq!(view.checkout_state, CheckoutState::Idle);
    }

    #[test]
    fn view_serializes_checkout_state_as_snake_case() {
        let mut session = CartSession::new();
        session.cart_mut().add_item(&product(1, 100, 5), 1).unwrap();
        let _attempt = session.begin_checkout().unwrap();

        let json = serde_json::to_value(CartView::render(&session)).unwrap();
        assert_eq!(json["checkout_state"], "submitting");
    }
}
