// handlers/protected/cart.rs - the caller's shopping cart
//
// A cart belongs to (tenant, email of the token holder).

use axum::{extract::State, Json};

use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::models::{Cart, Order};
use crate::services::{AddToCart, Checkout};
use crate::state::AppState;

/**
 * POST /api/v1/orders/cart/add - Add a catalog variant to the cart
 *
 * The variant is named by `variantId` or `sku`; name and price come from the
 * catalog. Adding a variant that is already in the cart increases its
 * quantity.
 *
 * Expected Input:
 * ```json
 * { "sku": "MUG-01", "quantity": 2 }
 * ```
 */
pub async fn cart_add(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(item): Json<AddToCart>,
) -> ApiResult<Cart> {
    Ok(ApiResponse::success(
        state
            .services
            .orders
            .add_to_cart(auth.tenant_id, &auth.email, item)
            .await?,
    ))
}

/// GET /api/v1/orders/cart
pub async fn cart_show(State(state): State<AppState>, auth: AuthUser) -> ApiResult<Cart> {
    Ok(ApiResponse::success(
        state.services.orders.get_cart(auth.tenant_id, &auth.email).await?,
    ))
}

/// DELETE /api/v1/orders/cart
pub async fn cart_clear(State(state): State<AppState>, auth: AuthUser) -> ApiResult<()> {
    state.services.orders.clear_cart(auth.tenant_id, &auth.email).await?;
    Ok(ApiResponse::no_content())
}

/// POST /api/v1/orders/checkout - turn the cart into a PENDING order.
/// The body is optional: `{ "discountCode": "WELCOME10" }`.
pub async fn checkout(
    State(state): State<AppState>,
    auth: AuthUser,
    body: Option<Json<Checkout>>,
) -> ApiResult<Order> {
    let checkout = body.map(|Json(checkout)| checkout).unwrap_or_default();
    let order = state
        .services
        .orders
        .place_order(auth.tenant_id, &auth.email, checkout)
        .await?;
    Ok(ApiResponse::created(order))
}
