// handlers/protected/orders.rs - order lookup, payment and status changes

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::models::{Order, OrderStatus, Role};
use crate::services::{OrderPayment, PayOrder};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    pub status: String,
}

/// Shoppers only see their own orders; anything else reads as missing.
fn visible_to(order: Order, auth: &AuthUser) -> Result<Order, ApiError> {
    if auth.role == Role::Customer && !order.customer_email.eq_ignore_ascii_case(&auth.email) {
        return Err(ApiError::not_found("Order not found"));
    }
    Ok(order)
}

/// GET /api/v1/orders - every order in the store
pub async fn order_list(State(state): State<AppState>, auth: AuthUser) -> ApiResult<Vec<Order>> {
    Ok(ApiResponse::success(
        state.services.orders.list_orders(auth.tenant_id).await?,
    ))
}

/// GET /api/v1/orders/my
pub async fn order_list_mine(State(state): State<AppState>, auth: AuthUser) -> ApiResult<Vec<Order>> {
    Ok(ApiResponse::success(
        state
            .services
            .orders
            .list_customer_orders(auth.tenant_id, &auth.email)
            .await?,
    ))
}

/// GET /api/v1/orders/:id
pub async fn order_show(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Order> {
    let order = state.services.orders.get_order(auth.tenant_id, id).await?;
    Ok(ApiResponse::success(visible_to(order, &auth)?))
}

/// GET /api/v1/orders/number/:orderNumber
pub async fn order_show_by_number(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(order_number): Path<String>,
) -> ApiResult<Order> {
    let order = state
        .services
        .orders
        .get_order_by_number(auth.tenant_id, &order_number)
        .await?;
    Ok(ApiResponse::success(visible_to(order, &auth)?))
}

/**
 * PATCH /api/v1/orders/:id/status?status=SHIPPED - Move an order along its lifecycle
 *
 * Illegal moves (e.g. DELIVERED -> PENDING) answer 409 with code
 * INVALID_STATE_TRANSITION and leave the order untouched.
 */
pub async fn order_update_status(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Query(query): Query<StatusQuery>,
) -> ApiResult<Order> {
    let target: OrderStatus = query
        .status
        .parse()
        .map_err(|_| ApiError::bad_request(format!("Invalid order status: {}", query.status)))?;

    Ok(ApiResponse::success(
        state
            .services
            .orders
            .update_status(auth.tenant_id, id, target)
            .await?,
    ))
}

/**
 * POST /api/v1/orders/:id/pay - Charge a PENDING order
 *
 * Expected Input (optional):
 * ```json
 * { "paymentMethod": "STRIPE", "paymentToken": "tok_visa" }
 * ```
 *
 * On success the order is PAID and the response carries the order, its
 * invoice and the payment record. A declined charge answers 402.
 */
pub async fn order_pay(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    body: Option<Json<PayOrder>>,
) -> ApiResult<OrderPayment> {
    let order = state.services.orders.get_order(auth.tenant_id, id).await?;
    visible_to(order, &auth)?;

    let request = body.map(|Json(request)| request).unwrap_or_default();
    Ok(ApiResponse::success(
        state.services.orders.pay_order(auth.tenant_id, id, request).await?,
    ))
}
