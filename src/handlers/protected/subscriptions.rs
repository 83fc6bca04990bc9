// handlers/protected/subscriptions.rs - the store's own plan subscription

use axum::{extract::State, Json};

use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::models::Subscription;
use crate::services::SubscribeRequest;
use crate::state::AppState;

/// GET /api/v1/subscriptions/me
pub async fn subscription_current(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Subscription> {
    state
        .services
        .subscriptions
        .current_subscription(auth.tenant_id)
        .await?
        .map(ApiResponse::success)
        .ok_or_else(|| ApiError::not_found("No active subscription found"))
}

/**
 * POST /api/v1/subscriptions/subscribe - Switch the store to a plan
 *
 * Paid plans are charged first; a declined charge answers 402 and the
 * current subscription stays as it was. Any previously ACTIVE subscription
 * is canceled.
 *
 * Expected Input:
 * ```json
 * { "planId": "b7c1...", "paymentMethod": "PAYPAL", "paymentToken": "tok" }
 * ```
 */
pub async fn subscribe(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(request): Json<SubscribeRequest>,
) -> ApiResult<Subscription> {
    let subscription = state
        .services
        .subscriptions
        .subscribe(auth.tenant_id, request)
        .await?;
    Ok(ApiResponse::created(subscription))
}

/// POST /api/v1/subscriptions/cancel - stop auto-renewal
pub async fn subscription_cancel(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Subscription> {
    Ok(ApiResponse::success(
        state
            .services
            .subscriptions
            .cancel_subscription(auth.tenant_id)
            .await?,
    ))
}
