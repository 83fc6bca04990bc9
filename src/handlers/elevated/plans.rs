// handlers/elevated/plans.rs - platform plan catalog (ADMIN only)

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::middleware::{ApiResponse, ApiResult};
use crate::models::SubscriptionPlan;
use crate::services::PlanInput;
use crate::state::AppState;

/**
 * POST /api/v1/subscriptions/plans - Add a plan
 *
 * Expected Input:
 * ```json
 * {
 *   "name": "Growth",
 *   "slug": "growth",
 *   "price": 49.00,
 *   "billingInterval": "MONTHLY",
 *   "features": "Up to 500 products"
 * }
 * ```
 */
pub async fn plan_create(
    State(state): State<AppState>,
    Json(input): Json<PlanInput>,
) -> ApiResult<SubscriptionPlan> {
    let plan = state.services.subscriptions.create_plan(input).await?;
    Ok(ApiResponse::created(plan))
}

/// PUT /api/v1/subscriptions/plans/:id
pub async fn plan_update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<PlanInput>,
) -> ApiResult<SubscriptionPlan> {
    Ok(ApiResponse::success(
        state.services.subscriptions.update_plan(id, input).await?,
    ))
}

/// DELETE /api/v1/subscriptions/plans/:id - retire a plan; existing subscriptions keep it
pub async fn plan_deactivate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<SubscriptionPlan> {
    Ok(ApiResponse::success(
        state.services.subscriptions.deactivate_plan(id).await?,
    ))
}
