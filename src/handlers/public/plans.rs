// handlers/public/plans.rs - GET /api/v1/subscriptions/plans

use axum::extract::State;

use crate::middleware::{ApiResponse, ApiResult};
use crate::models::SubscriptionPlan;
use crate::state::AppState;

/// Plans currently on offer.
pub async fn plans_list(State(state): State<AppState>) -> ApiResult<Vec<SubscriptionPlan>> {
    Ok(ApiResponse::success(
        state.services.subscriptions.list_active_plans().await?,
    ))
}
