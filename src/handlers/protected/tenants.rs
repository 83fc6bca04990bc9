// handlers/protected/tenants.rs - GET /api/v1/tenants/my

use axum::extract::State;

use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::models::Tenant;
use crate::state::AppState;

/// The store the caller's token is bound to.
pub async fn tenant_my(State(state): State<AppState>, auth: AuthUser) -> ApiResult<Tenant> {
    Ok(ApiResponse::success(
        state.services.tenants.get_by_id(auth.tenant_id).await?,
    ))
}
