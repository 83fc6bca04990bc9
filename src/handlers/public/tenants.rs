// handlers/public/tenants.rs - tenant onboarding and lookup

use axum::{
    extract::{Path, State},
    Json,
};

use crate::middleware::{ApiResponse, ApiResult};
use crate::models::Tenant;
use crate::services::NewTenant;
use crate::state::AppState;

/**
 * POST /api/v1/tenants - Create a store
 *
 * Expected Input:
 * ```json
 * { "name": "Acme Store", "slug": "acme-store", "ownerEmail": "a@acme.com" }
 * ```
 *
 * 201 with the tenant; 400 with `field_errors` on bad input; 409 when the
 * slug or name is taken.
 */
pub async fn tenant_create(
    State(state): State<AppState>,
    Json(request): Json<NewTenant>,
) -> ApiResult<Tenant> {
    let tenant = state.services.tenants.create_tenant(request).await?;
    Ok(ApiResponse::created(tenant))
}

/// GET /api/v1/tenants
pub async fn tenant_list(State(state): State<AppState>) -> ApiResult<Vec<Tenant>> {
    Ok(ApiResponse::success(state.services.tenants.list().await?))
}

/// GET /api/v1/tenants/:slug
pub async fn tenant_show(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<Tenant> {
    Ok(ApiResponse::success(state.services.tenants.get_by_slug(&slug).await?))
}
