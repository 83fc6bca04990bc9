// handlers/protected/users.rs - staff account management

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::error::ApiError;
use crate::middleware::{has_capability, ApiResponse, ApiResult, AuthUser, Capability};
use crate::models::{Role, User};
use crate::services::NewUser;
use crate::state::AppState;

/**
 * POST /api/v1/users - Create a user inside the caller's store
 *
 * Expected Input:
 * ```json
 * { "email": "clerk@acme.com", "password": "secret123", "fullName": "Clerk", "role": "STAFF" }
 * ```
 *
 * Only an ADMIN may create another ADMIN.
 */
pub async fn user_create(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(request): Json<NewUser>,
) -> ApiResult<User> {
    let user = state
        .services
        .users
        .create_user(auth.tenant_id, auth.role, request)
        .await?;
    Ok(ApiResponse::created(user))
}

/// GET /api/v1/users/tenant/:tenantId
pub async fn user_list(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(tenant_id): Path<Uuid>,
) -> ApiResult<Vec<User>> {
    if tenant_id != auth.tenant_id && auth.role != Role::Admin {
        return Err(ApiError::forbidden("Access denied: other tenant"));
    }
    Ok(ApiResponse::success(
        state.services.users.list_by_tenant(tenant_id).await?,
    ))
}

/// GET /api/v1/users/:email - yourself, or anyone in the store with user management rights
pub async fn user_show(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(email): Path<String>,
) -> ApiResult<User> {
    let is_self = auth.email.eq_ignore_ascii_case(email.trim());
    if !is_self && !has_capability(auth.role, Capability::ManageUsers) {
        return Err(ApiError::forbidden("Access denied: insufficient permissions"));
    }
    Ok(ApiResponse::success(
        state.services.users.get_by_email(auth.tenant_id, &email).await?,
    ))
}
