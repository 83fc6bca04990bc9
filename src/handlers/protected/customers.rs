// handlers/protected/customers.rs - customer records for the caller's store
//
// All lookups are scoped to the token's tenant; another store's customer
// is indistinguishable from a missing one.

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::models::Customer;
use crate::services::CustomerInput;
use crate::state::AppState;

fn parse_id(key: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(key).map_err(|_| ApiError::bad_request(format!("Invalid customer id: {}", key)))
}

/// POST /api/v1/customers
pub async fn customer_create(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<CustomerInput>,
) -> ApiResult<Customer> {
    let customer = state.services.customers.create(auth.tenant_id, input).await?;
    Ok(ApiResponse::created(customer))
}

/// GET /api/v1/customers
pub async fn customer_list(State(state): State<AppState>, auth: AuthUser) -> ApiResult<Vec<Customer>> {
    Ok(ApiResponse::success(
        state.services.customers.list(auth.tenant_id).await?,
    ))
}

/// GET /api/v1/customers/:email
pub async fn customer_show(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(email): Path<String>,
) -> ApiResult<Customer> {
    Ok(ApiResponse::success(
        state.services.customers.get_by_email(auth.tenant_id, &email).await?,
    ))
}

/// PUT /api/v1/customers/:id
pub async fn customer_update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(key): Path<String>,
    Json(input): Json<CustomerInput>,
) -> ApiResult<Customer> {
    let id = parse_id(&key)?;
    Ok(ApiResponse::success(
        state.services.customers.update(auth.tenant_id, id, input).await?,
    ))
}

/// DELETE /api/v1/customers/:id
pub async fn customer_delete(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(key): Path<String>,
) -> ApiResult<()> {
    let id = parse_id(&key)?;
    state.services.customers.delete(auth.tenant_id, id).await?;
    Ok(ApiResponse::no_content())
}
