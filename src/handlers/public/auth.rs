// handlers/public/auth.rs - sign-up and token acquisition

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::models::{Tenant, User};
use crate::services::{CustomerSignup, LoginRequest, RegisterMerchant};
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub token: String,
    pub token_type: &'static str,
    pub expires_in: u64,
    pub user: User,
}

fn token_for(state: &AppState, user: User) -> Result<TokenResponse, ApiError> {
    let token = state.jwt.issue(&user).map_err(|e| {
        tracing::error!("Token generation failed: {}", e);
        ApiError::internal_server_error("Failed to issue token")
    })?;

    Ok(TokenResponse {
        token,
        token_type: "Bearer",
        expires_in: state.config.security.jwt_expiry_hours * 3600,
        user,
    })
}

/**
 * POST /api/v1/auth/register - Merchant sign-up
 *
 * Creates the store and its first MERCHANT user in one step.
 *
 * Expected Input:
 * ```json
 * {
 *   "storeName": "Acme Store",
 *   "storeSlug": "acme-store",
 *   "email": "owner@acme.com",
 *   "password": "at-least-8",
 *   "fullName": "Ada Owner"
 * }
 * ```
 */
pub async fn merchant_register(
    State(state): State<AppState>,
    Json(request): Json<RegisterMerchant>,
) -> ApiResult<Tenant> {
    let (tenant, _owner) = state.services.tenants.register_merchant(request).await?;
    Ok(ApiResponse::created(tenant))
}

/**
 * POST /api/v1/auth/login - Exchange credentials for a bearer token
 *
 * `storeSlug` is only needed when the email belongs to accounts in more
 * than one store.
 *
 * Expected Output:
 * ```json
 * {
 *   "success": true,
 *   "data": { "token": "eyJ...", "tokenType": "Bearer", "expiresIn": 604800, "user": { ... } }
 * }
 * ```
 */
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<TokenResponse> {
    let user = state.services.users.authenticate(&request).await?;
    tracing::info!(user_id = %user.id, "login succeeded");
    Ok(ApiResponse::success(token_for(&state, user)?))
}

/// POST /api/v1/auth/customer/:storeSlug/register - shopper sign-up, returns a token
pub async fn customer_register(
    State(state): State<AppState>,
    Path(store_slug): Path<String>,
    Json(request): Json<CustomerSignup>,
) -> ApiResult<TokenResponse> {
    let (user, _customer) = state
        .services
        .users
        .register_customer(&store_slug, request)
        .await?;
    Ok(ApiResponse::created(token_for(&state, user)?))
}
