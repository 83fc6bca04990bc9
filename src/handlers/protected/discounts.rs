// handlers/protected/discounts.rs - discount codes
//
// Management routes need the catalog capability; `validate` is open to any
// shopper so a cart page can preview a code before checkout.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::models::Discount;
use crate::services::{DiscountInput, DiscountQuote, ValidateDiscount};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    #[serde(default)]
    pub active_only: bool,
}

/// POST /api/v1/discounts
pub async fn discount_create(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<DiscountInput>,
) -> ApiResult<Discount> {
    let discount = state.services.discounts.create_discount(auth.tenant_id, input).await?;
    Ok(ApiResponse::created(discount))
}

/// GET /api/v1/discounts?activeOnly=true
pub async fn discount_list(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ListQuery>,
) -> ApiResult<Vec<Discount>> {
    Ok(ApiResponse::success(
        state
            .services
            .discounts
            .list_discounts(auth.tenant_id, query.active_only)
            .await?,
    ))
}

/// GET /api/v1/discounts/:id
pub async fn discount_show(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Discount> {
    Ok(ApiResponse::success(
        state.services.discounts.get_discount(auth.tenant_id, id).await?,
    ))
}

/// PUT /api/v1/discounts/:id
pub async fn discount_update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(input): Json<DiscountInput>,
) -> ApiResult<Discount> {
    Ok(ApiResponse::success(
        state
            .services
            .discounts
            .update_discount(auth.tenant_id, id, input)
            .await?,
    ))
}

/// DELETE /api/v1/discounts/:id
pub async fn discount_delete(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<()> {
    state.services.discounts.delete_discount(auth.tenant_id, id).await?;
    Ok(ApiResponse::no_content())
}

/// POST /api/v1/discounts/:id/activate
pub async fn discount_activate(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Discount> {
    Ok(ApiResponse::success(
        state.services.discounts.set_active(auth.tenant_id, id, true).await?,
    ))
}

/// POST /api/v1/discounts/:id/deactivate
pub async fn discount_deactivate(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Discount> {
    Ok(ApiResponse::success(
        state.services.discounts.set_active(auth.tenant_id, id, false).await?,
    ))
}

/**
 * POST /api/v1/discounts/validate - Preview a code against a total
 *
 * A code that does not apply is still a 200; `applicable` is false and
 * `message` says why.
 *
 * Expected Input:
 * ```json
 * { "code": "WELCOME10", "orderTotal": 42.75 }
 * ```
 */
pub async fn discount_validate(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(request): Json<ValidateDiscount>,
) -> ApiResult<DiscountQuote> {
    Ok(ApiResponse::success(
        state
            .services
            .discounts
            .validate_code(auth.tenant_id, &auth.email, request)
            .await?,
    ))
}
