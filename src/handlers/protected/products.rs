// handlers/protected/products.rs - the store catalog
//
// Shoppers browse active products; catalog managers see and edit everything.

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::error::ApiError;
use crate::middleware::{has_capability, ApiResponse, ApiResult, AuthUser, Capability};
use crate::models::{Product, ProductVariant};
use crate::services::{ProductChanges, ProductInput, VariantChanges};
use crate::state::AppState;

/// Inactive products are hidden from anyone who cannot manage the catalog.
fn browsing_only(auth: &AuthUser) -> bool {
    !has_capability(auth.role, Capability::ManageCatalog)
}

/**
 * POST /api/v1/products - Create a product with its variants
 *
 * Expected Input:
 * ```json
 * {
 *   "name": "Mug",
 *   "slug": "mug",
 *   "variants": [{ "sku": "MUG-01", "price": 12.50, "stockLevel": 40 }]
 * }
 * ```
 */
pub async fn product_create(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<ProductInput>,
) -> ApiResult<Product> {
    let product = state.services.products.create_product(auth.tenant_id, input).await?;
    Ok(ApiResponse::created(product))
}

/// GET /api/v1/products
pub async fn product_list(State(state): State<AppState>, auth: AuthUser) -> ApiResult<Vec<Product>> {
    Ok(ApiResponse::success(
        state
            .services
            .products
            .list_products(auth.tenant_id, browsing_only(&auth))
            .await?,
    ))
}

/// GET /api/v1/products/:id
pub async fn product_show(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Product> {
    let product = state.services.products.get_product(auth.tenant_id, id).await?;
    if browsing_only(&auth) && !product.active {
        return Err(ApiError::not_found(format!("Product not found with id: {}", id)));
    }
    Ok(ApiResponse::success(product))
}

/// GET /api/v1/products/slug/:slug
pub async fn product_show_by_slug(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(slug): Path<String>,
) -> ApiResult<Product> {
    let product = state
        .services
        .products
        .get_product_by_slug(auth.tenant_id, &slug)
        .await?;
    if browsing_only(&auth) && !product.active {
        return Err(ApiError::not_found(format!("Product not found with slug: {}", slug)));
    }
    Ok(ApiResponse::success(product))
}

/// PUT /api/v1/products/:id
pub async fn product_update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(changes): Json<ProductChanges>,
) -> ApiResult<Product> {
    Ok(ApiResponse::success(
        state
            .services
            .products
            .update_product(auth.tenant_id, id, changes)
            .await?,
    ))
}

/// DELETE /api/v1/products/:id
pub async fn product_delete(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<()> {
    state.services.products.delete_product(auth.tenant_id, id).await?;
    Ok(ApiResponse::no_content())
}

/// PUT /api/v1/products/:id/variants/:variantId - price, name or stock level
pub async fn variant_update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((product_id, variant_id)): Path<(Uuid, Uuid)>,
    Json(changes): Json<VariantChanges>,
) -> ApiResult<ProductVariant> {
    Ok(ApiResponse::success(
        state
            .services
            .products
            .update_variant(auth.tenant_id, product_id, variant_id, changes)
            .await?,
    ))
}
