// handlers/protected/billing.rs - invoice and payment history for the caller's store

use axum::extract::State;

use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::models::{Invoice, Payment};
use crate::state::AppState;

/// GET /api/v1/invoices
pub async fn invoice_list(State(state): State<AppState>, auth: AuthUser) -> ApiResult<Vec<Invoice>> {
    Ok(ApiResponse::success(
        state.services.billing.list_invoices(auth.tenant_id).await?,
    ))
}

/// GET /api/v1/payments
pub async fn payment_list(State(state): State<AppState>, auth: AuthUser) -> ApiResult<Vec<Payment>> {
    Ok(ApiResponse::success(
        state.services.billing.list_payments(auth.tenant_id).await?,
    ))
}
