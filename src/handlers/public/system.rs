// handlers/public/system.rs - GET / and GET /health

use axum::{extract::State, http::StatusCode, response::Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// Service banner with a route overview.
pub async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "Storefront API",
            "version": version,
            "description": "Multi-tenant commerce backend",
            "endpoints": {
                "tenants": "/api/v1/tenants[/:slug|/my]",
                "auth": "/api/v1/auth/{register,login,customer/:storeSlug/register} (public)",
                "users": "/api/v1/users (protected)",
                "customers": "/api/v1/customers (protected)",
                "orders": "/api/v1/orders (protected)",
                "billing": "/api/v1/invoices, /api/v1/payments (protected)",
                "subscriptions": "/api/v1/subscriptions (plans public, rest protected)"
            }
        }
    }))
}

/// Liveness plus a storage round trip. 503 when the store is unreachable.
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let now = chrono::Utc::now();

    match state.health.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "error": true,
                    "message": "database unavailable",
                    "code": "SERVICE_UNAVAILABLE",
                    "data": {
                        "status": "degraded",
                        "timestamp": now
                    }
                })),
            )
        }
    }
}
