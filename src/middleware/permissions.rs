//! Capability-based authorization.
//!
//! Each role maps to a fixed set of capabilities; routes declare the one they
//! need through [`require_capability`]. ADMIN holds every capability.

use std::collections::HashSet;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use super::auth::AuthUser;
use crate::error::ApiError;
use crate::models::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Capability {
    // Carts, checkout and own orders
    Shop,

    // Store back office
    ManageOrders,
    ManageCustomers,
    ManageUsers,
    ManageCatalog,
    ViewBilling,
    ManageSubscription,

    // Platform
    ManagePlans,
}

impl Capability {
    pub const ALL: &'static [Capability] = &[
        Capability::Shop,
        Capability::ManageOrders,
        Capability::ManageCustomers,
        Capability::ManageUsers,
        Capability::ManageCatalog,
        Capability::ViewBilling,
        Capability::ManageSubscription,
        Capability::ManagePlans,
    ];

    pub fn for_role(role: Role) -> HashSet<Capability> {
        use Capability::*;
        match role {
            Role::Admin => Self::ALL.iter().copied().collect(),
            Role::Merchant => [
                Shop,
                ManageOrders,
                ManageCustomers,
                ManageUsers,
                ManageCatalog,
                ViewBilling,
                ManageSubscription,
            ]
            .into_iter()
            .collect(),
            Role::Staff => [Shop, ManageOrders].into_iter().collect(),
            Role::Customer => [Shop].into_iter().collect(),
        }
    }
}

pub fn has_capability(role: Role, required: Capability) -> bool {
    role == Role::Admin || Capability::for_role(role).contains(&required)
}

/// Route layer: `from_fn_with_state(Capability::X, require_capability)`.
/// Must run after the JWT middleware.
pub async fn require_capability(
    State(required): State<Capability>,
    request: Request,
    next: Next,
) -> Response {
    let Some(user) = request.extensions().get::<AuthUser>() else {
        return ApiError::unauthorized("Authentication required").into_response();
    };

    if !has_capability(user.role, required) {
        tracing::warn!(
            user_id = %user.user_id,
            role = %user.role,
            capability = ?required,
            "access denied"
        );
        return ApiError::forbidden("Access denied: insufficient permissions").into_response();
    }

    next.run(request).await
}
