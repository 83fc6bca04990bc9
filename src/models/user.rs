use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{TenantScope, Timestamps};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Merchant,
    Staff,
    Customer,
}

text_enum!(Role, "role", {
    Admin => "ADMIN",
    Merchant => "MERCHANT",
    Staff => "STAFF",
    Customer => "CUSTOMER",
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub enabled: bool,
    #[serde(flatten)]
    pub scope: TenantScope,
    #[serde(flatten)]
    pub timestamps: Timestamps,
}

impl User {
    pub fn new(
        tenant_id: Uuid,
        email: impl Into<String>,
        full_name: impl Into<String>,
        password_hash: impl Into<String>,
        role: Role,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: email.into(),
            full_name: full_name.into(),
            password_hash: password_hash.into(),
            role,
            enabled: true,
            scope: TenantScope::new(tenant_id),
            timestamps: Timestamps::now(),
        }
    }
}
