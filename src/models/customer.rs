use serde::Serialize;
use uuid::Uuid;

use super::{TenantScope, Timestamps};

/// CRM record for a shopper of one store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub active: bool,
    #[serde(flatten)]
    pub scope: TenantScope,
    #[serde(flatten)]
    pub timestamps: Timestamps,
}

impl Customer {
    pub fn new(
        tenant_id: Uuid,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
        phone: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: email.into(),
            phone,
            active: true,
            scope: TenantScope::new(tenant_id),
            timestamps: Timestamps::now(),
        }
    }
}
