use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Creation and modification times shared by every persisted entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timestamps {
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Timestamps {
    pub fn now() -> Self {
        let now = Utc::now();
        Self {
            created_at: now,
            updated_at: now,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Owning tenant of a tenant-scoped entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantScope {
    pub tenant_id: Uuid,
}

impl TenantScope {
    pub fn new(tenant_id: Uuid) -> Self {
        Self { tenant_id }
    }
}

/// Implemented by every entity that lives inside a tenant.
pub trait TenantOwned {
    fn scope(&self) -> TenantScope;

    fn tenant_id(&self) -> Uuid {
        self.scope().tenant_id
    }

    fn belongs_to(&self, tenant_id: Uuid) -> bool {
        self.tenant_id() == tenant_id
    }
}

macro_rules! tenant_owned {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::models::base::TenantOwned for $ty {
                fn scope(&self) -> $crate::models::base::TenantScope {
                    self.scope
                }
            }
        )+
    };
}

tenant_owned!(
    super::User,
    super::Customer,
    super::Order,
    super::Cart,
    super::Invoice,
    super::Payment,
    super::Subscription,
    super::Product,
    super::ProductVariant,
    super::Discount,
    super::DiscountUsage,
);
