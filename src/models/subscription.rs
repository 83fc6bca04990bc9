use chrono::{DateTime, Months, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::TenantScope;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BillingInterval {
    Monthly,
    Yearly,
}

text_enum!(BillingInterval, "billing interval", {
    Monthly => "MONTHLY",
    Yearly => "YEARLY",
});

impl BillingInterval {
    pub fn months(&self) -> u32 {
        match self {
            BillingInterval::Monthly => 1,
            BillingInterval::Yearly => 12,
        }
    }

    /// End of a billing period starting at `start`.
    pub fn period_end(&self, start: DateTime<Utc>) -> DateTime<Utc> {
        start
            .checked_add_months(Months::new(self.months()))
            .unwrap_or(start)
    }
}

/// Platform-wide plan a tenant can subscribe to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionPlan {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub price: Decimal,
    pub billing_interval: BillingInterval,
    pub features: String,
    pub active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubscriptionStatus {
    Active,
    Canceled,
    Expired,
}

text_enum!(SubscriptionStatus, "subscription status", {
    Active => "ACTIVE",
    Canceled => "CANCELED",
    Expired => "EXPIRED",
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub id: Uuid,
    pub plan_id: Uuid,
    pub status: SubscriptionStatus,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub auto_renew: bool,
    #[serde(flatten)]
    pub scope: TenantScope,
}

impl Subscription {
    pub fn start(tenant_id: Uuid, plan: &SubscriptionPlan) -> Self {
        let start_date = Utc::now();
        Self {
            id: Uuid::new_v4(),
            plan_id: plan.id,
            status: SubscriptionStatus::Active,
            start_date,
            end_date: plan.billing_interval.period_end(start_date),
            auto_renew: true,
            scope: TenantScope::new(tenant_id),
        }
    }
}
