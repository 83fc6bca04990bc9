use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;
use uuid::Uuid;

use super::{decode, PgStore};
use crate::database::manager::{DatabaseError, DatabaseResult};
use crate::database::store::SubscriptionStore;
use crate::models::{
    Subscription, SubscriptionPlan, SubscriptionStatus, TenantOwned, TenantScope,
};

const PLAN_COLUMNS: &str = "id, name, slug, price, billing_interval, features, active";
const SUBSCRIPTION_COLUMNS: &str =
    "id, tenant_id, plan_id, status, start_date, end_date, auto_renew";

#[derive(FromRow)]
struct PlanRow {
    id: Uuid,
    name: String,
    slug: String,
    price: Decimal,
    billing_interval: String,
    features: String,
    active: bool,
}

impl TryFrom<PlanRow> for SubscriptionPlan {
    type Error = DatabaseError;

    fn try_from(row: PlanRow) -> Result<Self, Self::Error> {
        Ok(SubscriptionPlan {
            id: row.id,
            name: row.name,
            slug: row.slug,
            price: row.price,
            billing_interval: decode(&row.billing_interval)?,
            features: row.features,
            active: row.active,
        })
    }
}

#[derive(FromRow)]
struct SubscriptionRow {
    id: Uuid,
    tenant_id: Uuid,
    plan_id: Uuid,
    status: String,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
    auto_renew: bool,
}

impl TryFrom<SubscriptionRow> for Subscription {
    type Error = DatabaseError;

    fn try_from(row: SubscriptionRow) -> Result<Self, Self::Error> {
        Ok(Subscription {
            id: row.id,
            plan_id: row.plan_id,
            status: decode(&row.status)?,
            start_date: row.start_date,
            end_date: row.end_date,
            auto_renew: row.auto_renew,
            scope: TenantScope::new(row.tenant_id),
        })
    }
}

#[async_trait]
impl SubscriptionStore for PgStore {
    async fn insert_plan(&self, plan: &SubscriptionPlan) -> DatabaseResult<()> {
        sqlx::query(
            "INSERT INTO subscription_plans (id, name, slug, price, billing_interval, features, active)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(plan.id)
        .bind(&plan.name)
        .bind(&plan.slug)
        .bind(plan.price)
        .bind(plan.billing_interval.as_str())
        .bind(&plan.features)
        .bind(plan.active)
        .execute(self.pool())
        .await
        .map_err(|err| DatabaseError::from_write(err, "subscription plan"))?;
        Ok(())
    }

    async fn update_plan(&self, plan: &SubscriptionPlan) -> DatabaseResult<()> {
        let result = sqlx::query(
            "UPDATE subscription_plans
             SET name = $2, slug = $3, price = $4, billing_interval = $5, features = $6, active = $7
             WHERE id = $1",
        )
        .bind(plan.id)
        .bind(&plan.name)
        .bind(&plan.slug)
        .bind(plan.price)
        .bind(plan.billing_interval.as_str())
        .bind(&plan.features)
        .bind(plan.active)
        .execute(self.pool())
        .await
        .map_err(|err| DatabaseError::from_write(err, "subscription plan"))?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("plan {}", plan.id)));
        }
        Ok(())
    }

    async fn find_plan(&self, id: Uuid) -> DatabaseResult<Option<SubscriptionPlan>> {
        let row = sqlx::query_as::<_, PlanRow>(&format!(
            "SELECT {PLAN_COLUMNS} FROM subscription_plans WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await?;
        row.map(SubscriptionPlan::try_from).transpose()
    }

    async fn find_plan_by_slug(&self, slug: &str) -> DatabaseResult<Option<SubscriptionPlan>> {
        let row = sqlx::query_as::<_, PlanRow>(&format!(
            "SELECT {PLAN_COLUMNS} FROM subscription_plans WHERE slug = $1"
        ))
        .bind(slug)
        .fetch_optional(self.pool())
        .await?;
        row.map(SubscriptionPlan::try_from).transpose()
    }

    async fn list_plans(&self, active_only: bool) -> DatabaseResult<Vec<SubscriptionPlan>> {
        let rows = sqlx::query_as::<_, PlanRow>(&format!(
            "SELECT {PLAN_COLUMNS} FROM subscription_plans
             WHERE active OR NOT $1
             ORDER BY price, name"
        ))
        .bind(active_only)
        .fetch_all(self.pool())
        .await?;
        rows.into_iter().map(SubscriptionPlan::try_from).collect()
    }

    async fn find_active(&self, tenant_id: Uuid) -> DatabaseResult<Option<Subscription>> {
        let row = sqlx::query_as::<_, SubscriptionRow>(&format!(
            "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions WHERE tenant_id = $1 AND status = $2"
        ))
        .bind(tenant_id)
        .bind(SubscriptionStatus::Active.as_str())
        .fetch_optional(self.pool())
        .await?;
        row.map(Subscription::try_from).transpose()
    }

    async fn activate(&self, subscription: &Subscription) -> DatabaseResult<()> {
        let mut tx = self.pool().begin().await?;

        sqlx::query("UPDATE subscriptions SET status = $2 WHERE tenant_id = $1 AND status = $3")
            .bind(subscription.tenant_id())
            .bind(SubscriptionStatus::Canceled.as_str())
            .bind(SubscriptionStatus::Active.as_str())
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "INSERT INTO subscriptions (id, tenant_id, plan_id, status, start_date, end_date, auto_renew)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(subscription.id)
        .bind(subscription.tenant_id())
        .bind(subscription.plan_id)
        .bind(subscription.status.as_str())
        .bind(subscription.start_date)
        .bind(subscription.end_date)
        .bind(subscription.auto_renew)
        .execute(&mut *tx)
        .await
        .map_err(|err| DatabaseError::from_write(err, "subscription"))?;

        tx.commit().await?;
        Ok(())
    }

    async fn update(&self, subscription: &Subscription) -> DatabaseResult<()> {
        let result = sqlx::query(
            "UPDATE subscriptions SET status = $3, end_date = $4, auto_renew = $5
             WHERE tenant_id = $1 AND id = $2",
        )
        .bind(subscription.tenant_id())
        .bind(subscription.id)
        .bind(subscription.status.as_str())
        .bind(subscription.end_date)
        .bind(subscription.auto_renew)
        .execute(self.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("subscription {}", subscription.id)));
        }
        Ok(())
    }
}
