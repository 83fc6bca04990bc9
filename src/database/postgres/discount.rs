use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;
use uuid::Uuid;

use super::{decode, PgStore};
use crate::database::manager::{DatabaseError, DatabaseResult};
use crate::database::store::DiscountStore;
use crate::models::{Discount, TenantOwned, TenantScope, Timestamps};

const COLUMNS: &str = "id, tenant_id, code, description, discount_type, value, min_order_amount, \
     max_discount_amount, usage_limit, usage_limit_per_customer, times_used, starts_at, expires_at, \
     active, created_at, updated_at";

#[derive(FromRow)]
struct DiscountRow {
    id: Uuid,
    tenant_id: Uuid,
    code: String,
    description: Option<String>,
    discount_type: String,
    value: Decimal,
    min_order_amount: Option<Decimal>,
    max_discount_amount: Option<Decimal>,
    usage_limit: Option<i64>,
    usage_limit_per_customer: Option<i64>,
    times_used: i64,
    starts_at: Option<DateTime<Utc>>,
    expires_at: Option<DateTime<Utc>>,
    active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn count(raw: i64) -> DatabaseResult<u32> {
    u32::try_from(raw).map_err(|_| DatabaseError::Decode(format!("count {}", raw)))
}

impl TryFrom<DiscountRow> for Discount {
    type Error = DatabaseError;

    fn try_from(row: DiscountRow) -> Result<Self, Self::Error> {
        Ok(Discount {
            id: row.id,
            code: row.code,
            description: row.description,
            discount_type: decode(&row.discount_type)?,
            value: row.value,
            min_order_amount: row.min_order_amount,
            max_discount_amount: row.max_discount_amount,
            usage_limit: row.usage_limit.map(count).transpose()?,
            usage_limit_per_customer: row.usage_limit_per_customer.map(count).transpose()?,
            times_used: count(row.times_used)?,
            starts_at: row.starts_at,
            expires_at: row.expires_at,
            active: row.active,
            scope: TenantScope::new(row.tenant_id),
            timestamps: Timestamps {
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
        })
    }
}

#[async_trait]
impl DiscountStore for PgStore {
    async fn insert(&self, discount: &Discount) -> DatabaseResult<()> {
        sqlx::query(
            "INSERT INTO discounts (id, tenant_id, code, description, discount_type, value,
                 min_order_amount, max_discount_amount, usage_limit, usage_limit_per_customer,
                 times_used, starts_at, expires_at, active, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)",
        )
        .bind(discount.id)
        .bind(discount.tenant_id())
        .bind(&discount.code)
        .bind(&discount.description)
        .bind(discount.discount_type.as_str())
        .bind(discount.value)
        .bind(discount.min_order_amount)
        .bind(discount.max_discount_amount)
        .bind(discount.usage_limit.map(i64::from))
        .bind(discount.usage_limit_per_customer.map(i64::from))
        .bind(i64::from(discount.times_used))
        .bind(discount.starts_at)
        .bind(discount.expires_at)
        .bind(discount.active)
        .bind(discount.timestamps.created_at)
        .bind(discount.timestamps.updated_at)
        .execute(self.pool())
        .await
        .map_err(|err| DatabaseError::from_write(err, "discount code"))?;
        Ok(())
    }

    async fn update(&self, discount: &Discount) -> DatabaseResult<()> {
        let result = sqlx::query(
            "UPDATE discounts
             SET code = $3, description = $4, discount_type = $5, value = $6,
                 min_order_amount = $7, max_discount_amount = $8, usage_limit = $9,
                 usage_limit_per_customer = $10, starts_at = $11, expires_at = $12,
                 active = $13, updated_at = $14
             WHERE tenant_id = $1 AND id = $2",
        )
        .bind(discount.tenant_id())
        .bind(discount.id)
        .bind(&discount.code)
        .bind(&discount.description)
        .bind(discount.discount_type.as_str())
        .bind(discount.value)
        .bind(discount.min_order_amount)
        .bind(discount.max_discount_amount)
        .bind(discount.usage_limit.map(i64::from))
        .bind(discount.usage_limit_per_customer.map(i64::from))
        .bind(discount.starts_at)
        .bind(discount.expires_at)
        .bind(discount.active)
        .bind(discount.timestamps.updated_at)
        .execute(self.pool())
        .await
        .map_err(|err| DatabaseError::from_write(err, "discount code"))?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("discount {}", discount.id)));
        }
        Ok(())
    }

    async fn find_by_id(&self, tenant_id: Uuid, id: Uuid) -> DatabaseResult<Option<Discount>> {
        let row = sqlx::query_as::<_, DiscountRow>(&format!(
            "SELECT {COLUMNS} FROM discounts WHERE tenant_id = $1 AND id = $2"
        ))
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(self.pool())
        .await?;
        row.map(Discount::try_from).transpose()
    }

    async fn find_by_code(&self, tenant_id: Uuid, code: &str) -> DatabaseResult<Option<Discount>> {
        let row = sqlx::query_as::<_, DiscountRow>(&format!(
            "SELECT {COLUMNS} FROM discounts WHERE tenant_id = $1 AND code = $2"
        ))
        .bind(tenant_id)
        .bind(code)
        .fetch_optional(self.pool())
        .await?;
        row.map(Discount::try_from).transpose()
    }

    async fn list(&self, tenant_id: Uuid, active_only: bool) -> DatabaseResult<Vec<Discount>> {
        let rows = sqlx::query_as::<_, DiscountRow>(&format!(
            "SELECT {COLUMNS} FROM discounts
             WHERE tenant_id = $1 AND (active OR NOT $2)
             ORDER BY created_at, id"
        ))
        .bind(tenant_id)
        .bind(active_only)
        .fetch_all(self.pool())
        .await?;
        rows.into_iter().map(Discount::try_from).collect()
    }

    async fn delete(&self, tenant_id: Uuid, id: Uuid) -> DatabaseResult<()> {
        let result = sqlx::query("DELETE FROM discounts WHERE tenant_id = $1 AND id = $2")
            .bind(tenant_id)
            .bind(id)
            .execute(self.pool())
            .await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("discount {}", id)));
        }
        Ok(())
    }

    async fn count_usages(&self, tenant_id: Uuid, discount_id: Uuid, customer_email: &str) -> DatabaseResult<u32> {
        let used: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM discount_usages
             WHERE tenant_id = $1 AND discount_id = $2 AND customer_email = $3",
        )
        .bind(tenant_id)
        .bind(discount_id)
        .bind(customer_email)
        .fetch_one(self.pool())
        .await?;
        count(used)
    }
}
