use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use super::PgStore;
use crate::database::manager::{DatabaseError, DatabaseResult};
use crate::database::store::CustomerStore;
use crate::models::{Customer, TenantOwned, TenantScope, Timestamps};

const COLUMNS: &str =
    "id, tenant_id, first_name, last_name, email, phone, active, created_at, updated_at";

#[derive(FromRow)]
struct CustomerRow {
    id: Uuid,
    tenant_id: Uuid,
    first_name: String,
    last_name: String,
    email: String,
    phone: Option<String>,
    active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CustomerRow> for Customer {
    fn from(row: CustomerRow) -> Self {
        Customer {
            id: row.id,
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            phone: row.phone,
            active: row.active,
            scope: TenantScope::new(row.tenant_id),
            timestamps: Timestamps {
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
        }
    }
}

pub(super) async fn insert_customer<'e, E>(executor: E, customer: &Customer) -> DatabaseResult<()>
where
    E: sqlx::PgExecutor<'e>,
{
    sqlx::query(
        "INSERT INTO customers (id, tenant_id, first_name, last_name, email, phone, active, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
    )
    .bind(customer.id)
    .bind(customer.tenant_id())
    .bind(&customer.first_name)
    .bind(&customer.last_name)
    .bind(&customer.email)
    .bind(&customer.phone)
    .bind(customer.active)
    .bind(customer.timestamps.created_at)
    .bind(customer.timestamps.updated_at)
    .execute(executor)
    .await
    .map_err(|err| DatabaseError::from_write(err, "customer"))?;
    Ok(())
}

#[async_trait]
impl CustomerStore for PgStore {
    async fn insert(&self, customer: &Customer) -> DatabaseResult<()> {
        insert_customer(self.pool(), customer).await
    }

    async fn find_by_id(&self, tenant_id: Uuid, id: Uuid) -> DatabaseResult<Option<Customer>> {
        let row = sqlx::query_as::<_, CustomerRow>(&format!(
            "SELECT {COLUMNS} FROM customers WHERE tenant_id = $1 AND id = $2"
        ))
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(self.pool())
        .await?;
        Ok(row.map(Customer::from))
    }

    async fn find_by_email(&self, tenant_id: Uuid, email: &str) -> DatabaseResult<Option<Customer>> {
        let row = sqlx::query_as::<_, CustomerRow>(&format!(
            "SELECT {COLUMNS} FROM customers WHERE tenant_id = $1 AND email = $2"
        ))
        .bind(tenant_id)
        .bind(email)
        .fetch_optional(self.pool())
        .await?;
        Ok(row.map(Customer::from))
    }

    async fn exists_by_email(&self, tenant_id: Uuid, email: &str) -> DatabaseResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM customers WHERE tenant_id = $1 AND email = $2)",
        )
        .bind(tenant_id)
        .bind(email)
        .fetch_one(self.pool())
        .await?;
        Ok(exists)
    }

    async fn list(&self, tenant_id: Uuid) -> DatabaseResult<Vec<Customer>> {
        let rows = sqlx::query_as::<_, CustomerRow>(&format!(
            "SELECT {COLUMNS} FROM customers WHERE tenant_id = $1 ORDER BY created_at, id"
        ))
        .bind(tenant_id)
        .fetch_all(self.pool())
        .await?;
        Ok(rows.into_iter().map(Customer::from).collect())
    }

    async fn update(&self, customer: &Customer) -> DatabaseResult<()> {
        let result = sqlx::query(
            "UPDATE customers
             SET first_name = $3, last_name = $4, email = $5, phone = $6, active = $7, updated_at = $8
             WHERE tenant_id = $1 AND id = $2",
        )
        .bind(customer.tenant_id())
        .bind(customer.id)
        .bind(&customer.first_name)
        .bind(&customer.last_name)
        .bind(&customer.email)
        .bind(&customer.phone)
        .bind(customer.active)
        .bind(customer.timestamps.updated_at)
        .execute(self.pool())
        .await
        .map_err(|err| DatabaseError::from_write(err, "customer"))?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("customer {}", customer.id)));
        }
        Ok(())
    }

    async fn delete(&self, tenant_id: Uuid, id: Uuid) -> DatabaseResult<()> {
        let result = sqlx::query("DELETE FROM customers WHERE tenant_id = $1 AND id = $2")
            .bind(tenant_id)
            .bind(id)
            .execute(self.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("customer {}", id)));
        }
        Ok(())
    }
}
