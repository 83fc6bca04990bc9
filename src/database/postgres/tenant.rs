use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use crate::database::manager::{DatabaseError, DatabaseResult};
use crate::database::store::TenantStore;
use super::PgStore;
use crate::models::{Tenant, Timestamps, User};

const COLUMNS: &str = "id, name, slug, owner_email, active, created_at, updated_at";

#[derive(FromRow)]
struct TenantRow {
    id: Uuid,
    name: String,
    slug: String,
    owner_email: String,
    active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<TenantRow> for Tenant {
    fn from(row: TenantRow) -> Self {
        Tenant {
            id: row.id,
            name: row.name,
            slug: row.slug,
            owner_email: row.owner_email,
            active: row.active,
            timestamps: Timestamps {
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
        }
    }
}

pub(super) async fn insert_tenant<'e, E>(executor: E, tenant: &Tenant) -> DatabaseResult<()>
where
    E: sqlx::PgExecutor<'e>,
{
    sqlx::query(
        "INSERT INTO tenants (id, name, slug, owner_email, active, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(tenant.id)
    .bind(&tenant.name)
    .bind(&tenant.slug)
    .bind(&tenant.owner_email)
    .bind(tenant.active)
    .bind(tenant.timestamps.created_at)
    .bind(tenant.timestamps.updated_at)
    .execute(executor)
    .await
    .map_err(|err| DatabaseError::from_write(err, "tenant"))?;
    Ok(())
}

#[async_trait]
impl TenantStore for PgStore {
    async fn insert(&self, tenant: &Tenant) -> DatabaseResult<()> {
        insert_tenant(self.pool(), tenant).await
    }

    async fn insert_with_owner(&self, tenant: &Tenant, owner: &User) -> DatabaseResult<()> {
        let mut tx = self.pool().begin().await?;
        insert_tenant(&mut *tx, tenant).await?;
        super::user::insert_user(&mut *tx, owner).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<Tenant>> {
        let row = sqlx::query_as::<_, TenantRow>(&format!(
            "SELECT {COLUMNS} FROM tenants WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await?;
        Ok(row.map(Tenant::from))
    }

    async fn find_by_slug(&self, slug: &str) -> DatabaseResult<Option<Tenant>> {
        let row = sqlx::query_as::<_, TenantRow>(&format!(
            "SELECT {COLUMNS} FROM tenants WHERE slug = $1"
        ))
        .bind(slug)
        .fetch_optional(self.pool())
        .await?;
        Ok(row.map(Tenant::from))
    }

    async fn exists_by_slug(&self, slug: &str) -> DatabaseResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM tenants WHERE slug = $1)")
            .bind(slug)
            .fetch_one(self.pool())
            .await?;
        Ok(exists)
    }

    async fn exists_by_name(&self, name: &str) -> DatabaseResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM tenants WHERE name = $1)")
            .bind(name)
            .fetch_one(self.pool())
            .await?;
        Ok(exists)
    }

    async fn list(&self) -> DatabaseResult<Vec<Tenant>> {
        let rows = sqlx::query_as::<_, TenantRow>(&format!(
            "SELECT {COLUMNS} FROM tenants ORDER BY created_at, id"
        ))
        .fetch_all(self.pool())
        .await?;
        Ok(rows.into_iter().map(Tenant::from).collect())
    }
}
