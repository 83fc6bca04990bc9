use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use super::customer::insert_customer;
use super::{decode, PgStore};
use crate::database::manager::{DatabaseError, DatabaseResult};
use crate::database::store::UserStore;
use crate::models::{Customer, TenantOwned, TenantScope, Timestamps, User};

const COLUMNS: &str =
    "id, tenant_id, email, full_name, password_hash, role, enabled, created_at, updated_at";

#[derive(FromRow)]
struct UserRow {
    id: Uuid,
    tenant_id: Uuid,
    email: String,
    full_name: String,
    password_hash: String,
    role: String,
    enabled: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = DatabaseError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: row.id,
            email: row.email,
            full_name: row.full_name,
            password_hash: row.password_hash,
            role: decode(&row.role)?,
            enabled: row.enabled,
            scope: TenantScope::new(row.tenant_id),
            timestamps: Timestamps {
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
        })
    }
}

fn into_users(rows: Vec<UserRow>) -> DatabaseResult<Vec<User>> {
    rows.into_iter().map(User::try_from).collect()
}

pub(super) async fn insert_user<'e, E>(executor: E, user: &User) -> DatabaseResult<()>
where
    E: sqlx::PgExecutor<'e>,
{
    sqlx::query(
        "INSERT INTO users (id, tenant_id, email, full_name, password_hash, role, enabled, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
    )
    .bind(user.id)
    .bind(user.tenant_id())
    .bind(&user.email)
    .bind(&user.full_name)
    .bind(&user.password_hash)
    .bind(user.role.as_str())
    .bind(user.enabled)
    .bind(user.timestamps.created_at)
    .bind(user.timestamps.updated_at)
    .execute(executor)
    .await
    .map_err(|err| DatabaseError::from_write(err, "user"))?;
    Ok(())
}

#[async_trait]
impl UserStore for PgStore {
    async fn insert(&self, user: &User) -> DatabaseResult<()> {
        insert_user(self.pool(), user).await
    }

    async fn find_by_id(&self, tenant_id: Uuid, id: Uuid) -> DatabaseResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {COLUMNS} FROM users WHERE tenant_id = $1 AND id = $2"
        ))
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(self.pool())
        .await?;
        row.map(User::try_from).transpose()
    }

    async fn find_by_email(&self, tenant_id: Uuid, email: &str) -> DatabaseResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {COLUMNS} FROM users WHERE tenant_id = $1 AND email = $2"
        ))
        .bind(tenant_id)
        .bind(email)
        .fetch_optional(self.pool())
        .await?;
        row.map(User::try_from).transpose()
    }

    async fn exists_by_email(&self, tenant_id: Uuid, email: &str) -> DatabaseResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM users WHERE tenant_id = $1 AND email = $2)",
        )
        .bind(tenant_id)
        .bind(email)
        .fetch_one(self.pool())
        .await?;
        Ok(exists)
    }

    async fn list_by_tenant(&self, tenant_id: Uuid) -> DatabaseResult<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {COLUMNS} FROM users WHERE tenant_id = $1 ORDER BY created_at, id"
        ))
        .bind(tenant_id)
        .fetch_all(self.pool())
        .await?;
        into_users(rows)
    }

    async fn list_by_email(&self, email: &str) -> DatabaseResult<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {COLUMNS} FROM users WHERE email = $1 ORDER BY created_at, id"
        ))
        .bind(email)
        .fetch_all(self.pool())
        .await?;
        into_users(rows)
    }

    async fn insert_with_customer(&self, user: &User, customer: &Customer) -> DatabaseResult<()> {
        let mut tx = self.pool().begin().await?;
        insert_user(&mut *tx, user).await?;
        insert_customer(&mut *tx, customer).await?;
        tx.commit().await?;
        Ok(())
    }
}
