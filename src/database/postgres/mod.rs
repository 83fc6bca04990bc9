//! Postgres backend.
//!
//! Rows are read into private `FromRow` structs and converted to models;
//! enum columns are stored as their upper-case labels and parsed back on
//! read. Multi-row writes run in a transaction.

mod billing;
mod customer;
mod discount;
mod order;
mod product;
mod subscription;
mod tenant;
mod user;

use std::str::FromStr;

use async_trait::async_trait;
use sqlx::PgPool;

use super::manager::{DatabaseError, DatabaseManager, DatabaseResult};
use super::store::HealthCheck;
use crate::models::UnknownVariant;

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Parse a stored enum label.
fn decode<T>(raw: &str) -> DatabaseResult<T>
where
    T: FromStr<Err = UnknownVariant>,
{
    raw.parse::<T>()
        .map_err(|err| DatabaseError::Decode(err.to_string()))
}

#[async_trait]
impl HealthCheck for PgStore {
    async fn ping(&self) -> DatabaseResult<()> {
        DatabaseManager::health_check(&self.pool).await
    }
}
