//! Process wiring shared by the CLI commands.

use anyhow::Context;

use crate::config::AppConfig;
use crate::database::{DatabaseManager, Stores};
use crate::services::Services;
use crate::payment::PaymentDispatcher;
use std::sync::Arc;

/// Connect to PostgreSQL, bring the schema up to date and wrap the pool.
pub async fn postgres_stores(config: &AppConfig) -> anyhow::Result<Stores> {
    let pool = DatabaseManager::connect(&config.database)
        .await
        .context("failed to connect to database")?;
    DatabaseManager::migrate(&pool)
        .await
        .context("failed to apply migrations")?;
    Ok(Stores::postgres(pool))
}

/// Services over PostgreSQL for one-shot administrative commands.
pub async fn services(config: &AppConfig) -> anyhow::Result<Services> {
    let stores = postgres_stores(config).await?;
    Ok(Services::new(
        &stores,
        Arc::new(PaymentDispatcher::with_defaults()),
        &config.payment.default_currency,
    ))
}
