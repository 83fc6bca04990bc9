use anyhow::Context;

use crate::app::build_router;
use crate::cli::context::postgres_stores;
use crate::config::config;
use crate::database::Stores;
use crate::payment::PaymentDispatcher;
use crate::state::AppState;

pub async fn handle(in_memory: bool) -> anyhow::Result<()> {
    let config = config();
    config.validate().map_err(anyhow::Error::msg)?;
    tracing::info!("Starting Storefront API in {:?} mode", config.environment);

    if in_memory && crate::is_production!() {
        anyhow::bail!("--in-memory is not allowed in production");
    }

    let stores = if in_memory {
        tracing::warn!("Using in-memory storage; data is lost on shutdown");
        Stores::memory()
    } else {
        postgres_stores(config).await?
    };

    let state = AppState::new(config.clone(), stores, PaymentDispatcher::with_defaults())
        .context("failed to initialise token signing")?;

    // Plan catalog must exist before the first subscription
    let seeded = state.services.subscriptions.seed_default_plans().await?;
    if !seeded.is_empty() {
        tracing::info!("Seeded {} subscription plans", seeded.len());
    }

    let app = build_router(state);

    let bind_addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Storefront API listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    tracing::info!("Shutdown signal received");
}
