use std::sync::Arc;

use crate::auth::{AuthError, JwtKeys};
use crate::config::AppConfig;
use crate::database::{HealthCheck, Stores};
use crate::payment::PaymentDispatcher;
use crate::services::Services;

/// Shared handler state. Cloned per request; everything inside is `Arc`ed.
#[derive(Clone)]
pub struct AppState {
    pub services: Services,
    pub jwt: Arc<JwtKeys>,
    pub health: Arc<dyn HealthCheck>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(config: AppConfig, stores: Stores, payments: PaymentDispatcher) -> Result<Self, AuthError> {
        let jwt = JwtKeys::from_config(&config.security)?;
        let services = Services::new(&stores, Arc::new(payments), &config.payment.default_currency);
        Ok(Self {
            services,
            jwt: Arc::new(jwt),
            health: stores.health,
            config: Arc::new(config),
        })
    }
}
