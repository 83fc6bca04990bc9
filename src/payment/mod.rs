//! Payment dispatch.
//!
//! A [`PaymentDispatcher`] holds one [`PaymentGateway`] per [`PaymentMethod`].
//! Requests name their method as free text (`"mock"`, `"STRIPE"`, ...); the
//! name is upper-cased, defaults to `MOCK` when absent, and is resolved to
//! the enum before lookup so handlers are never keyed by raw strings.

pub mod mock;

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use mock::MockGateway;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Mock,
    Stripe,
    Paypal,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Mock => "MOCK",
            PaymentMethod::Stripe => "STRIPE",
            PaymentMethod::Paypal => "PAYPAL",
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = PaymentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MOCK" => Ok(PaymentMethod::Mock),
            "STRIPE" => Ok(PaymentMethod::Stripe),
            "PAYPAL" => Ok(PaymentMethod::Paypal),
            other => Err(PaymentError::UnsupportedMethod(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub amount: Decimal,
    pub currency: String,
    pub payment_method: Option<String>,
    pub description: String,
    pub payment_token: Option<String>,
}

impl PaymentRequest {
    /// Method name as the dispatcher sees it: trimmed, upper-cased, `MOCK`
    /// when missing or blank.
    pub fn method_name(&self) -> String {
        match self.payment_method.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_ascii_uppercase(),
            _ => PaymentMethod::Mock.as_str().to_string(),
        }
    }
}

/// Result reported by a gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentOutcome {
    pub method: PaymentMethod,
    pub success: bool,
    pub transaction_id: Option<String>,
    pub failure_reason: Option<String>,
}

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("Unsupported payment method: {0}")]
    UnsupportedMethod(String),

    #[error("A gateway is already registered for {0}")]
    DuplicateGateway(PaymentMethod),

    #[error("Payment gateway error: {0}")]
    Gateway(String),
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    fn method(&self) -> PaymentMethod;

    async fn process(&self, request: &PaymentRequest) -> Result<PaymentOutcome, PaymentError>;
}

#[derive(Clone, Default)]
pub struct PaymentDispatcher {
    gateways: HashMap<PaymentMethod, Arc<dyn PaymentGateway>>,
}

impl PaymentDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dispatcher with the built-in mock gateway registered.
    pub fn with_defaults() -> Self {
        let mut dispatcher = Self::new();
        dispatcher.gateways.insert(PaymentMethod::Mock, Arc::new(MockGateway));
        dispatcher
    }

    /// Register a gateway under its own method. The first registration for a
    /// method wins; later ones are rejected.
    pub fn register(&mut self, gateway: Arc<dyn PaymentGateway>) -> Result<(), PaymentError> {
        let method = gateway.method();
        if self.gateways.contains_key(&method) {
            return Err(PaymentError::DuplicateGateway(method));
        }
        tracing::info!(%method, "registered payment gateway");
        self.gateways.insert(method, gateway);
        Ok(())
    }

    pub fn supports(&self, method: PaymentMethod) -> bool {
        self.gateways.contains_key(&method)
    }

    pub fn resolve(&self, request: &PaymentRequest) -> Result<Arc<dyn PaymentGateway>, PaymentError> {
        let name = request.method_name();
        let method: PaymentMethod = name.parse()?;
        self.gateways
            .get(&method)
            .cloned()
            .ok_or(PaymentError::UnsupportedMethod(name))
    }

    pub async fn process(&self, request: &PaymentRequest) -> Result<PaymentOutcome, PaymentError> {
        let gateway = self.resolve(request)?;
        let outcome = gateway.process(request).await?;
        tracing::info!(
            method = %outcome.method,
            success = outcome.success,
            amount = %request.amount,
            currency = %request.currency,
            "payment processed"
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct DecliningGateway;

    #[async_trait]
    impl PaymentGateway for DecliningGateway {
        fn method(&self) -> PaymentMethod {
            PaymentMethod::Stripe
        }

        async fn process(&self, _request: &PaymentRequest) -> Result<PaymentOutcome, PaymentError> {
            Ok(PaymentOutcome {
                method: PaymentMethod::Stripe,
                success: false,
                transaction_id: None,
                failure_reason: Some("card declined".into()),
            })
        }
    }

    fn request(method: Option<&str>) -> PaymentRequest {
        PaymentRequest {
            amount: Decimal::new(4900, 2),
            currency: "USD".into(),
            payment_method: method.map(str::to_string),
            description: "test".into(),
            payment_token: None,
        }
    }

    #[tokio::test]
    async fn missing_method_routes_to_mock() {
        let dispatcher = PaymentDispatcher::with_defaults();
        let outcome = dispatcher.process(&request(None)).await.unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.method, PaymentMethod::Mock);
    }

    #[tokio::test]
    async fn method_name_is_case_insensitive() {
        let dispatcher = PaymentDispatcher::with_defaults();
        assert!(dispatcher.process(&request(Some(" mock "))).await.unwrap().success);
    }

    #[tokio::test]
    async fn unknown_and_unregistered_methods_are_unsupported() {
        let dispatcher = PaymentDispatcher::with_defaults();

        let err = dispatcher.process(&request(Some("bitcoin"))).await.unwrap_err();
        assert!(matches!(err, PaymentError::UnsupportedMethod(ref m) if m == "BITCOIN"));

        let err = dispatcher.process(&request(Some("stripe"))).await.unwrap_err();
        assert!(matches!(err, PaymentError::UnsupportedMethod(ref m) if m == "STRIPE"));
    }

    #[tokio::test]
    async fn registered_gateway_is_used() {
        let mut dispatcher = PaymentDispatcher::with_defaults();
        dispatcher.register(Arc::new(DecliningGateway)).unwrap();
        let outcome = dispatcher.process(&request(Some("Stripe"))).await.unwrap();
        assert!(!outcome.success);
        assert_eq!(outcome.failure_reason.as_deref(), Some("card declined"));
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut dispatcher = PaymentDispatcher::with_defaults();
        let err = dispatcher.register(Arc::new(MockGateway)).unwrap_err();
        assert!(matches!(err, PaymentError::DuplicateGateway(PaymentMethod::Mock)));
        assert!(dispatcher.supports(PaymentMethod::Mock));
    }
}
