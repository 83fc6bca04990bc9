use async_trait::async_trait;
use uuid::Uuid;

use super::{PaymentError, PaymentGateway, PaymentMethod, PaymentOutcome, PaymentRequest};

/// Placeholder gateway: accepts every request and moves no money.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockGateway;

#[async_trait]
impl PaymentGateway for MockGateway {
    fn method(&self) -> PaymentMethod {
        PaymentMethod::Mock
    }

    async fn process(&self, request: &PaymentRequest) -> Result<PaymentOutcome, PaymentError> {
        tracing::info!(
            "Processing MOCK payment for amount: {} {}",
            request.amount,
            request.currency
        );

        Ok(PaymentOutcome {
            method: PaymentMethod::Mock,
            success: true,
            transaction_id: Some(format!("mock_{}", Uuid::new_v4().simple())),
            failure_reason: None,
        })
    }
}
