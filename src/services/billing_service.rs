use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::error::ServiceResult;
use crate::database::BillingStore;
use crate::models::{Invoice, InvoiceStatus, Payment, PaymentStatus, TenantScope};
use crate::payment::PaymentOutcome;

/// Invoice and payment ledger.
#[derive(Clone)]
pub struct BillingService {
    billing: Arc<dyn BillingStore>,
}

impl BillingService {
    pub fn new(billing: Arc<dyn BillingStore>) -> Self {
        Self { billing }
    }

    pub async fn record_invoice(
        &self,
        tenant_id: Uuid,
        amount: Decimal,
        currency: &str,
        status: InvoiceStatus,
        description: &str,
    ) -> ServiceResult<Invoice> {
        let invoice = Invoice::new(tenant_id, amount, currency, status, description);
        self.billing.insert_invoice(&invoice).await?;
        Ok(invoice)
    }

    /// Store the gateway outcome against `invoice`.
    pub async fn record_payment(&self, invoice: &Invoice, outcome: &PaymentOutcome) -> ServiceResult<Payment> {
        let payment = Payment {
            id: Uuid::new_v4(),
            invoice_id: invoice.id,
            amount: invoice.amount,
            currency: invoice.currency.clone(),
            status: if outcome.success {
                PaymentStatus::Succeeded
            } else {
                PaymentStatus::Failed
            },
            payment_method: outcome.method.to_string(),
            transaction_id: outcome.transaction_id.clone(),
            payment_intent_id: None,
            failure_reason: outcome.failure_reason.clone(),
            processed_at: Utc::now(),
            scope: TenantScope::new(invoice.scope.tenant_id),
        };
        self.billing.insert_payment(&payment).await?;
        tracing::info!(
            payment_id = %payment.id,
            invoice_id = %invoice.id,
            status = %payment.status,
            "payment recorded"
        );
        Ok(payment)
    }

    /// Invoice plus payment for one gateway outcome: PAID/SUCCEEDED on
    /// success, FAILED/FAILED otherwise.
    pub async fn settle(
        &self,
        tenant_id: Uuid,
        amount: Decimal,
        currency: &str,
        description: &str,
        outcome: &PaymentOutcome,
    ) -> ServiceResult<(Invoice, Payment)> {
        let status = if outcome.success {
            InvoiceStatus::Paid
        } else {
            InvoiceStatus::Failed
        };
        let invoice = self
            .record_invoice(tenant_id, amount, currency, status, description)
            .await?;
        let payment = self.record_payment(&invoice, outcome).await?;
        Ok((invoice, payment))
    }

    pub async fn list_invoices(&self, tenant_id: Uuid) -> ServiceResult<Vec<Invoice>> {
        Ok(self.billing.list_invoices(tenant_id).await?)
    }

    pub async fn list_payments(&self, tenant_id: Uuid) -> ServiceResult<Vec<Payment>> {
        Ok(self.billing.list_payments(tenant_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Stores;
    use crate::payment::PaymentMethod;

    #[tokio::test]
    async fn failed_outcome_is_recorded_as_failed() {
        let service = BillingService::new(Stores::memory().billing);
        let tenant = Uuid::new_v4();
        let outcome = PaymentOutcome {
            method: PaymentMethod::Mock,
            success: false,
            transaction_id: None,
            failure_reason: Some("declined".into()),
        };

        let (invoice, payment) = service
            .settle(tenant, Decimal::new(1000, 2), "USD", "Order ORD-1", &outcome)
            .await
            .unwrap();
        assert_eq!(invoice.status, InvoiceStatus::Failed);
        assert_eq!(payment.status, PaymentStatus::Failed);
        assert_eq!(payment.failure_reason.as_deref(), Some("declined"));
        assert_eq!(payment.payment_method, "MOCK");

        assert_eq!(service.list_invoices(tenant).await.unwrap().len(), 1);
        assert_eq!(service.list_payments(tenant).await.unwrap().len(), 1);
        assert!(service.list_payments(Uuid::new_v4()).await.unwrap().is_empty());
    }
}
