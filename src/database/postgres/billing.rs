use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;
use uuid::Uuid;

use super::{decode, PgStore};
use crate::database::manager::{DatabaseError, DatabaseResult};
use crate::database::store::BillingStore;
use crate::models::{Invoice, Payment, TenantOwned, TenantScope};

#[derive(FromRow)]
struct InvoiceRow {
    id: Uuid,
    tenant_id: Uuid,
    amount: Decimal,
    currency: String,
    status: String,
    description: String,
    issued_at: DateTime<Utc>,
}

impl TryFrom<InvoiceRow> for Invoice {
    type Error = DatabaseError;

    fn try_from(row: InvoiceRow) -> Result<Self, Self::Error> {
        Ok(Invoice {
            id: row.id,
            amount: row.amount,
            currency: row.currency,
            status: decode(&row.status)?,
            description: row.description,
            issued_at: row.issued_at,
            scope: TenantScope::new(row.tenant_id),
        })
    }
}

#[derive(FromRow)]
struct PaymentRow {
    id: Uuid,
    tenant_id: Uuid,
    invoice_id: Uuid,
    amount: Decimal,
    currency: String,
    status: String,
    payment_method: String,
    transaction_id: Option<String>,
    payment_intent_id: Option<String>,
    failure_reason: Option<String>,
    processed_at: DateTime<Utc>,
}

impl TryFrom<PaymentRow> for Payment {
    type Error = DatabaseError;

    fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
        Ok(Payment {
            id: row.id,
            invoice_id: row.invoice_id,
            amount: row.amount,
            currency: row.currency,
            status: decode(&row.status)?,
            payment_method: row.payment_method,
            transaction_id: row.transaction_id,
            payment_intent_id: row.payment_intent_id,
            failure_reason: row.failure_reason,
            processed_at: row.processed_at,
            scope: TenantScope::new(row.tenant_id),
        })
    }
}

#[async_trait]
impl BillingStore for PgStore {
    async fn insert_invoice(&self, invoice: &Invoice) -> DatabaseResult<()> {
        sqlx::query(
            "INSERT INTO invoices (id, tenant_id, amount, currency, status, description, issued_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(invoice.id)
        .bind(invoice.tenant_id())
        .bind(invoice.amount)
        .bind(&invoice.currency)
        .bind(invoice.status.as_str())
        .bind(&invoice.description)
        .bind(invoice.issued_at)
        .execute(self.pool())
        .await
        .map_err(|err| DatabaseError::from_write(err, "invoice"))?;
        Ok(())
    }

    async fn list_invoices(&self, tenant_id: Uuid) -> DatabaseResult<Vec<Invoice>> {
        let rows = sqlx::query_as::<_, InvoiceRow>(
            "SELECT id, tenant_id, amount, currency, status, description, issued_at
             FROM invoices WHERE tenant_id = $1 ORDER BY issued_at, id",
        )
        .bind(tenant_id)
        .fetch_all(self.pool())
        .await?;
        rows.into_iter().map(Invoice::try_from).collect()
    }

    async fn insert_payment(&self, payment: &Payment) -> DatabaseResult<()> {
        sqlx::query(
            "INSERT INTO payments (id, tenant_id, invoice_id, amount, currency, status, payment_method,
                                   transaction_id, payment_intent_id, failure_reason, processed_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(payment.id)
        .bind(payment.tenant_id())
        .bind(payment.invoice_id)
        .bind(payment.amount)
        .bind(&payment.currency)
        .bind(payment.status.as_str())
        .bind(&payment.payment_method)
        .bind(&payment.transaction_id)
        .bind(&payment.payment_intent_id)
        .bind(&payment.failure_reason)
        .bind(payment.processed_at)
        .execute(self.pool())
        .await
        .map_err(|err| DatabaseError::from_write(err, "payment"))?;
        Ok(())
    }

    async fn list_payments(&self, tenant_id: Uuid) -> DatabaseResult<Vec<Payment>> {
        let rows = sqlx::query_as::<_, PaymentRow>(
            "SELECT id, tenant_id, invoice_id, amount, currency, status, payment_method,
                    transaction_id, payment_intent_id, failure_reason, processed_at
             FROM payments WHERE tenant_id = $1 ORDER BY processed_at, id",
        )
        .bind(tenant_id)
        .fetch_all(self.pool())
        .await?;
        rows.into_iter().map(Payment::try_from).collect()
    }
}
