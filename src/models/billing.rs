use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::TenantScope;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvoiceStatus {
    Pending,
    Paid,
    Failed,
}

text_enum!(InvoiceStatus, "invoice status", {
    Pending => "PENDING",
    Paid => "PAID",
    Failed => "FAILED",
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: Uuid,
    pub amount: Decimal,
    pub currency: String,
    pub status: InvoiceStatus,
    pub description: String,
    pub issued_at: DateTime<Utc>,
    #[serde(flatten)]
    pub scope: TenantScope,
}

impl Invoice {
    pub fn new(
        tenant_id: Uuid,
        amount: Decimal,
        currency: impl Into<String>,
        status: InvoiceStatus,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            amount,
            currency: currency.into(),
            status,
            description: description.into(),
            issued_at: Utc::now(),
            scope: TenantScope::new(tenant_id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Processing,
    Succeeded,
    Failed,
    Cancelled,
    Refunded,
    PartiallyRefunded,
}

text_enum!(PaymentStatus, "payment status", {
    Pending => "PENDING",
    Processing => "PROCESSING",
    Succeeded => "SUCCEEDED",
    Failed => "FAILED",
    Cancelled => "CANCELLED",
    Refunded => "REFUNDED",
    PartiallyRefunded => "PARTIALLY_REFUNDED",
});

/// Gateway transaction recorded against an invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: Uuid,
    pub invoice_id: Uuid,
    pub amount: Decimal,
    pub currency: String,
    pub status: PaymentStatus,
    pub payment_method: String,
    pub transaction_id: Option<String>,
    pub payment_intent_id: Option<String>,
    pub failure_reason: Option<String>,
    pub processed_at: DateTime<Utc>,
    #[serde(flatten)]
    pub scope: TenantScope,
}
