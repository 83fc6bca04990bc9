//! Discount codes.
//!
//! Codes are stored upper-case and are unique per tenant. A code is checked
//! against the order subtotal at checkout; every redemption is kept as a
//! [`DiscountUsage`] so per-customer limits can be enforced.

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::{TenantScope, Timestamps};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscountType {
    Percentage,
    FixedAmount,
}

text_enum!(DiscountType, "discount type", {
    Percentage => "PERCENTAGE",
    FixedAmount => "FIXED_AMOUNT",
});

/// Why a code cannot be applied right now.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiscountRejection {
    #[error("Discount is inactive")]
    Inactive,

    #[error("Discount has expired")]
    Expired,

    #[error("Discount is not yet active")]
    NotStarted,

    #[error("Discount usage limit reached")]
    UsageLimitReached,

    #[error("Order total must be at least {0}")]
    BelowMinimum(Decimal),

    #[error("You have already used this discount the maximum number of times")]
    CustomerLimitReached,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Discount {
    pub id: Uuid,
    pub code: String,
    pub description: Option<String>,
    pub discount_type: DiscountType,
    pub value: Decimal,
    pub min_order_amount: Option<Decimal>,
    pub max_discount_amount: Option<Decimal>,
    pub usage_limit: Option<u32>,
    pub usage_limit_per_customer: Option<u32>,
    pub times_used: u32,
    pub starts_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub active: bool,
    #[serde(flatten)]
    pub scope: TenantScope,
    #[serde(flatten)]
    pub timestamps: Timestamps,
}

impl Discount {
    pub fn new(tenant_id: Uuid, code: &str, discount_type: DiscountType, value: Decimal) -> Self {
        Self {
            id: Uuid::new_v4(),
            code: normalize_code(code),
            description: None,
            discount_type,
            value,
            min_order_amount: None,
            max_discount_amount: None,
            usage_limit: None,
            usage_limit_per_customer: None,
            times_used: 0,
            starts_at: None,
            expires_at: None,
            active: true,
            scope: TenantScope::new(tenant_id),
            timestamps: Timestamps::now(),
        }
    }

    pub fn usage_exhausted(&self) -> bool {
        matches!(self.usage_limit, Some(limit) if self.times_used >= limit)
    }

    /// Checks in the order a shopper would want to hear about them.
    /// `customer_uses` is how often this shopper has already redeemed the code.
    pub fn check(
        &self,
        now: DateTime<Utc>,
        subtotal: Decimal,
        customer_uses: u32,
    ) -> Result<(), DiscountRejection> {
        if !self.active {
            return Err(DiscountRejection::Inactive);
        }
        if matches!(self.expires_at, Some(end) if now > end) {
            return Err(DiscountRejection::Expired);
        }
        if matches!(self.starts_at, Some(start) if now < start) {
            return Err(DiscountRejection::NotStarted);
        }
        if self.usage_exhausted() {
            return Err(DiscountRejection::UsageLimitReached);
        }
        if let Some(minimum) = self.min_order_amount {
            if subtotal < minimum {
                return Err(DiscountRejection::BelowMinimum(minimum));
            }
        }
        if matches!(self.usage_limit_per_customer, Some(limit) if customer_uses >= limit) {
            return Err(DiscountRejection::CustomerLimitReached);
        }
        Ok(())
    }

    /// Amount taken off `subtotal`: never negative and never more than the
    /// subtotal itself.
    pub fn amount_for(&self, subtotal: Decimal) -> Decimal {
        let raw = match self.discount_type {
            DiscountType::Percentage => {
                let share = subtotal
                    .checked_mul(self.value)
                    .map(|v| v / Decimal::ONE_HUNDRED)
                    .unwrap_or(subtotal);
                let share = share.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
                match self.max_discount_amount {
                    Some(cap) => share.min(cap),
                    None => share,
                }
            }
            DiscountType::FixedAmount => self.value,
        };
        raw.max(Decimal::ZERO).min(subtotal)
    }
}

pub fn normalize_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

/// One redemption of a code on an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountUsage {
    pub id: Uuid,
    pub discount_id: Uuid,
    pub customer_email: String,
    pub order_id: Uuid,
    pub used_at: DateTime<Utc>,
    #[serde(flatten)]
    pub scope: TenantScope,
}

impl DiscountUsage {
    pub fn new(discount: &Discount, customer_email: impl Into<String>, order_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            discount_id: discount.id,
            customer_email: customer_email.into(),
            order_id,
            used_at: Utc::now(),
            scope: discount.scope,
        }
    }
}
