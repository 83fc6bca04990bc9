//! Discount codes: merchant management and shopper checks.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::{ServiceError, ServiceResult};
use super::validation::{is_valid_amount, normalize_email, FieldErrors};
use crate::database::DiscountStore;
use crate::models::discount::normalize_code;
use crate::models::{Discount, DiscountType};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountInput {
    pub code: String,
    pub description: Option<String>,
    pub discount_type: DiscountType,
    pub value: Decimal,
    pub min_order_amount: Option<Decimal>,
    pub max_discount_amount: Option<Decimal>,
    pub usage_limit: Option<u32>,
    pub usage_limit_per_customer: Option<u32>,
    pub starts_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub active: Option<bool>,
}

impl DiscountInput {
    fn validate(&self) -> ServiceResult<()> {
        let mut errors = FieldErrors::new();
        errors
            .require(&self.code, "code")
            .check(
                self.value > Decimal::ZERO && is_valid_amount(self.value),
                "value",
                "Value must be positive with at most 2 decimal places",
            )
            .check(
                self.discount_type != DiscountType::Percentage || self.value <= Decimal::ONE_HUNDRED,
                "value",
                "A percentage cannot exceed 100",
            )
            .check(
                self.min_order_amount.map_or(true, is_valid_amount),
                "minOrderAmount",
                "Minimum order amount must be a valid amount",
            )
            .check(
                self.max_discount_amount.map_or(true, is_valid_amount),
                "maxDiscountAmount",
                "Maximum discount amount must be a valid amount",
            )
            .check(self.usage_limit != Some(0), "usageLimit", "Usage limit must be at least 1")
            .check(
                self.usage_limit_per_customer != Some(0),
                "usageLimitPerCustomer",
                "Per-customer limit must be at least 1",
            )
            .check(
                !matches!((self.starts_at, self.expires_at), (Some(s), Some(e)) if e <= s),
                "expiresAt",
                "Expiry must be after the start date",
            );
        errors.finish()
    }

    fn apply_to(self, discount: &mut Discount) {
        discount.code = normalize_code(&self.code);
        discount.description = self
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());
        discount.discount_type = self.discount_type;
        discount.value = self.value;
        discount.min_order_amount = self.min_order_amount;
        discount.max_discount_amount = self.max_discount_amount;
        discount.usage_limit = self.usage_limit;
        discount.usage_limit_per_customer = self.usage_limit_per_customer;
        discount.starts_at = self.starts_at;
        discount.expires_at = self.expires_at;
        if let Some(active) = self.active {
            discount.active = active;
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateDiscount {
    pub code: String,
    pub order_total: Decimal,
}

/// What a code would do to a given total. Not applicable codes carry the
/// reason in `message` and leave the total unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountQuote {
    pub applicable: bool,
    pub code: String,
    pub message: String,
    pub original_total: Decimal,
    pub discount_amount: Decimal,
    pub final_total: Decimal,
}

impl DiscountQuote {
    fn rejected(code: String, message: String, total: Decimal) -> Self {
        Self {
            applicable: false,
            code,
            message,
            original_total: total,
            discount_amount: Decimal::ZERO,
            final_total: total,
        }
    }
}

#[derive(Clone)]
pub struct DiscountService {
    discounts: Arc<dyn DiscountStore>,
}

impl DiscountService {
    pub fn new(discounts: Arc<dyn DiscountStore>) -> Self {
        Self { discounts }
    }

    pub async fn create_discount(&self, tenant_id: Uuid, input: DiscountInput) -> ServiceResult<Discount> {
        input.validate()?;
        let code = normalize_code(&input.code);
        if self.discounts.find_by_code(tenant_id, &code).await?.is_some() {
            return Err(ServiceError::duplicate(format!("Discount code '{}' already exists", code)));
        }

        let mut discount = Discount::new(tenant_id, &code, input.discount_type, input.value);
        input.apply_to(&mut discount);
        self.discounts.insert(&discount).await?;
        tracing::info!(discount_id = %discount.id, %tenant_id, code = %discount.code, "discount created");
        Ok(discount)
    }

    /// Replace the editable fields. The redemption count is kept.
    pub async fn update_discount(&self, tenant_id: Uuid, id: Uuid, input: DiscountInput) -> ServiceResult<Discount> {
        input.validate()?;
        let mut discount = self.get_discount(tenant_id, id).await?;
        let code = normalize_code(&input.code);
        if code != discount.code && self.discounts.find_by_code(tenant_id, &code).await?.is_some() {
            return Err(ServiceError::duplicate(format!("Discount code '{}' already exists", code)));
        }

        input.apply_to(&mut discount);
        discount.timestamps.touch();
        self.discounts.update(&discount).await?;
        Ok(discount)
    }

    pub async fn set_active(&self, tenant_id: Uuid, id: Uuid, active: bool) -> ServiceResult<Discount> {
        let mut discount = self.get_discount(tenant_id, id).await?;
        discount.active = active;
        discount.timestamps.touch();
        self.discounts.update(&discount).await?;
        tracing::info!(discount_id = %id, active, "discount toggled");
        Ok(discount)
    }

    pub async fn get_discount(&self, tenant_id: Uuid, id: Uuid) -> ServiceResult<Discount> {
        self.discounts
            .find_by_id(tenant_id, id)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("Discount not found with id: {}", id)))
    }

    pub async fn list_discounts(&self, tenant_id: Uuid, active_only: bool) -> ServiceResult<Vec<Discount>> {
        Ok(self.discounts.list(tenant_id, active_only).await?)
    }

    pub async fn delete_discount(&self, tenant_id: Uuid, id: Uuid) -> ServiceResult<()> {
        self.discounts.delete(tenant_id, id).await.map_err(|err| match ServiceError::from(err) {
            ServiceError::NotFound(_) => ServiceError::not_found(format!("Discount not found with id: {}", id)),
            other => other,
        })
    }

    /// Quote a code for a shopper without redeeming it.
    pub async fn validate_code(
        &self,
        tenant_id: Uuid,
        email: &str,
        request: ValidateDiscount,
    ) -> ServiceResult<DiscountQuote> {
        let code = normalize_code(&request.code);
        let total = request.order_total;
        if !is_valid_amount(total) {
            return Err(ServiceError::validation("Order total must be a valid amount"));
        }

        let Some(discount) = self.discounts.find_by_code(tenant_id, &code).await? else {
            return Ok(DiscountQuote::rejected(code, "Invalid discount code".to_string(), total));
        };
        let uses = self
            .discounts
            .count_usages(tenant_id, discount.id, &normalize_email(email))
            .await?;
        if let Err(rejection) = discount.check(Utc::now(), total, uses) {
            return Ok(DiscountQuote::rejected(code, rejection.to_string(), total));
        }

        let amount = discount.amount_for(total);
        Ok(DiscountQuote {
            applicable: true,
            code,
            message: "Discount applied".to_string(),
            original_total: total,
            discount_amount: amount,
            final_total: total - amount,
        })
    }

    /// The discount and the amount it takes off `subtotal` at checkout.
    /// Limits are checked again when the order is written.
    pub async fn redeemable(
        &self,
        tenant_id: Uuid,
        code: &str,
        subtotal: Decimal,
        email: &str,
    ) -> ServiceResult<(Discount, Decimal)> {
        let code = normalize_code(code);
        let discount = self
            .discounts
            .find_by_code(tenant_id, &code)
            .await?
            .ok_or_else(|| ServiceError::validation("Invalid discount code"))?;
        let uses = self.discounts.count_usages(tenant_id, discount.id, email).await?;
        discount
            .check(Utc::now(), subtotal, uses)
            .map_err(|rejection| ServiceError::validation(rejection.to_string()))?;

        let amount = discount.amount_for(subtotal);
        Ok((discount, amount))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Stores;

    fn ten_percent() -> DiscountInput {
        DiscountInput {
            code: "welcome10".into(),
            description: None,
            discount_type: DiscountType::Percentage,
            value: Decimal::from(10),
            min_order_amount: Some(Decimal::from(20)),
            max_discount_amount: None,
            usage_limit: None,
            usage_limit_per_customer: None,
            starts_at: None,
            expires_at: None,
            active: None,
        }
    }

    fn quote_for(code: &str, cents: i64) -> ValidateDiscount {
        ValidateDiscount {
            code: code.into(),
            order_total: Decimal::new(cents, 2),
        }
    }

    #[tokio::test]
    async fn codes_are_unique_and_upper_cased() {
        let service = DiscountService::new(Stores::memory().discounts);
        let tenant = Uuid::new_v4();
        let discount = service.create_discount(tenant, ten_percent()).await.unwrap();
        assert_eq!(discount.code, "WELCOME10");

        let again = DiscountInput { code: " WELCOME10 ".into(), ..ten_percent() };
        assert!(matches!(
            service.create_discount(tenant, again).await,
            Err(ServiceError::Duplicate(_))
        ));
    }

    #[tokio::test]
    async fn bad_inputs_are_listed_per_field() {
        let service = DiscountService::new(Stores::memory().discounts);
        let now = Utc::now();
        let input = DiscountInput {
            code: " ".into(),
            value: Decimal::from(150),
            usage_limit: Some(0),
            starts_at: Some(now),
            expires_at: Some(now),
            ..ten_percent()
        };
        match service.create_discount(Uuid::new_v4(), input).await {
            Err(ServiceError::Validation { field_errors, .. }) => {
                for field in ["code", "value", "usageLimit", "expiresAt"] {
                    assert!(field_errors.contains_key(field), "{}", field);
                }
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn quotes_explain_themselves() {
        let service = DiscountService::new(Stores::memory().discounts);
        let tenant = Uuid::new_v4();
        let discount = service.create_discount(tenant, ten_percent()).await.unwrap();

        let quote = service
            .validate_code(tenant, "a@example.com", quote_for("welcome10", 5000))
            .await
            .unwrap();
        assert!(quote.applicable);
        assert_eq!(quote.discount_amount, Decimal::new(500, 2));
        assert_eq!(quote.final_total, Decimal::new(4500, 2));

        let small = service
            .validate_code(tenant, "a@example.com", quote_for("WELCOME10", 1000))
            .await
            .unwrap();
        assert!(!small.applicable);
        assert_eq!(small.message, "Order total must be at least 20");
        assert_eq!(small.final_total, Decimal::new(1000, 2));

        let unknown = service
            .validate_code(tenant, "a@example.com", quote_for("NOPE", 5000))
            .await
            .unwrap();
        assert_eq!(unknown.message, "Invalid discount code");

        service.set_active(tenant, discount.id, false).await.unwrap();
        let inactive = service
            .validate_code(tenant, "a@example.com", quote_for("WELCOME10", 5000))
            .await
            .unwrap();
        assert_eq!(inactive.message, "Discount is inactive");
    }

    #[tokio::test]
    async fn codes_do_not_cross_stores() {
        let service = DiscountService::new(Stores::memory().discounts);
        service.create_discount(Uuid::new_v4(), ten_percent()).await.unwrap();

        assert!(matches!(
            service
                .redeemable(Uuid::new_v4(), "WELCOME10", Decimal::from(50), "a@example.com")
                .await,
            Err(ServiceError::Validation { ref message, .. }) if message == "Invalid discount code"
        ));
    }
}
