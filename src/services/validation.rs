//! Input checks shared by the services.
//!
//! Field problems are collected into [`FieldErrors`] so a request with several
//! bad fields is rejected once with every message attached.

use std::collections::HashMap;

use rust_decimal::Decimal;

use super::error::ServiceError;

pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Largest price or amount accepted from a client: 1,000,000,000.00.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(1_215_752_192, 23, 0, false, 2);

#[derive(Debug, Default)]
pub struct FieldErrors {
    errors: HashMap<String, String>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `message` for `field` when `ok` is false. The first message for a
    /// field is kept.
    pub fn check(&mut self, ok: bool, field: &str, message: &str) -> &mut Self {
        if !ok {
            self.errors
                .entry(field.to_string())
                .or_insert_with(|| message.to_string());
        }
        self
    }

    pub fn require(&mut self, value: &str, field: &str) -> &mut Self {
        self.check(!value.trim().is_empty(), field, "must not be blank")
    }

    pub fn email(&mut self, value: &str, field: &str) -> &mut Self {
        self.check(is_valid_email(value), field, "must be a well-formed email address")
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// `Ok` when nothing was recorded, otherwise a validation error carrying
    /// every field message.
    pub fn finish(&mut self) -> Result<(), ServiceError> {
        if self.errors.is_empty() {
            return Ok(());
        }
        let field_errors = std::mem::take(&mut self.errors);
        tracing::debug!(?field_errors, "validation failed");
        Err(ServiceError::Validation {
            message: "Validation failed".to_string(),
            field_errors,
        })
    }
}

/// `local@domain.tld` with no whitespace and non-empty labels.
pub fn is_valid_email(value: &str) -> bool {
    let value = value.trim();
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2 && labels.iter().all(|label| !label.is_empty())
}

/// Lower-case letters, digits and hyphens only.
pub fn is_valid_slug(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

pub fn normalize_email(value: &str) -> String {
    value.trim().to_ascii_lowercase()
}

pub fn is_non_negative(amount: Decimal) -> bool {
    !amount.is_sign_negative()
}

/// A money amount a client may submit: not negative, at most two decimal
/// places and no larger than [`MAX_AMOUNT`].
pub fn is_valid_amount(amount: Decimal) -> bool {
    is_non_negative(amount) && amount.normalize().scale() <= 2 && amount <= MAX_AMOUNT
}
