use std::collections::HashMap;

use thiserror::Error;

use crate::database::DatabaseError;
use crate::models::{DiscountRejection, InvalidTransition};
use crate::payment::PaymentError;

/// Failure of a business operation. Mapped to HTTP by `ApiError`.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{message}")]
    Validation {
        message: String,
        field_errors: HashMap<String, String>,
    },

    #[error("{0}")]
    Duplicate(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),

    #[error("Unsupported payment method: {0}")]
    UnsupportedPaymentMethod(String),

    #[error("Payment failed: {0}")]
    PaymentFailed(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Store(DatabaseError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl ServiceError {
    /// Validation failure without per-field detail.
    pub fn validation(message: impl Into<String>) -> Self {
        ServiceError::Validation {
            message: message.into(),
            field_errors: HashMap::new(),
        }
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        ServiceError::NotFound(what.into())
    }

    pub fn duplicate(what: impl Into<String>) -> Self {
        ServiceError::Duplicate(what.into())
    }
}

impl From<DatabaseError> for ServiceError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::Duplicate(what) => ServiceError::Duplicate(format!("{} already exists", what)),
            DatabaseError::NotFound(what) => ServiceError::NotFound(format!("{} not found", what)),
            DatabaseError::InsufficientStock(sku) => {
                ServiceError::Conflict(format!("Insufficient stock for: {}", sku))
            }
            DatabaseError::DiscountExhausted { per_customer } => {
                let rejection = if per_customer {
                    DiscountRejection::CustomerLimitReached
                } else {
                    DiscountRejection::UsageLimitReached
                };
                ServiceError::validation(rejection.to_string())
            }
            other => ServiceError::Store(other),
        }
    }
}

impl From<PaymentError> for ServiceError {
    fn from(err: PaymentError) -> Self {
        match err {
            PaymentError::UnsupportedMethod(name) => ServiceError::UnsupportedPaymentMethod(name),
            PaymentError::Gateway(reason) => ServiceError::PaymentFailed(reason),
            other @ PaymentError::DuplicateGateway(_) => ServiceError::Internal(other.to_string()),
        }
    }
}
