/// Error returned when a stored or submitted enum label is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

/// Generates `as_str`, `Display` and `FromStr` for enums persisted as
/// SCREAMING_SNAKE_CASE text.
macro_rules! text_enum {
    ($name:ident, $kind:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::models::UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_uppercase().as_str() {
                    $($text => Ok($name::$variant),)+
                    _ => Err($crate::models::UnknownVariant {
                        kind: $kind,
                        value: s.to_string(),
                    }),
                }
            }
        }
    };
}

pub(crate) use text_enum;

pub mod base;
pub mod billing;
pub mod customer;
pub mod discount;
pub mod order;
pub mod product;
pub mod subscription;
pub mod tenant;
pub mod user;

pub use base::{TenantOwned, TenantScope, Timestamps};
pub use billing::{Invoice, InvoiceStatus, Payment, PaymentStatus};
pub use customer::Customer;
pub use discount::{Discount, DiscountRejection, DiscountType, DiscountUsage};
pub use order::{
    AmountOverflow, Cart, CartItem, CartLimit, InvalidTransition, Order, OrderItem, OrderStatus,
    MAX_CART_LINES, MAX_LINE_QUANTITY,
};
pub use product::{Product, ProductVariant};
pub use subscription::{BillingInterval, Subscription, SubscriptionPlan, SubscriptionStatus};
pub use tenant::Tenant;
pub use user::{Role, User};

