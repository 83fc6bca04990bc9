pub mod billing_service;
pub mod customer_service;
pub mod discount_service;
pub mod error;
pub mod order_service;
pub mod product_service;
pub mod subscription_service;
pub mod tenant_service;
pub mod user_service;
pub mod validation;

use std::sync::Arc;

use crate::database::Stores;
use crate::payment::PaymentDispatcher;

pub use billing_service::BillingService;
pub use customer_service::{CustomerInput, CustomerService};
pub use discount_service::{DiscountInput, DiscountQuote, DiscountService, ValidateDiscount};
pub use error::{ServiceError, ServiceResult};
pub use order_service::{AddToCart, Checkout, OrderPayment, OrderService, PayOrder};
pub use product_service::{ProductChanges, ProductInput, ProductService, VariantChanges, VariantInput};
pub use subscription_service::{PlanInput, SubscribeRequest, SubscriptionService};
pub use tenant_service::{NewTenant, RegisterMerchant, TenantService, PLATFORM_TENANT_SLUG};
pub use user_service::{CustomerSignup, LoginRequest, NewUser, UserService};

/// Every service, wired to one set of stores and one payment dispatcher.
#[derive(Clone)]
pub struct Services {
    pub tenants: TenantService,
    pub users: UserService,
    pub customers: CustomerService,
    pub products: ProductService,
    pub discounts: DiscountService,
    pub orders: OrderService,
    pub billing: BillingService,
    pub subscriptions: SubscriptionService,
}

impl Services {
    pub fn new(stores: &Stores, payments: Arc<PaymentDispatcher>, currency: &str) -> Self {
        let billing = BillingService::new(stores.billing.clone());
        let discounts = DiscountService::new(stores.discounts.clone());
        Self {
            tenants: TenantService::new(stores.tenants.clone()),
            users: UserService::new(
                stores.tenants.clone(),
                stores.users.clone(),
                stores.customers.clone(),
            ),
            customers: CustomerService::new(stores.customers.clone()),
            products: ProductService::new(stores.products.clone()),
            orders: OrderService::new(
                stores.carts.clone(),
                stores.orders.clone(),
                stores.products.clone(),
                discounts.clone(),
                billing.clone(),
                payments.clone(),
                currency,
            ),
            subscriptions: SubscriptionService::new(
                stores.subscriptions.clone(),
                billing.clone(),
                payments,
            ),
            billing,
            discounts,
        }
    }
}
