//! Storage interfaces.
//!
//! Every finder for a tenant-owned entity takes the owning tenant id; no
//! finder returns such a row without a matching tenant. Unique
//! keys (tenant slug and name, user and customer email per tenant, product
//! slug and SKU per tenant, discount code per tenant, order number per
//! tenant, one cart per shopper, one active subscription per tenant) are
//! enforced by the implementations and surface as
//! [`DatabaseError::Duplicate`].

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::manager::DatabaseResult;
use super::memory::MemoryStore;
use super::postgres::PgStore;
use crate::models::{
    Cart, Customer, Discount, DiscountUsage, Invoice, Order, OrderStatus, Payment, Product,
    ProductVariant, Subscription, SubscriptionPlan, Tenant, User,
};

#[async_trait]
pub trait TenantStore: Send + Sync {
    async fn insert(&self, tenant: &Tenant) -> DatabaseResult<()>;
    /// Insert a tenant together with its first user; neither is kept if either
    /// insert fails.
    async fn insert_with_owner(&self, tenant: &Tenant, owner: &User) -> DatabaseResult<()>;
    async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<Tenant>>;
    async fn find_by_slug(&self, slug: &str) -> DatabaseResult<Option<Tenant>>;
    async fn exists_by_slug(&self, slug: &str) -> DatabaseResult<bool>;
    async fn exists_by_name(&self, name: &str) -> DatabaseResult<bool>;
    async fn list(&self) -> DatabaseResult<Vec<Tenant>>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn insert(&self, user: &User) -> DatabaseResult<()>;
    async fn find_by_id(&self, tenant_id: Uuid, id: Uuid) -> DatabaseResult<Option<User>>;
    async fn find_by_email(&self, tenant_id: Uuid, email: &str) -> DatabaseResult<Option<User>>;
    async fn exists_by_email(&self, tenant_id: Uuid, email: &str) -> DatabaseResult<bool>;
    async fn list_by_tenant(&self, tenant_id: Uuid) -> DatabaseResult<Vec<User>>;
    /// Login lookup across stores; callers must disambiguate multiple hits.
    async fn list_by_email(&self, email: &str) -> DatabaseResult<Vec<User>>;
    /// Shopper sign-up: the login and its CRM record are stored together or
    /// not at all.
    async fn insert_with_customer(&self, user: &User, customer: &Customer) -> DatabaseResult<()>;
}

#[async_trait]
pub trait CustomerStore: Send + Sync {
    async fn insert(&self, customer: &Customer) -> DatabaseResult<()>;
    async fn find_by_id(&self, tenant_id: Uuid, id: Uuid) -> DatabaseResult<Option<Customer>>;
    async fn find_by_email(&self, tenant_id: Uuid, email: &str) -> DatabaseResult<Option<Customer>>;
    async fn exists_by_email(&self, tenant_id: Uuid, email: &str) -> DatabaseResult<bool>;
    async fn list(&self, tenant_id: Uuid) -> DatabaseResult<Vec<Customer>>;
    /// Overwrite a customer matched by (tenant, id). `NotFound` if absent.
    async fn update(&self, customer: &Customer) -> DatabaseResult<()>;
    async fn delete(&self, tenant_id: Uuid, id: Uuid) -> DatabaseResult<()>;
}

#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Insert a product with all of its variants in one step.
    async fn insert(&self, product: &Product) -> DatabaseResult<()>;
    /// Overwrite the product fields; variants are left alone.
    async fn update(&self, product: &Product) -> DatabaseResult<()>;
    async fn find_by_id(&self, tenant_id: Uuid, id: Uuid) -> DatabaseResult<Option<Product>>;
    async fn find_by_slug(&self, tenant_id: Uuid, slug: &str) -> DatabaseResult<Option<Product>>;
    async fn list(&self, tenant_id: Uuid, active_only: bool) -> DatabaseResult<Vec<Product>>;
    /// Remove a product and its variants.
    async fn delete(&self, tenant_id: Uuid, id: Uuid) -> DatabaseResult<()>;
    async fn find_variant(&self, tenant_id: Uuid, id: Uuid) -> DatabaseResult<Option<ProductVariant>>;
    async fn find_variant_by_sku(&self, tenant_id: Uuid, sku: &str) -> DatabaseResult<Option<ProductVariant>>;
    async fn update_variant(&self, variant: &ProductVariant) -> DatabaseResult<()>;
}

#[async_trait]
pub trait DiscountStore: Send + Sync {
    async fn insert(&self, discount: &Discount) -> DatabaseResult<()>;
    /// Overwrite the editable fields. `times_used` is owned by checkout and is
    /// never written here.
    async fn update(&self, discount: &Discount) -> DatabaseResult<()>;
    async fn find_by_id(&self, tenant_id: Uuid, id: Uuid) -> DatabaseResult<Option<Discount>>;
    async fn find_by_code(&self, tenant_id: Uuid, code: &str) -> DatabaseResult<Option<Discount>>;
    async fn list(&self, tenant_id: Uuid, active_only: bool) -> DatabaseResult<Vec<Discount>>;
    async fn delete(&self, tenant_id: Uuid, id: Uuid) -> DatabaseResult<()>;
    /// How often `customer_email` has redeemed the discount.
    async fn count_usages(&self, tenant_id: Uuid, discount_id: Uuid, customer_email: &str) -> DatabaseResult<u32>;
}

#[async_trait]
pub trait CartStore: Send + Sync {
    async fn find(&self, tenant_id: Uuid, customer_email: &str) -> DatabaseResult<Option<Cart>>;
    /// Insert or replace the cart for (tenant, customer email).
    async fn save(&self, cart: &Cart) -> DatabaseResult<()>;
    async fn delete(&self, tenant_id: Uuid, customer_email: &str) -> DatabaseResult<()>;
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Checkout in one step: take every line's quantity off its variant's
    /// stock, redeem the discount (if any), persist the order and drop the
    /// shopper's cart. Nothing is written when a variant is short
    /// (`InsufficientStock`) or the discount has run out
    /// (`DiscountExhausted`).
    async fn insert_from_cart(&self, order: &Order, usage: Option<&DiscountUsage>) -> DatabaseResult<()>;
    async fn find_by_id(&self, tenant_id: Uuid, id: Uuid) -> DatabaseResult<Option<Order>>;
    async fn find_by_number(&self, tenant_id: Uuid, order_number: &str) -> DatabaseResult<Option<Order>>;
    async fn list(&self, tenant_id: Uuid) -> DatabaseResult<Vec<Order>>;
    async fn list_by_customer(&self, tenant_id: Uuid, customer_email: &str) -> DatabaseResult<Vec<Order>>;
    /// Compare-and-set on the status column: writes `to` only while the
    /// stored status is still `from`. Returns `false`, writing nothing, when
    /// another writer got there first; `NotFound` when there is no such order.
    async fn update_status(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        from: OrderStatus,
        to: OrderStatus,
        updated_at: DateTime<Utc>,
    ) -> DatabaseResult<bool>;
}

#[async_trait]
pub trait BillingStore: Send + Sync {
    async fn insert_invoice(&self, invoice: &Invoice) -> DatabaseResult<()>;
    async fn list_invoices(&self, tenant_id: Uuid) -> DatabaseResult<Vec<Invoice>>;
    async fn insert_payment(&self, payment: &Payment) -> DatabaseResult<()>;
    async fn list_payments(&self, tenant_id: Uuid) -> DatabaseResult<Vec<Payment>>;
}

#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    async fn insert_plan(&self, plan: &SubscriptionPlan) -> DatabaseResult<()>;
    async fn update_plan(&self, plan: &SubscriptionPlan) -> DatabaseResult<()>;
    async fn find_plan(&self, id: Uuid) -> DatabaseResult<Option<SubscriptionPlan>>;
    async fn find_plan_by_slug(&self, slug: &str) -> DatabaseResult<Option<SubscriptionPlan>>;
    async fn list_plans(&self, active_only: bool) -> DatabaseResult<Vec<SubscriptionPlan>>;
    async fn find_active(&self, tenant_id: Uuid) -> DatabaseResult<Option<Subscription>>;
    /// Cancel the tenant's current ACTIVE subscription (if any) and store the
    /// new one in its place.
    async fn activate(&self, subscription: &Subscription) -> DatabaseResult<()>;
    async fn update(&self, subscription: &Subscription) -> DatabaseResult<()>;
}

#[async_trait]
pub trait HealthCheck: Send + Sync {
    async fn ping(&self) -> DatabaseResult<()>;
}

/// The full set of stores handed to the services at construction.
#[derive(Clone)]
pub struct Stores {
    pub tenants: Arc<dyn TenantStore>,
    pub users: Arc<dyn UserStore>,
    pub customers: Arc<dyn CustomerStore>,
    pub products: Arc<dyn ProductStore>,
    pub discounts: Arc<dyn DiscountStore>,
    pub carts: Arc<dyn CartStore>,
    pub orders: Arc<dyn OrderStore>,
    pub billing: Arc<dyn BillingStore>,
    pub subscriptions: Arc<dyn SubscriptionStore>,
    pub health: Arc<dyn HealthCheck>,
}

impl Stores {
    pub fn memory() -> Self {
        Self::from_backend(Arc::new(MemoryStore::new()))
    }

    pub fn postgres(pool: PgPool) -> Self {
        Self::from_backend(Arc::new(PgStore::new(pool)))
    }

    fn from_backend<B>(backend: Arc<B>) -> Self
    where
        B: TenantStore
            + UserStore
            + CustomerStore
            + ProductStore
            + DiscountStore
            + CartStore
            + OrderStore
            + BillingStore
            + SubscriptionStore
            + HealthCheck
            + 'static,
    {
        Self {
            tenants: backend.clone(),
            users: backend.clone(),
            customers: backend.clone(),
            products: backend.clone(),
            discounts: backend.clone(),
            carts: backend.clone(),
            orders: backend.clone(),
            billing: backend.clone(),
            subscriptions: backend.clone(),
            health: backend,
        }
    }
}
