//! In-process storage backend.
//!
//! Tables are plain vectors behind one `RwLock`; every multi-row operation
//! runs under a single write guard so it is all-or-nothing, mirroring the
//! transactions of the postgres backend. Unique keys are checked before each
//! write.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::manager::{DatabaseError, DatabaseResult};
use super::store::{
    BillingStore, CartStore, CustomerStore, DiscountStore, HealthCheck, OrderStore, ProductStore,
    SubscriptionStore, TenantStore, UserStore,
};
use crate::models::{
    Cart, Customer, Discount, DiscountUsage, Invoice, Order, OrderStatus, Payment, Product,
    ProductVariant, Subscription, SubscriptionPlan, SubscriptionStatus, Tenant, TenantOwned, User,
};

#[derive(Default)]
struct Tables {
    tenants: Vec<Tenant>,
    users: Vec<User>,
    customers: Vec<Customer>,
    products: Vec<Product>,
    discounts: Vec<Discount>,
    discount_usages: Vec<DiscountUsage>,
    carts: Vec<Cart>,
    orders: Vec<Order>,
    invoices: Vec<Invoice>,
    payments: Vec<Payment>,
    plans: Vec<SubscriptionPlan>,
    subscriptions: Vec<Subscription>,
}

impl Tables {
    fn check_tenant(&self, tenant: &Tenant) -> DatabaseResult<()> {
        if self.tenants.iter().any(|t| t.slug == tenant.slug) {
            return Err(DatabaseError::Duplicate(format!("tenant slug '{}'", tenant.slug)));
        }
        if self.tenants.iter().any(|t| t.name == tenant.name) {
            return Err(DatabaseError::Duplicate(format!("tenant name '{}'", tenant.name)));
        }
        Ok(())
    }

    fn check_user(&self, user: &User) -> DatabaseResult<()> {
        if self
            .users
            .iter()
            .any(|u| u.belongs_to(user.tenant_id()) && u.email == user.email)
        {
            return Err(DatabaseError::Duplicate(format!("user email '{}'", user.email)));
        }
        Ok(())
    }

    fn check_customer(&self, customer: &Customer) -> DatabaseResult<()> {
        if self.customers.iter().any(|c| {
            c.id != customer.id && c.belongs_to(customer.tenant_id()) && c.email == customer.email
        }) {
            return Err(DatabaseError::Duplicate(format!("customer email '{}'", customer.email)));
        }
        Ok(())
    }

    fn check_product(&self, product: &Product) -> DatabaseResult<()> {
        let tenant_id = product.tenant_id();
        if scoped(&self.products, tenant_id).any(|p| p.id != product.id && p.slug == product.slug) {
            return Err(DatabaseError::Duplicate(format!("product slug '{}'", product.slug)));
        }
        for variant in &product.variants {
            self.check_sku(variant)?;
            if product
                .variants
                .iter()
                .filter(|other| other.sku == variant.sku)
                .count()
                > 1
            {
                return Err(DatabaseError::Duplicate(format!("variant sku '{}'", variant.sku)));
            }
        }
        Ok(())
    }

    fn check_sku(&self, variant: &ProductVariant) -> DatabaseResult<()> {
        let taken = self
            .variants(variant.tenant_id())
            .any(|v| v.id != variant.id && v.sku == variant.sku);
        if taken {
            return Err(DatabaseError::Duplicate(format!("variant sku '{}'", variant.sku)));
        }
        Ok(())
    }

    fn check_discount(&self, discount: &Discount) -> DatabaseResult<()> {
        let taken = scoped(&self.discounts, discount.tenant_id())
            .any(|d| d.id != discount.id && d.code == discount.code);
        if taken {
            return Err(DatabaseError::Duplicate(format!("discount code '{}'", discount.code)));
        }
        Ok(())
    }

    fn variants(&self, tenant_id: Uuid) -> impl Iterator<Item = &ProductVariant> + '_ {
        scoped(&self.products, tenant_id).flat_map(|p| p.variants.iter())
    }

    fn variant_mut(&mut self, tenant_id: Uuid, id: Uuid) -> Option<&mut ProductVariant> {
        self.products
            .iter_mut()
            .filter(|p| p.belongs_to(tenant_id))
            .flat_map(|p| p.variants.iter_mut())
            .find(|v| v.id == id)
    }

    /// Stock and discount checks for a checkout; writes nothing.
    fn check_checkout(&self, order: &Order, usage: Option<&DiscountUsage>) -> DatabaseResult<()> {
        let tenant_id = order.tenant_id();
        let mut wanted: HashMap<Uuid, u32> = HashMap::new();
        for item in &order.items {
            let total = wanted.entry(item.variant_id).or_default();
            *total = total.saturating_add(item.quantity);
            let available = self
                .variants(tenant_id)
                .find(|v| v.id == item.variant_id)
                .map(|v| v.stock_level)
                .unwrap_or(0);
            if available < *total {
                return Err(DatabaseError::InsufficientStock(item.sku.clone()));
            }
        }

        if let Some(usage) = usage {
            let discount = scoped(&self.discounts, tenant_id)
                .find(|d| d.id == usage.discount_id)
                .ok_or_else(|| DatabaseError::NotFound(format!("discount {}", usage.discount_id)))?;
            if discount.usage_exhausted() {
                return Err(DatabaseError::DiscountExhausted { per_customer: false });
            }
            if let Some(limit) = discount.usage_limit_per_customer {
                let used = scoped(&self.discount_usages, tenant_id)
                    .filter(|u| u.discount_id == discount.id && u.customer_email == usage.customer_email)
                    .count();
                if used >= limit as usize {
                    return Err(DatabaseError::DiscountExhausted { per_customer: true });
                }
            }
        }
        Ok(())
    }

    fn check_plan(&self, plan: &SubscriptionPlan) -> DatabaseResult<()> {
        if self.plans.iter().any(|p| p.id != plan.id && p.slug == plan.slug) {
            return Err(DatabaseError::Duplicate(format!("plan slug '{}'", plan.slug)));
        }
        if self.plans.iter().any(|p| p.id != plan.id && p.name == plan.name) {
            return Err(DatabaseError::Duplicate(format!("plan name '{}'", plan.name)));
        }
        Ok(())
    }
}

fn scoped<'a, T: TenantOwned + 'a>(
    rows: &'a [T],
    tenant_id: Uuid,
) -> impl Iterator<Item = &'a T> + 'a {
    rows.iter().filter(move |row| row.belongs_to(tenant_id))
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TenantStore for MemoryStore {
    async fn insert(&self, tenant: &Tenant) -> DatabaseResult<()> {
        let mut tables = self.tables.write().await;
        tables.check_tenant(tenant)?;
        tables.tenants.push(tenant.clone());
        Ok(())
    }

    async fn insert_with_owner(&self, tenant: &Tenant, owner: &User) -> DatabaseResult<()> {
        let mut tables = self.tables.write().await;
        tables.check_tenant(tenant)?;
        tables.check_user(owner)?;
        tables.tenants.push(tenant.clone());
        tables.users.push(owner.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<Tenant>> {
        let tables = self.tables.read().await;
        Ok(tables.tenants.iter().find(|t| t.id == id).cloned())
    }

    async fn find_by_slug(&self, slug: &str) -> DatabaseResult<Option<Tenant>> {
        let tables = self.tables.read().await;
        Ok(tables.tenants.iter().find(|t| t.slug == slug).cloned())
    }

    async fn exists_by_slug(&self, slug: &str) -> DatabaseResult<bool> {
        let tables = self.tables.read().await;
        Ok(tables.tenants.iter().any(|t| t.slug == slug))
    }

    async fn exists_by_name(&self, name: &str) -> DatabaseResult<bool> {
        let tables = self.tables.read().await;
        Ok(tables.tenants.iter().any(|t| t.name == name))
    }

    async fn list(&self) -> DatabaseResult<Vec<Tenant>> {
        Ok(self.tables.read().await.tenants.clone())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert(&self, user: &User) -> DatabaseResult<()> {
        let mut tables = self.tables.write().await;
        if !tables.tenants.iter().any(|t| t.id == user.tenant_id()) {
            return Err(DatabaseError::NotFound(format!("tenant {}", user.tenant_id())));
        }
        tables.check_user(user)?;
        tables.users.push(user.clone());
        Ok(())
    }

    async fn find_by_id(&self, tenant_id: Uuid, id: Uuid) -> DatabaseResult<Option<User>> {
        let tables = self.tables.read().await;
        let found = scoped(&tables.users, tenant_id).find(|u| u.id == id).cloned();
        Ok(found)
    }

    async fn find_by_email(&self, tenant_id: Uuid, email: &str) -> DatabaseResult<Option<User>> {
        let tables = self.tables.read().await;
        let found = scoped(&tables.users, tenant_id).find(|u| u.email == email).cloned();
        Ok(found)
    }

    async fn exists_by_email(&self, tenant_id: Uuid, email: &str) -> DatabaseResult<bool> {
        let tables = self.tables.read().await;
        let found = scoped(&tables.users, tenant_id).any(|u| u.email == email);
        Ok(found)
    }

    async fn list_by_tenant(&self, tenant_id: Uuid) -> DatabaseResult<Vec<User>> {
        let tables = self.tables.read().await;
        let found = scoped(&tables.users, tenant_id).cloned().collect();
        Ok(found)
    }

    async fn list_by_email(&self, email: &str) -> DatabaseResult<Vec<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().filter(|u| u.email == email).cloned().collect())
    }

    async fn insert_with_customer(&self, user: &User, customer: &Customer) -> DatabaseResult<()> {
        let mut tables = self.tables.write().await;
        if !tables.tenants.iter().any(|t| t.id == user.tenant_id()) {
            return Err(DatabaseError::NotFound(format!("tenant {}", user.tenant_id())));
        }
        tables.check_user(user)?;
        tables.check_customer(customer)?;
        tables.users.push(user.clone());
        tables.customers.push(customer.clone());
        Ok(())
    }
}

#[async_trait]
impl CustomerStore for MemoryStore {
    async fn insert(&self, customer: &Customer) -> DatabaseResult<()> {
        let mut tables = self.tables.write().await;
        tables.check_customer(customer)?;
        tables.customers.push(customer.clone());
        Ok(())
    }

    async fn find_by_id(&self, tenant_id: Uuid, id: Uuid) -> DatabaseResult<Option<Customer>> {
        let tables = self.tables.read().await;
        let found = scoped(&tables.customers, tenant_id).find(|c| c.id == id).cloned();
        Ok(found)
    }

    async fn find_by_email(&self, tenant_id: Uuid, email: &str) -> DatabaseResult<Option<Customer>> {
        let tables = self.tables.read().await;
        let found = scoped(&tables.customers, tenant_id).find(|c| c.email == email).cloned();
        Ok(found)
    }

    async fn exists_by_email(&self, tenant_id: Uuid, email: &str) -> DatabaseResult<bool> {
        let tables = self.tables.read().await;
        let found = scoped(&tables.customers, tenant_id).any(|c| c.email == email);
        Ok(found)
    }

    async fn list(&self, tenant_id: Uuid) -> DatabaseResult<Vec<Customer>> {
        let tables = self.tables.read().await;
        let found = scoped(&tables.customers, tenant_id).cloned().collect();
        Ok(found)
    }

    async fn update(&self, customer: &Customer) -> DatabaseResult<()> {
        let mut tables = self.tables.write().await;
        tables.check_customer(customer)?;
        let slot = tables
            .customers
            .iter_mut()
            .find(|c| c.id == customer.id && c.belongs_to(customer.tenant_id()))
            .ok_or_else(|| DatabaseError::NotFound(format!("customer {}", customer.id)))?;
        *slot = customer.clone();
        Ok(())
    }

    async fn delete(&self, tenant_id: Uuid, id: Uuid) -> DatabaseResult<()> {
        let mut tables = self.tables.write().await;
        let before = tables.customers.len();
        tables
            .customers
            .retain(|c| !(c.id == id && c.belongs_to(tenant_id)));
        if tables.customers.len() == before {
            return Err(DatabaseError::NotFound(format!("customer {}", id)));
        }
        Ok(())
    }
}

#[async_trait]
impl ProductStore for MemoryStore {
    async fn insert(&self, product: &Product) -> DatabaseResult<()> {
        let mut tables = self.tables.write().await;
        tables.check_product(product)?;
        tables.products.push(product.clone());
        Ok(())
    }

    async fn update(&self, product: &Product) -> DatabaseResult<()> {
        let mut tables = self.tables.write().await;
        let tenant_id = product.tenant_id();
        if scoped(&tables.products, tenant_id).any(|p| p.id != product.id && p.slug == product.slug) {
            return Err(DatabaseError::Duplicate(format!("product slug '{}'", product.slug)));
        }
        let slot = tables
            .products
            .iter_mut()
            .find(|p| p.id == product.id && p.belongs_to(tenant_id))
            .ok_or_else(|| DatabaseError::NotFound(format!("product {}", product.id)))?;
        slot.name = product.name.clone();
        slot.slug = product.slug.clone();
        slot.description = product.description.clone();
        slot.active = product.active;
        slot.timestamps.updated_at = product.timestamps.updated_at;
        Ok(())
    }

    async fn find_by_id(&self, tenant_id: Uuid, id: Uuid) -> DatabaseResult<Option<Product>> {
        let tables = self.tables.read().await;
        let found = scoped(&tables.products, tenant_id).find(|p| p.id == id).cloned();
        Ok(found)
    }

    async fn find_by_slug(&self, tenant_id: Uuid, slug: &str) -> DatabaseResult<Option<Product>> {
        let tables = self.tables.read().await;
        let found = scoped(&tables.products, tenant_id).find(|p| p.slug == slug).cloned();
        Ok(found)
    }

    async fn list(&self, tenant_id: Uuid, active_only: bool) -> DatabaseResult<Vec<Product>> {
        let tables = self.tables.read().await;
        let mut found: Vec<Product> = scoped(&tables.products, tenant_id)
            .filter(|p| !active_only || p.active)
            .cloned()
            .collect();
        found.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(found)
    }

    async fn delete(&self, tenant_id: Uuid, id: Uuid) -> DatabaseResult<()> {
        let mut tables = self.tables.write().await;
        let before = tables.products.len();
        tables.products.retain(|p| !(p.id == id && p.belongs_to(tenant_id)));
        if tables.products.len() == before {
            return Err(DatabaseError::NotFound(format!("product {}", id)));
        }
        Ok(())
    }

    async fn find_variant(&self, tenant_id: Uuid, id: Uuid) -> DatabaseResult<Option<ProductVariant>> {
        let tables = self.tables.read().await;
        let found = tables.variants(tenant_id).find(|v| v.id == id).cloned();
        Ok(found)
    }

    async fn find_variant_by_sku(&self, tenant_id: Uuid, sku: &str) -> DatabaseResult<Option<ProductVariant>> {
        let tables = self.tables.read().await;
        let found = tables.variants(tenant_id).find(|v| v.sku == sku).cloned();
        Ok(found)
    }

    async fn update_variant(&self, variant: &ProductVariant) -> DatabaseResult<()> {
        let mut tables = self.tables.write().await;
        tables.check_sku(variant)?;
        let slot = tables
            .variant_mut(variant.tenant_id(), variant.id)
            .ok_or_else(|| DatabaseError::NotFound(format!("product variant {}", variant.id)))?;
        *slot = variant.clone();
        Ok(())
    }
}

#[async_trait]
impl DiscountStore for MemoryStore {
    async fn insert(&self, discount: &Discount) -> DatabaseResult<()> {
        let mut tables = self.tables.write().await;
        tables.check_discount(discount)?;
        tables.discounts.push(discount.clone());
        Ok(())
    }

    async fn update(&self, discount: &Discount) -> DatabaseResult<()> {
        let mut tables = self.tables.write().await;
        tables.check_discount(discount)?;
        let slot = tables
            .discounts
            .iter_mut()
            .find(|d| d.id == discount.id && d.belongs_to(discount.tenant_id()))
            .ok_or_else(|| DatabaseError::NotFound(format!("discount {}", discount.id)))?;
        let times_used = slot.times_used;
        *slot = discount.clone();
        slot.times_used = times_used;
        Ok(())
    }

    async fn find_by_id(&self, tenant_id: Uuid, id: Uuid) -> DatabaseResult<Option<Discount>> {
        let tables = self.tables.read().await;
        let found = scoped(&tables.discounts, tenant_id).find(|d| d.id == id).cloned();
        Ok(found)
    }

    async fn find_by_code(&self, tenant_id: Uuid, code: &str) -> DatabaseResult<Option<Discount>> {
        let tables = self.tables.read().await;
        let found = scoped(&tables.discounts, tenant_id).find(|d| d.code == code).cloned();
        Ok(found)
    }

    async fn list(&self, tenant_id: Uuid, active_only: bool) -> DatabaseResult<Vec<Discount>> {
        let tables = self.tables.read().await;
        let found = scoped(&tables.discounts, tenant_id)
            .filter(|d| !active_only || d.active)
            .cloned()
            .collect();
        Ok(found)
    }

    async fn delete(&self, tenant_id: Uuid, id: Uuid) -> DatabaseResult<()> {
        let mut tables = self.tables.write().await;
        let before = tables.discounts.len();
        tables.discounts.retain(|d| !(d.id == id && d.belongs_to(tenant_id)));
        if tables.discounts.len() == before {
            return Err(DatabaseError::NotFound(format!("discount {}", id)));
        }
        tables.discount_usages.retain(|u| u.discount_id != id);
        Ok(())
    }

    async fn count_usages(&self, tenant_id: Uuid, discount_id: Uuid, customer_email: &str) -> DatabaseResult<u32> {
        let tables = self.tables.read().await;
        let count = scoped(&tables.discount_usages, tenant_id)
            .filter(|u| u.discount_id == discount_id && u.customer_email == customer_email)
            .count();
        Ok(u32::try_from(count).unwrap_or(u32::MAX))
    }
}

#[async_trait]
impl CartStore for MemoryStore {
    async fn find(&self, tenant_id: Uuid, customer_email: &str) -> DatabaseResult<Option<Cart>> {
        let tables = self.tables.read().await;
        let found = scoped(&tables.carts, tenant_id)
            .find(|c| c.customer_email == customer_email)
            .cloned();
        Ok(found)
    }

    async fn save(&self, cart: &Cart) -> DatabaseResult<()> {
        let mut tables = self.tables.write().await;
        match tables
            .carts
            .iter_mut()
            .find(|c| c.belongs_to(cart.tenant_id()) && c.customer_email == cart.customer_email)
        {
            Some(slot) => *slot = cart.clone(),
            None => tables.carts.push(cart.clone()),
        }
        Ok(())
    }

    async fn delete(&self, tenant_id: Uuid, customer_email: &str) -> DatabaseResult<()> {
        let mut tables = self.tables.write().await;
        tables
            .carts
            .retain(|c| !(c.belongs_to(tenant_id) && c.customer_email == customer_email));
        Ok(())
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn insert_from_cart(&self, order: &Order, usage: Option<&DiscountUsage>) -> DatabaseResult<()> {
        let mut tables = self.tables.write().await;
        let tenant_id = order.tenant_id();
        if scoped(&tables.orders, tenant_id).any(|o| o.order_number == order.order_number) {
            return Err(DatabaseError::Duplicate(format!(
                "order number '{}'",
                order.order_number
            )));
        }
        tables.check_checkout(order, usage)?;

        for item in &order.items {
            if let Some(variant) = tables.variant_mut(tenant_id, item.variant_id) {
                variant.stock_level -= item.quantity;
            }
        }
        if let Some(usage) = usage {
            if let Some(discount) = tables
                .discounts
                .iter_mut()
                .find(|d| d.id == usage.discount_id && d.belongs_to(tenant_id))
            {
                discount.times_used += 1;
            }
            tables.discount_usages.push(usage.clone());
        }
        tables.orders.push(order.clone());
        tables
            .carts
            .retain(|c| !(c.belongs_to(tenant_id) && c.customer_email == order.customer_email));
        Ok(())
    }

    async fn find_by_id(&self, tenant_id: Uuid, id: Uuid) -> DatabaseResult<Option<Order>> {
        let tables = self.tables.read().await;
        let found = scoped(&tables.orders, tenant_id).find(|o| o.id == id).cloned();
        Ok(found)
    }

    async fn find_by_number(&self, tenant_id: Uuid, order_number: &str) -> DatabaseResult<Option<Order>> {
        let tables = self.tables.read().await;
        let found = scoped(&tables.orders, tenant_id)
            .find(|o| o.order_number == order_number)
            .cloned();
        Ok(found)
    }

    async fn list(&self, tenant_id: Uuid) -> DatabaseResult<Vec<Order>> {
        let tables = self.tables.read().await;
        let found = scoped(&tables.orders, tenant_id).cloned().collect();
        Ok(found)
    }

    async fn list_by_customer(&self, tenant_id: Uuid, customer_email: &str) -> DatabaseResult<Vec<Order>> {
        let tables = self.tables.read().await;
        let found = scoped(&tables.orders, tenant_id)
            .filter(|o| o.customer_email == customer_email)
            .cloned()
            .collect();
        Ok(found)
    }

    async fn update_status(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        from: OrderStatus,
        to: OrderStatus,
        updated_at: DateTime<Utc>,
    ) -> DatabaseResult<bool> {
        let mut tables = self.tables.write().await;
        let order = tables
            .orders
            .iter_mut()
            .find(|o| o.id == id && o.belongs_to(tenant_id))
            .ok_or_else(|| DatabaseError::NotFound(format!("order {}", id)))?;
        if order.status != from {
            return Ok(false);
        }
        order.status = to;
        order.timestamps.updated_at = updated_at;
        Ok(true)
    }
}

#[async_trait]
impl BillingStore for MemoryStore {
    async fn insert_invoice(&self, invoice: &Invoice) -> DatabaseResult<()> {
        self.tables.write().await.invoices.push(invoice.clone());
        Ok(())
    }

    async fn list_invoices(&self, tenant_id: Uuid) -> DatabaseResult<Vec<Invoice>> {
        let tables = self.tables.read().await;
        let found = scoped(&tables.invoices, tenant_id).cloned().collect();
        Ok(found)
    }

    async fn insert_payment(&self, payment: &Payment) -> DatabaseResult<()> {
        let mut tables = self.tables.write().await;
        let clashes = |existing: &Option<String>, new: &Option<String>| {
            matches!((existing, new), (Some(a), Some(b)) if a == b)
        };
        if tables.payments.iter().any(|p| {
            clashes(&p.transaction_id, &payment.transaction_id)
                || clashes(&p.payment_intent_id, &payment.payment_intent_id)
        }) {
            return Err(DatabaseError::Duplicate("payment transaction id".to_string()));
        }
        tables.payments.push(payment.clone());
        Ok(())
    }

    async fn list_payments(&self, tenant_id: Uuid) -> DatabaseResult<Vec<Payment>> {
        let tables = self.tables.read().await;
        let found = scoped(&tables.payments, tenant_id).cloned().collect();
        Ok(found)
    }
}

#[async_trait]
impl SubscriptionStore for MemoryStore {
    async fn insert_plan(&self, plan: &SubscriptionPlan) -> DatabaseResult<()> {
        let mut tables = self.tables.write().await;
        tables.check_plan(plan)?;
        tables.plans.push(plan.clone());
        Ok(())
    }

    async fn update_plan(&self, plan: &SubscriptionPlan) -> DatabaseResult<()> {
        let mut tables = self.tables.write().await;
        tables.check_plan(plan)?;
        let slot = tables
            .plans
            .iter_mut()
            .find(|p| p.id == plan.id)
            .ok_or_else(|| DatabaseError::NotFound(format!("plan {}", plan.id)))?;
        *slot = plan.clone();
        Ok(())
    }

    async fn find_plan(&self, id: Uuid) -> DatabaseResult<Option<SubscriptionPlan>> {
        let tables = self.tables.read().await;
        Ok(tables.plans.iter().find(|p| p.id == id).cloned())
    }

    async fn find_plan_by_slug(&self, slug: &str) -> DatabaseResult<Option<SubscriptionPlan>> {
        let tables = self.tables.read().await;
        Ok(tables.plans.iter().find(|p| p.slug == slug).cloned())
    }

    async fn list_plans(&self, active_only: bool) -> DatabaseResult<Vec<SubscriptionPlan>> {
        let tables = self.tables.read().await;
        let mut plans: Vec<SubscriptionPlan> = tables
            .plans
            .iter()
            .filter(|p| !active_only || p.active)
            .cloned()
            .collect();
        plans.sort_by(|a, b| a.price.cmp(&b.price).then_with(|| a.name.cmp(&b.name)));
        Ok(plans)
    }

    async fn find_active(&self, tenant_id: Uuid) -> DatabaseResult<Option<Subscription>> {
        let tables = self.tables.read().await;
        let found = scoped(&tables.subscriptions, tenant_id)
            .find(|s| s.status == SubscriptionStatus::Active)
            .cloned();
        Ok(found)
    }

    async fn activate(&self, subscription: &Subscription) -> DatabaseResult<()> {
        let mut tables = self.tables.write().await;
        let tenant_id = subscription.tenant_id();
        for existing in tables
            .subscriptions
            .iter_mut()
            .filter(|s| s.belongs_to(tenant_id) && s.status == SubscriptionStatus::Active)
        {
            existing.status = SubscriptionStatus::Canceled;
        }
        tables.subscriptions.push(subscription.clone());
        Ok(())
    }

    async fn update(&self, subscription: &Subscription) -> DatabaseResult<()> {
        let mut tables = self.tables.write().await;
        let slot = tables
            .subscriptions
            .iter_mut()
            .find(|s| s.id == subscription.id && s.belongs_to(subscription.tenant_id()))
            .ok_or_else(|| DatabaseError::NotFound(format!("subscription {}", subscription.id)))?;
        *slot = subscription.clone();
        Ok(())
    }
}

#[async_trait]
impl HealthCheck for MemoryStore {
    async fn ping(&self) -> DatabaseResult<()> {
        Ok(())
    }
}
