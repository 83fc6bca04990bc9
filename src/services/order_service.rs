//! Carts, checkout and the order lifecycle.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::billing_service::BillingService;
use super::discount_service::DiscountService;
use super::error::{ServiceError, ServiceResult};
use super::validation::{normalize_email, FieldErrors};
use crate::database::{CartStore, OrderStore, ProductStore};
use crate::models::{
    Cart, CartItem, DiscountUsage, Invoice, Order, OrderItem, OrderStatus, Payment, Product, ProductVariant,
    MAX_LINE_QUANTITY,
};
use crate::payment::{PaymentDispatcher, PaymentRequest};

/// A catalog variant to put in the cart, by id or by SKU. Prices always come
/// from the catalog.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCart {
    pub variant_id: Option<Uuid>,
    pub sku: Option<String>,
    pub quantity: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Checkout {
    pub discount_code: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayOrder {
    pub payment_method: Option<String>,
    pub payment_token: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPayment {
    pub order: Order,
    pub invoice: Invoice,
    pub payment: Payment,
}

#[derive(Clone)]
pub struct OrderService {
    carts: Arc<dyn CartStore>,
    orders: Arc<dyn OrderStore>,
    products: Arc<dyn ProductStore>,
    discounts: DiscountService,
    billing: BillingService,
    payments: Arc<PaymentDispatcher>,
    currency: String,
}

impl OrderService {
    pub fn new(
        carts: Arc<dyn CartStore>,
        orders: Arc<dyn OrderStore>,
        products: Arc<dyn ProductStore>,
        discounts: DiscountService,
        billing: BillingService,
        payments: Arc<PaymentDispatcher>,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            carts,
            orders,
            products,
            discounts,
            billing,
            payments,
            currency: currency.into(),
        }
    }

    /// Variant plus its product, both from this tenant's catalog.
    async fn catalog_entry(
        &self,
        tenant_id: Uuid,
        variant: Option<ProductVariant>,
    ) -> ServiceResult<Option<(Product, ProductVariant)>> {
        let Some(variant) = variant else {
            return Ok(None);
        };
        let product = self.products.find_by_id(tenant_id, variant.product_id).await?;
        Ok(product.map(|product| (product, variant)))
    }

    pub async fn add_to_cart(&self, tenant_id: Uuid, email: &str, item: AddToCart) -> ServiceResult<Cart> {
        let sku = item.sku.as_deref().map(str::trim).filter(|s| !s.is_empty());
        let mut errors = FieldErrors::new();
        errors
            .check(
                item.variant_id.is_some() || sku.is_some(),
                "variantId",
                "Either variantId or sku must be provided",
            )
            .check(
                (1..=MAX_LINE_QUANTITY).contains(&item.quantity),
                "quantity",
                &format!("Quantity must be between 1 and {}", MAX_LINE_QUANTITY),
            );
        errors.finish()?;

        let variant = match (item.variant_id, sku) {
            (Some(id), _) => self.products.find_variant(tenant_id, id).await?,
            (None, Some(sku)) => self.products.find_variant_by_sku(tenant_id, sku).await?,
            (None, None) => None,
        };
        let (product, variant) = self
            .catalog_entry(tenant_id, variant)
            .await?
            .ok_or_else(|| ServiceError::not_found("Product variant not found"))?;
        if !product.active {
            return Err(ServiceError::validation(format!(
                "Product is not available: {}",
                variant.sku
            )));
        }

        let email = normalize_email(email);
        let mut cart = match self.carts.find(tenant_id, &email).await? {
            Some(cart) => cart,
            None => Cart::new(tenant_id, email),
        };
        cart.add_item(CartItem {
            product_id: product.id,
            variant_id: variant.id,
            name: product.display_name(&variant),
            sku: variant.sku,
            unit_price: variant.price,
            quantity: item.quantity,
        })
        .map_err(|limit| ServiceError::validation(limit.to_string()))?;
        self.carts.save(&cart).await?;
        Ok(cart)
    }

    /// The shopper's cart, or an empty unsaved one.
    pub async fn get_cart(&self, tenant_id: Uuid, email: &str) -> ServiceResult<Cart> {
        let email = normalize_email(email);
        Ok(self
            .carts
            .find(tenant_id, &email)
            .await?
            .unwrap_or_else(|| Cart::new(tenant_id, email)))
    }

    pub async fn clear_cart(&self, tenant_id: Uuid, email: &str) -> ServiceResult<()> {
        self.carts.delete(tenant_id, &normalize_email(email)).await?;
        Ok(())
    }

    /// Turn the shopper's cart into a PENDING order priced from the current
    /// catalog. Stock is taken, the discount redeemed and the cart emptied in
    /// the same store write; nothing changes if any of that fails.
    pub async fn place_order(&self, tenant_id: Uuid, email: &str, checkout: Checkout) -> ServiceResult<Order> {
        let email = normalize_email(email);
        let cart = self
            .carts
            .find(tenant_id, &email)
            .await?
            .filter(|cart| !cart.is_empty())
            .ok_or_else(|| ServiceError::validation("Cart is empty"))?;

        let mut items = Vec::with_capacity(cart.items.len());
        for line in &cart.items {
            let variant = self.products.find_variant(tenant_id, line.variant_id).await?;
            let (product, variant) = match self.catalog_entry(tenant_id, variant).await? {
                Some((product, variant)) if product.active => (product, variant),
                _ => {
                    return Err(ServiceError::validation(format!(
                        "Product is no longer available: {}",
                        line.sku
                    )))
                }
            };
            if !variant.in_stock(line.quantity) {
                return Err(ServiceError::Conflict(format!("Insufficient stock for: {}", variant.sku)));
            }
            items.push(OrderItem {
                product_id: product.id,
                variant_id: variant.id,
                name: product.display_name(&variant),
                sku: variant.sku,
                unit_price: variant.price,
                quantity: line.quantity,
            });
        }

        let mut order = Order::new(tenant_id, email.clone(), items)
            .map_err(|overflow| ServiceError::validation(overflow.to_string()))?;

        let code = checkout.discount_code.as_deref().map(str::trim).filter(|c| !c.is_empty());
        let usage = match code {
            Some(code) => {
                let (discount, amount) = self
                    .discounts
                    .redeemable(tenant_id, code, order.subtotal, &email)
                    .await?;
                order.apply_discount(discount.code.clone(), amount);
                Some(DiscountUsage::new(&discount, email.clone(), order.id))
            }
            None => None,
        };

        self.orders.insert_from_cart(&order, usage.as_ref()).await?;
        tracing::info!(
            order_id = %order.id,
            order_number = %order.order_number,
            %tenant_id,
            total = %order.total_price,
            discount = ?order.discount_code,
            "order placed"
        );
        Ok(order)
    }

    pub async fn list_orders(&self, tenant_id: Uuid) -> ServiceResult<Vec<Order>> {
        Ok(self.orders.list(tenant_id).await?)
    }

    pub async fn list_customer_orders(&self, tenant_id: Uuid, email: &str) -> ServiceResult<Vec<Order>> {
        Ok(self.orders.list_by_customer(tenant_id, &normalize_email(email)).await?)
    }

    pub async fn get_order(&self, tenant_id: Uuid, id: Uuid) -> ServiceResult<Order> {
        self.orders
            .find_by_id(tenant_id, id)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("Order not found with id: {}", id)))
    }

    pub async fn get_order_by_number(&self, tenant_id: Uuid, order_number: &str) -> ServiceResult<Order> {
        self.orders
            .find_by_number(tenant_id, order_number)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("Order not found with number: {}", order_number)))
    }

    /// Write `order.status` if the stored status is still `previous`. A lost
    /// race is reported against whatever status won.
    async fn commit_transition(&self, order: &Order, previous: OrderStatus) -> ServiceResult<()> {
        let tenant_id = order.scope.tenant_id;
        let written = self
            .orders
            .update_status(tenant_id, order.id, previous, order.status, order.timestamps.updated_at)
            .await?;
        if written {
            return Ok(());
        }
        let current = self.get_order(tenant_id, order.id).await?;
        Err(current.status.transition(order.status).err().map_or_else(
            || ServiceError::Conflict(format!("Order {} was changed concurrently", order.order_number)),
            ServiceError::from,
        ))
    }

    pub async fn update_status(&self, tenant_id: Uuid, id: Uuid, target: OrderStatus) -> ServiceResult<Order> {
        let mut order = self.get_order(tenant_id, id).await?;
        let previous = order.transition_to(target)?;
        self.commit_transition(&order, previous).await?;
        tracing::info!(
            order_id = %order.id,
            from = %previous,
            to = %order.status,
            "order status changed"
        );
        Ok(order)
    }

    /// Charge the order total through the dispatcher and mark the order PAID.
    ///
    /// The order is claimed (PENDING to PAID) before the gateway is called,
    /// so two concurrent requests cannot both charge it. A failed or declined
    /// charge hands the order back to PENDING; a declined payment is still
    /// recorded before the error is returned.
    pub async fn pay_order(&self, tenant_id: Uuid, id: Uuid, request: PayOrder) -> ServiceResult<OrderPayment> {
        let mut order = self.get_order(tenant_id, id).await?;
        let previous = order.transition_to(OrderStatus::Paid)?;

        let charge = PaymentRequest {
            amount: order.total_price,
            currency: self.currency.clone(),
            payment_method: request.payment_method,
            description: format!("Order {}", order.order_number),
            payment_token: request.payment_token,
        };
        // an unknown method must not touch the order
        self.payments.resolve(&charge)?;
        self.commit_transition(&order, previous).await?;

        match self.charge(tenant_id, &order, &charge).await {
            Ok((invoice, payment)) => {
                tracing::info!(order_id = %order.id, payment_id = %payment.id, "order paid");
                Ok(OrderPayment {
                    order,
                    invoice,
                    payment,
                })
            }
            Err(err) => {
                self.release(&order, previous).await;
                Err(err)
            }
        }
    }

    async fn charge(&self, tenant_id: Uuid, order: &Order, charge: &PaymentRequest) -> ServiceResult<(Invoice, Payment)> {
        let outcome = self.payments.process(charge).await?;
        let (invoice, payment) = self
            .billing
            .settle(tenant_id, charge.amount, &charge.currency, &charge.description, &outcome)
            .await?;

        if !outcome.success {
            let reason = outcome
                .failure_reason
                .unwrap_or_else(|| "Payment was declined".to_string());
            tracing::warn!(order_id = %order.id, %reason, "order payment failed");
            return Err(ServiceError::PaymentFailed(reason));
        }
        Ok((invoice, payment))
    }

    /// Undo a claim after the charge did not go through.
    async fn release(&self, order: &Order, previous: OrderStatus) {
        let released = self
            .orders
            .update_status(order.scope.tenant_id, order.id, order.status, previous, Utc::now())
            .await;
        match released {
            Ok(true) => {}
            Ok(false) => tracing::error!(order_id = %order.id, "order changed while its payment was in flight"),
            Err(err) => tracing::error!(order_id = %order.id, error = %err, "could not release order after failed payment"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use rust_decimal::Decimal;

    use super::*;
    use crate::database::Stores;
    use crate::models::{Discount, DiscountType, InvoiceStatus, PaymentStatus};
    use crate::payment::{PaymentError, PaymentGateway, PaymentMethod, PaymentOutcome};

    const SHOPPER: &str = "shopper@example.com";

    fn service_with(stores: &Stores, payments: PaymentDispatcher) -> OrderService {
        OrderService::new(
            stores.carts.clone(),
            stores.orders.clone(),
            stores.products.clone(),
            DiscountService::new(stores.discounts.clone()),
            BillingService::new(stores.billing.clone()),
            Arc::new(payments),
            "USD",
        )
    }

    fn service(stores: &Stores) -> OrderService {
        service_with(stores, PaymentDispatcher::with_defaults())
    }

    /// One product per SKU, `stock` units each.
    async fn stock(stores: &Stores, tenant: Uuid, items: &[(&str, i64, u32)]) {
        for &(sku, cents, units) in items {
            let mut product = Product::new(tenant, format!("Item {}", sku), sku.to_ascii_lowercase(), None);
            let variant = ProductVariant::new(&product, format!("Item {}", sku), sku, Decimal::new(cents, 2), units);
            product.variants.push(variant);
            stores.products.insert(&product).await.unwrap();
        }
    }

    fn item(sku: &str, quantity: u32) -> AddToCart {
        AddToCart {
            variant_id: None,
            sku: Some(sku.into()),
            quantity,
        }
    }

    async fn pending_order(stores: &Stores, service: &OrderService, tenant: Uuid, cents: i64) -> Order {
        stock(stores, tenant, &[("A", cents, 10)]).await;
        service.add_to_cart(tenant, SHOPPER, item("A", 1)).await.unwrap();
        service.place_order(tenant, SHOPPER, Checkout::default()).await.unwrap()
    }

    #[tokio::test]
    async fn checkout_totals_and_clears_cart() {
        let stores = Stores::memory();
        let service = service(&stores);
        let tenant = Uuid::new_v4();
        stock(&stores, tenant, &[("A", 1050, 5), ("B", 300, 5)]).await;

        service.add_to_cart(tenant, SHOPPER, item("A", 2)).await.unwrap();
        service.add_to_cart(tenant, SHOPPER, item("B", 1)).await.unwrap();
        let cart = service.add_to_cart(tenant, SHOPPER, item("A", 1)).await.unwrap();
        assert_eq!(cart.items.len(), 2);

        let order = service.place_order(tenant, SHOPPER, Checkout::default()).await.unwrap();
        assert_eq!(order.total_price, Decimal::new(3450, 2));
        assert_eq!(order.status, OrderStatus::Pending);
        assert!(service.get_cart(tenant, SHOPPER).await.unwrap().is_empty());
        assert_eq!(service.list_customer_orders(tenant, SHOPPER).await.unwrap().len(), 1);

        let left = stores.products.find_variant_by_sku(tenant, "A").await.unwrap().unwrap();
        assert_eq!(left.stock_level, 2);
    }

    #[tokio::test]
    async fn checkout_uses_the_current_catalog_price() {
        let stores = Stores::memory();
        let service = service(&stores);
        let tenant = Uuid::new_v4();
        stock(&stores, tenant, &[("A", 1000, 5)]).await;
        service.add_to_cart(tenant, SHOPPER, item("A", 2)).await.unwrap();

        let mut variant = stores.products.find_variant_by_sku(tenant, "A").await.unwrap().unwrap();
        variant.price = Decimal::new(1500, 2);
        stores.products.update_variant(&variant).await.unwrap();

        let order = service.place_order(tenant, SHOPPER, Checkout::default()).await.unwrap();
        assert_eq!(order.items[0].unit_price, Decimal::new(1500, 2));
        assert_eq!(order.total_price, Decimal::new(3000, 2));
    }

    #[tokio::test]
    async fn empty_cart_cannot_be_checked_out() {
        let stores = Stores::memory();
        let err = service(&stores)
            .place_order(Uuid::new_v4(), SHOPPER, Checkout::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation { ref message, .. } if message == "Cart is empty"));
    }

    #[tokio::test]
    async fn rejects_bad_items() {
        let stores = Stores::memory();
        let service = service(&stores);
        let tenant = Uuid::new_v4();
        let err = service
            .add_to_cart(
                tenant,
                SHOPPER,
                AddToCart {
                    variant_id: None,
                    sku: None,
                    quantity: 0,
                },
            )
            .await
            .unwrap_err();
        match err {
            ServiceError::Validation { field_errors, .. } => {
                assert!(field_errors.contains_key("quantity"));
                assert!(field_errors.contains_key("variantId"));
            }
            other => panic!("unexpected {:?}", other),
        }

        assert!(matches!(
            service.add_to_cart(tenant, SHOPPER, item("GHOST", 1)).await,
            Err(ServiceError::NotFound(_))
        ));
        assert!(matches!(
            service.add_to_cart(tenant, SHOPPER, item("A", u32::MAX)).await,
            Err(ServiceError::Validation { .. })
        ));
    }

    #[tokio::test]
    async fn line_quantity_cannot_grow_past_the_cap() {
        let stores = Stores::memory();
        let service = service(&stores);
        let tenant = Uuid::new_v4();
        stock(&stores, tenant, &[("A", 100, 5)]).await;

        service.add_to_cart(tenant, SHOPPER, item("A", MAX_LINE_QUANTITY)).await.unwrap();
        assert!(matches!(
            service.add_to_cart(tenant, SHOPPER, item("A", 1)).await,
            Err(ServiceError::Validation { .. })
        ));
        let cart = service.get_cart(tenant, SHOPPER).await.unwrap();
        assert_eq!(cart.items[0].quantity, MAX_LINE_QUANTITY);
    }

    #[tokio::test]
    async fn short_stock_is_a_conflict_and_keeps_the_cart() {
        let stores = Stores::memory();
        let service = service(&stores);
        let tenant = Uuid::new_v4();
        stock(&stores, tenant, &[("A", 100, 1)]).await;
        service.add_to_cart(tenant, SHOPPER, item("A", 2)).await.unwrap();

        assert!(matches!(
            service.place_order(tenant, SHOPPER, Checkout::default()).await,
            Err(ServiceError::Conflict(ref m)) if m == "Insufficient stock for: A"
        ));
        assert_eq!(service.get_cart(tenant, SHOPPER).await.unwrap().items.len(), 1);
        assert!(service.list_orders(tenant).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn discount_code_reduces_the_total_once_per_shopper() {
        let stores = Stores::memory();
        let service = service(&stores);
        let tenant = Uuid::new_v4();
        stock(&stores, tenant, &[("A", 2000, 10)]).await;
        let mut discount = Discount::new(tenant, "save5", DiscountType::FixedAmount, Decimal::from(5));
        discount.usage_limit_per_customer = Some(1);
        stores.discounts.insert(&discount).await.unwrap();

        let code = || Checkout {
            discount_code: Some(" save5 ".into()),
        };
        service.add_to_cart(tenant, SHOPPER, item("A", 1)).await.unwrap();
        let order = service.place_order(tenant, SHOPPER, code()).await.unwrap();
        assert_eq!(order.subtotal, Decimal::from(20));
        assert_eq!(order.discount_code.as_deref(), Some("SAVE5"));
        assert_eq!(order.total_price, Decimal::from(15));

        service.add_to_cart(tenant, SHOPPER, item("A", 1)).await.unwrap();
        assert!(matches!(
            service.place_order(tenant, SHOPPER, code()).await,
            Err(ServiceError::Validation { .. })
        ));
        let stored = stores.discounts.find_by_id(tenant, discount.id).await.unwrap().unwrap();
        assert_eq!(stored.times_used, 1);
    }

    #[tokio::test]
    async fn status_changes_follow_the_lifecycle() {
        let stores = Stores::memory();
        let service = service(&stores);
        let tenant = Uuid::new_v4();
        let order = pending_order(&stores, &service, tenant, 100).await;

        let err = service
            .update_status(tenant, order.id, OrderStatus::Delivered)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::InvalidTransition(t) if t.from == OrderStatus::Pending && t.to == OrderStatus::Delivered
        ));

        service.update_status(tenant, order.id, OrderStatus::Cancelled).await.unwrap();
        let stored = service.get_order(tenant, order.id).await.unwrap();
        assert_eq!(stored.status, OrderStatus::Cancelled);

        assert!(matches!(
            service.update_status(Uuid::new_v4(), order.id, OrderStatus::Paid).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn paying_records_invoice_and_payment() {
        let stores = Stores::memory();
        let service = service(&stores);
        let tenant = Uuid::new_v4();
        let order = pending_order(&stores, &service, tenant, 4900).await;

        let paid = service.pay_order(tenant, order.id, PayOrder::default()).await.unwrap();
        assert_eq!(paid.order.status, OrderStatus::Paid);
        assert_eq!(paid.invoice.status, InvoiceStatus::Paid);
        assert_eq!(paid.payment.status, PaymentStatus::Succeeded);
        assert_eq!(paid.payment.amount, Decimal::new(4900, 2));

        let again = service.pay_order(tenant, order.id, PayOrder::default()).await.unwrap_err();
        assert!(matches!(again, ServiceError::InvalidTransition(_)));
    }

    #[tokio::test]
    async fn unsupported_method_charges_nothing() {
        let stores = Stores::memory();
        let service = service(&stores);
        let tenant = Uuid::new_v4();
        let order = pending_order(&stores, &service, tenant, 100).await;

        let err = service
            .pay_order(
                tenant,
                order.id,
                PayOrder {
                    payment_method: Some("bitcoin".into()),
                    payment_token: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::UnsupportedPaymentMethod(ref m) if m == "BITCOIN"));
        assert!(stores.billing.list_payments(tenant).await.unwrap().is_empty());
        assert_eq!(service.get_order(tenant, order.id).await.unwrap().status, OrderStatus::Pending);
    }

    /// Takes a while to answer and remembers how often it was asked.
    struct SlowGateway {
        calls: AtomicUsize,
        approve: bool,
    }

    #[async_trait]
    impl PaymentGateway for SlowGateway {
        fn method(&self) -> PaymentMethod {
            PaymentMethod::Mock
        }

        async fn process(&self, _request: &PaymentRequest) -> Result<PaymentOutcome, PaymentError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok(PaymentOutcome {
                method: PaymentMethod::Mock,
                success: self.approve,
                transaction_id: Some(format!("slow_{}_{}", call, Uuid::new_v4().simple())),
                failure_reason: (!self.approve).then(|| "card declined".to_string()),
            })
        }
    }

    fn slow(approve: bool) -> (Arc<SlowGateway>, PaymentDispatcher) {
        let gateway = Arc::new(SlowGateway {
            calls: AtomicUsize::new(0),
            approve,
        });
        let mut dispatcher = PaymentDispatcher::new();
        dispatcher.register(gateway.clone()).unwrap();
        (gateway, dispatcher)
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_payments_charge_once() {
        let stores = Stores::memory();
        let (gateway, dispatcher) = slow(true);
        let service = service_with(&stores, dispatcher);
        let tenant = Uuid::new_v4();
        let order = pending_order(&stores, &service, tenant, 4900).await;

        let first = tokio::spawn({
            let service = service.clone();
            async move { service.pay_order(tenant, order.id, PayOrder::default()).await }
        });
        let second = tokio::spawn({
            let service = service.clone();
            async move { service.pay_order(tenant, order.id, PayOrder::default()).await }
        });
        let results = [first.await.unwrap(), second.await.unwrap()];

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results
            .iter()
            .any(|r| matches!(r, Err(ServiceError::InvalidTransition(t)) if t.from == OrderStatus::Paid)));
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 1);
        assert_eq!(stores.billing.list_payments(tenant).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn declined_payment_leaves_the_order_payable() {
        let stores = Stores::memory();
        let (gateway, dispatcher) = slow(false);
        let service = service_with(&stores, dispatcher);
        let tenant = Uuid::new_v4();
        let order = pending_order(&stores, &service, tenant, 4900).await;

        let err = service.pay_order(tenant, order.id, PayOrder::default()).await.unwrap_err();
        assert!(matches!(err, ServiceError::PaymentFailed(ref r) if r == "card declined"));
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 1);
        assert_eq!(service.get_order(tenant, order.id).await.unwrap().status, OrderStatus::Pending);

        let payments = stores.billing.list_payments(tenant).await.unwrap();
        assert_eq!(payments.len(), 1);
        assert_eq!(payments[0].status, PaymentStatus::Failed);
    }
}
