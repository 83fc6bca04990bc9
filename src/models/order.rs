//! Orders, carts and the order lifecycle.
//!
//! An order moves through a fixed set of stages. Only the edges listed in
//! [`OrderStatus::valid_transitions`] are legal; everything else is rejected
//! with an [`InvalidTransition`] that carries both ends of the attempted move.
//!
//! ```text
//! PENDING ──► PAID ──► PROCESSING ──► SHIPPED ──► DELIVERED
//!    │          │  └──────────────────►  ▲
//!    │          │             │
//!    └──────────┴─────────────┴──► CANCELLED
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{TenantScope, Timestamps};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Paid,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

text_enum!(OrderStatus, "order status", {
    Pending => "PENDING",
    Paid => "PAID",
    Processing => "PROCESSING",
    Shipped => "SHIPPED",
    Delivered => "DELIVERED",
    Cancelled => "CANCELLED",
});

/// Rejected status change. Both states are kept for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Invalid order state transition from {from} to {to}")]
pub struct InvalidTransition {
    pub from: OrderStatus,
    pub to: OrderStatus,
}

impl OrderStatus {
    /// Statuses reachable in one step from `self`.
    pub fn valid_transitions(&self) -> &'static [OrderStatus] {
        use OrderStatus::*;
        match self {
            Pending => &[Paid, Cancelled],
            Paid => &[Processing, Shipped, Cancelled],
            Processing => &[Shipped, Cancelled],
            Shipped => &[Delivered],
            Delivered | Cancelled => &[],
        }
    }

    pub fn can_transition_to(&self, target: OrderStatus) -> bool {
        self.valid_transitions().contains(&target)
    }

    pub fn is_terminal(&self) -> bool {
        self.valid_transitions().is_empty()
    }

    /// Validate a move to `target`, returning the new status on success.
    pub fn transition(self, target: OrderStatus) -> Result<OrderStatus, InvalidTransition> {
        if self.can_transition_to(target) {
            Ok(target)
        } else {
            Err(InvalidTransition { from: self, to: target })
        }
    }
}

/// Most units of one variant a single cart line or order line may hold.
pub const MAX_LINE_QUANTITY: u32 = 10_000;

/// Most distinct lines a cart may hold.
pub const MAX_CART_LINES: usize = 100;

/// An amount left the range `Decimal` can represent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Order amount is out of range")]
pub struct AmountOverflow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CartLimit {
    #[error("Quantity per line cannot exceed {}", MAX_LINE_QUANTITY)]
    Quantity,

    #[error("A cart cannot hold more than {} lines", MAX_CART_LINES)]
    Lines,
}

/// A priced line, copied from the catalog when the order is placed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: Uuid,
    pub variant_id: Uuid,
    pub sku: String,
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: u32,
}

impl OrderItem {
    pub fn line_total(&self) -> Result<Decimal, AmountOverflow> {
        self.unit_price
            .checked_mul(Decimal::from(self.quantity))
            .ok_or(AmountOverflow)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub order_number: String,
    pub customer_email: String,
    pub status: OrderStatus,
    pub subtotal: Decimal,
    pub discount_code: Option<String>,
    pub discount_amount: Decimal,
    pub total_price: Decimal,
    pub items: Vec<OrderItem>,
    #[serde(flatten)]
    pub scope: TenantScope,
    #[serde(flatten)]
    pub timestamps: Timestamps,
}

impl Order {
    /// Build a PENDING order. The subtotal is the sum of the line totals and
    /// nothing is discounted yet.
    pub fn new(
        tenant_id: Uuid,
        customer_email: impl Into<String>,
        items: Vec<OrderItem>,
    ) -> Result<Self, AmountOverflow> {
        let subtotal = items.iter().try_fold(Decimal::ZERO, |sum, item| {
            sum.checked_add(item.line_total()?).ok_or(AmountOverflow)
        })?;

        Ok(Self {
            id: Uuid::new_v4(),
            order_number: generate_order_number(),
            customer_email: customer_email.into(),
            status: OrderStatus::Pending,
            subtotal,
            discount_code: None,
            discount_amount: Decimal::ZERO,
            total_price: subtotal,
            items,
            scope: TenantScope::new(tenant_id),
            timestamps: Timestamps::now(),
        })
    }

    /// Take `amount` off the subtotal, clamped to `0..=subtotal`.
    pub fn apply_discount(&mut self, code: impl Into<String>, amount: Decimal) {
        let amount = amount.max(Decimal::ZERO).min(self.subtotal);
        self.discount_code = Some(code.into());
        self.discount_amount = amount;
        self.total_price = self.subtotal - amount;
    }

    /// Apply a status change, bumping `updated_at` on success.
    pub fn transition_to(&mut self, target: OrderStatus) -> Result<OrderStatus, InvalidTransition> {
        let previous = self.status;
        self.status = previous.transition(target)?;
        self.timestamps.touch();
        Ok(previous)
    }
}

/// `ORD-` followed by eight upper-case hex digits.
pub fn generate_order_number() -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("ORD-{}", hex[..8].to_ascii_uppercase())
}

/// A variant reference plus the price shown when it was added. Checkout
/// re-reads the price from the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub product_id: Uuid,
    pub variant_id: Uuid,
    pub sku: String,
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: u32,
}

/// One open cart per (tenant, customer email).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub id: Uuid,
    pub customer_email: String,
    pub items: Vec<CartItem>,
    #[serde(flatten)]
    pub scope: TenantScope,
    #[serde(flatten)]
    pub timestamps: Timestamps,
}

impl Cart {
    pub fn new(tenant_id: Uuid, customer_email: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            customer_email: customer_email.into(),
            items: Vec::new(),
            scope: TenantScope::new(tenant_id),
            timestamps: Timestamps::now(),
        }
    }

    /// Add an item; an existing line for the same variant has its quantity
    /// increased and its price refreshed. The cart is unchanged on error.
    pub fn add_item(&mut self, item: CartItem) -> Result<(), CartLimit> {
        if item.quantity > MAX_LINE_QUANTITY {
            return Err(CartLimit::Quantity);
        }
        let line_count = self.items.len();
        match self
            .items
            .iter_mut()
            .find(|existing| existing.variant_id == item.variant_id)
        {
            Some(existing) => {
                let quantity = existing
                    .quantity
                    .checked_add(item.quantity)
                    .filter(|q| *q <= MAX_LINE_QUANTITY)
                    .ok_or(CartLimit::Quantity)?;
                existing.quantity = quantity;
                existing.unit_price = item.unit_price;
            }
            None if line_count >= MAX_CART_LINES => return Err(CartLimit::Lines),
            None => self.items.push(item),
        }
        self.timestamps.touch();
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALLOWED: &[(OrderStatus, OrderStatus)] = &[
        (OrderStatus::Pending, OrderStatus::Paid),
        (OrderStatus::Pending, OrderStatus::Cancelled),
        (OrderStatus::Paid, OrderStatus::Processing),
        (OrderStatus::Paid, OrderStatus::Shipped),
        (OrderStatus::Paid, OrderStatus::Cancelled),
        (OrderStatus::Processing, OrderStatus::Shipped),
        (OrderStatus::Processing, OrderStatus::Cancelled),
        (OrderStatus::Shipped, OrderStatus::Delivered),
    ];

    #[test]
    fn every_pair_follows_the_adjacency() {
        for &from in OrderStatus::ALL {
            for &to in OrderStatus::ALL {
                let result = from.transition(to);
                if ALLOWED.contains(&(from, to)) {
                    assert_eq!(result, Ok(to), "{from} -> {to} should be allowed");
                } else {
                    assert_eq!(
                        result,
                        Err(InvalidTransition { from, to }),
                        "{from} -> {to} should be rejected"
                    );
                }
            }
        }
    }

    #[test]
    fn terminal_states() {
        assert!(OrderStatus::Delivered.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(!OrderStatus::Shipped.is_terminal());
    }

    #[test]
    fn invalid_transition_message_names_both_states() {
        let err = OrderStatus::Delivered.transition(OrderStatus::Pending).unwrap_err();
        assert_eq!(err.to_string(), "Invalid order state transition from DELIVERED to PENDING");
    }

    fn cart_item(variant_id: Uuid, cents: i64, quantity: u32) -> CartItem {
        CartItem {
            product_id: Uuid::new_v4(),
            variant_id,
            sku: format!("SKU-{}", cents),
            name: "Thing".into(),
            unit_price: Decimal::new(cents, 2),
            quantity,
        }
    }

    fn order_item(cents: i64, quantity: u32) -> OrderItem {
        OrderItem {
            product_id: Uuid::new_v4(),
            variant_id: Uuid::new_v4(),
            sku: "SKU".into(),
            name: "Thing".into(),
            unit_price: Decimal::new(cents, 2),
            quantity,
        }
    }

    #[test]
    fn cart_merges_same_variant() {
        let mut cart = Cart::new(Uuid::new_v4(), "shopper@example.com");
        let variant = Uuid::new_v4();
        cart.add_item(cart_item(variant, 1999, 1)).unwrap();
        cart.add_item(cart_item(variant, 1899, 2)).unwrap();
        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].quantity, 3);
        assert_eq!(cart.items[0].unit_price, Decimal::new(1899, 2));
    }

    #[test]
    fn cart_quantity_is_bounded() {
        let mut cart = Cart::new(Uuid::new_v4(), "shopper@example.com");
        let variant = Uuid::new_v4();
        assert_eq!(
            cart.add_item(cart_item(variant, 100, MAX_LINE_QUANTITY + 1)),
            Err(CartLimit::Quantity)
        );
        cart.add_item(cart_item(variant, 100, MAX_LINE_QUANTITY)).unwrap();
        assert_eq!(cart.add_item(cart_item(variant, 100, u32::MAX)), Err(CartLimit::Quantity));
        assert_eq!(cart.add_item(cart_item(variant, 100, 1)), Err(CartLimit::Quantity));
        assert_eq!(cart.items[0].quantity, MAX_LINE_QUANTITY);
    }

    #[test]
    fn cart_line_count_is_bounded() {
        let mut cart = Cart::new(Uuid::new_v4(), "shopper@example.com");
        for _ in 0..MAX_CART_LINES {
            cart.add_item(cart_item(Uuid::new_v4(), 100, 1)).unwrap();
        }
        assert_eq!(cart.add_item(cart_item(Uuid::new_v4(), 100, 1)), Err(CartLimit::Lines));
    }

    #[test]
    fn order_sums_lines() {
        let order = Order::new(
            Uuid::new_v4(),
            "shopper@example.com",
            vec![order_item(1050, 2), order_item(300, 1)],
        )
        .unwrap();
        assert_eq!(order.subtotal, Decimal::new(2400, 2));
        assert_eq!(order.total_price, Decimal::new(2400, 2));
        assert_eq!(order.discount_amount, Decimal::ZERO);
        assert_eq!(order.status, OrderStatus::Pending);
        assert!(order.order_number.starts_with("ORD-"));
        assert_eq!(order.order_number.len(), 12);
    }

    #[test]
    fn huge_amounts_are_an_error_not_a_panic() {
        let mut line = order_item(0, u32::MAX);
        line.unit_price = Decimal::MAX;
        assert_eq!(line.line_total(), Err(AmountOverflow));

        let mut half = order_item(0, 1);
        half.unit_price = Decimal::MAX;
        assert_eq!(
            Order::new(Uuid::new_v4(), "s@example.com", vec![half.clone(), half]).unwrap_err(),
            AmountOverflow
        );
    }

    #[test]
    fn discount_is_clamped_to_subtotal() {
        let mut order = Order::new(Uuid::new_v4(), "s@example.com", vec![order_item(500, 2)]).unwrap();
        order.apply_discount("TENOFF", Decimal::from(25));
        assert_eq!(order.discount_amount, Decimal::from(10));
        assert_eq!(order.total_price, Decimal::ZERO);
        assert_eq!(order.discount_code.as_deref(), Some("TENOFF"));
    }

    #[test]
    fn transition_to_keeps_previous() {
        let mut order = Order::new(Uuid::new_v4(), "s@example.com", Vec::new()).unwrap();
        assert_eq!(order.transition_to(OrderStatus::Paid), Ok(OrderStatus::Pending));
        assert_eq!(order.status, OrderStatus::Paid);
        assert!(order.transition_to(OrderStatus::Pending).is_err());
        assert_eq!(order.status, OrderStatus::Paid);
    }
}
