use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use super::{decode, PgStore};
use crate::database::manager::{DatabaseError, DatabaseResult};
use crate::database::store::{CartStore, OrderStore};
use crate::models::{
    Cart, CartItem, DiscountUsage, Order, OrderItem, OrderStatus, TenantOwned, TenantScope,
    Timestamps,
};

const CART_COLUMNS: &str = "id, tenant_id, customer_email, items, created_at, updated_at";
const ORDER_COLUMNS: &str = "id, tenant_id, order_number, customer_email, status, subtotal, \
     discount_code, discount_amount, total_price, items, created_at, updated_at";

#[derive(FromRow)]
struct CartRow {
    id: Uuid,
    tenant_id: Uuid,
    customer_email: String,
    items: Json<Vec<CartItem>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CartRow> for Cart {
    fn from(row: CartRow) -> Self {
        Cart {
            id: row.id,
            customer_email: row.customer_email,
            items: row.items.0,
            scope: TenantScope::new(row.tenant_id),
            timestamps: Timestamps {
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
        }
    }
}

#[derive(FromRow)]
struct OrderRow {
    id: Uuid,
    tenant_id: Uuid,
    order_number: String,
    customer_email: String,
    status: String,
    subtotal: Decimal,
    discount_code: Option<String>,
    discount_amount: Decimal,
    total_price: Decimal,
    items: Json<Vec<OrderItem>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = DatabaseError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        Ok(Order {
            id: row.id,
            order_number: row.order_number,
            customer_email: row.customer_email,
            status: decode(&row.status)?,
            subtotal: row.subtotal,
            discount_code: row.discount_code,
            discount_amount: row.discount_amount,
            total_price: row.total_price,
            items: row.items.0,
            scope: TenantScope::new(row.tenant_id),
            timestamps: Timestamps {
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
        })
    }
}

fn into_orders(rows: Vec<OrderRow>) -> DatabaseResult<Vec<Order>> {
    rows.into_iter().map(Order::try_from).collect()
}

#[async_trait]
impl CartStore for PgStore {
    async fn find(&self, tenant_id: Uuid, customer_email: &str) -> DatabaseResult<Option<Cart>> {
        let row = sqlx::query_as::<_, CartRow>(&format!(
            "SELECT {CART_COLUMNS} FROM carts WHERE tenant_id = $1 AND customer_email = $2"
        ))
        .bind(tenant_id)
        .bind(customer_email)
        .fetch_optional(self.pool())
        .await?;
        Ok(row.map(Cart::from))
    }

    async fn save(&self, cart: &Cart) -> DatabaseResult<()> {
        sqlx::query(
            "INSERT INTO carts (id, tenant_id, customer_email, items, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT (tenant_id, customer_email)
             DO UPDATE SET items = EXCLUDED.items, updated_at = EXCLUDED.updated_at",
        )
        .bind(cart.id)
        .bind(cart.tenant_id())
        .bind(&cart.customer_email)
        .bind(Json(&cart.items))
        .bind(cart.timestamps.created_at)
        .bind(cart.timestamps.updated_at)
        .execute(self.pool())
        .await
        .map_err(|err| DatabaseError::from_write(err, "cart"))?;
        Ok(())
    }

    async fn delete(&self, tenant_id: Uuid, customer_email: &str) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM carts WHERE tenant_id = $1 AND customer_email = $2")
            .bind(tenant_id)
            .bind(customer_email)
            .execute(self.pool())
            .await?;
        Ok(())
    }
}

#[async_trait]
impl OrderStore for PgStore {
    async fn insert_from_cart(&self, order: &Order, usage: Option<&DiscountUsage>) -> DatabaseResult<()> {
        let mut tx = self.pool().begin().await?;

        // The row lock taken by each UPDATE serialises concurrent checkouts
        for item in &order.items {
            let taken = sqlx::query(
                "UPDATE product_variants SET stock_level = stock_level - $3
                 WHERE tenant_id = $1 AND id = $2 AND stock_level >= $3",
            )
            .bind(order.tenant_id())
            .bind(item.variant_id)
            .bind(i64::from(item.quantity))
            .execute(&mut *tx)
            .await?;
            if taken.rows_affected() == 0 {
                return Err(DatabaseError::InsufficientStock(item.sku.clone()));
            }
        }

        sqlx::query(
            "INSERT INTO orders (id, tenant_id, order_number, customer_email, status, subtotal,
                 discount_code, discount_amount, total_price, items, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
        )
        .bind(order.id)
        .bind(order.tenant_id())
        .bind(&order.order_number)
        .bind(&order.customer_email)
        .bind(order.status.as_str())
        .bind(order.subtotal)
        .bind(&order.discount_code)
        .bind(order.discount_amount)
        .bind(order.total_price)
        .bind(Json(&order.items))
        .bind(order.timestamps.created_at)
        .bind(order.timestamps.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|err| DatabaseError::from_write(err, "order"))?;

        if let Some(usage) = usage {
            redeem(&mut tx, usage).await?;
        }

        sqlx::query("DELETE FROM carts WHERE tenant_id = $1 AND customer_email = $2")
            .bind(order.tenant_id())
            .bind(&order.customer_email)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn find_by_id(&self, tenant_id: Uuid, id: Uuid) -> DatabaseResult<Option<Order>> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE tenant_id = $1 AND id = $2"
        ))
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(self.pool())
        .await?;
        row.map(Order::try_from).transpose()
    }

    async fn find_by_number(&self, tenant_id: Uuid, order_number: &str) -> DatabaseResult<Option<Order>> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE tenant_id = $1 AND order_number = $2"
        ))
        .bind(tenant_id)
        .bind(order_number)
        .fetch_optional(self.pool())
        .await?;
        row.map(Order::try_from).transpose()
    }

    async fn list(&self, tenant_id: Uuid) -> DatabaseResult<Vec<Order>> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE tenant_id = $1 ORDER BY created_at, id"
        ))
        .bind(tenant_id)
        .fetch_all(self.pool())
        .await?;
        into_orders(rows)
    }

    async fn list_by_customer(&self, tenant_id: Uuid, customer_email: &str) -> DatabaseResult<Vec<Order>> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders
             WHERE tenant_id = $1 AND customer_email = $2
             ORDER BY created_at, id"
        ))
        .bind(tenant_id)
        .bind(customer_email)
        .fetch_all(self.pool())
        .await?;
        into_orders(rows)
    }

    async fn update_status(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        from: OrderStatus,
        to: OrderStatus,
        updated_at: DateTime<Utc>,
    ) -> DatabaseResult<bool> {
        let result = sqlx::query(
            "UPDATE orders SET status = $4, updated_at = $5
             WHERE tenant_id = $1 AND id = $2 AND status = $3",
        )
        .bind(tenant_id)
        .bind(id)
        .bind(from.as_str())
        .bind(to.as_str())
        .bind(updated_at)
        .execute(self.pool())
        .await?;

        if result.rows_affected() == 1 {
            return Ok(true);
        }

        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM orders WHERE tenant_id = $1 AND id = $2)",
        )
        .bind(tenant_id)
        .bind(id)
        .fetch_one(self.pool())
        .await?;
        if !exists {
            return Err(DatabaseError::NotFound(format!("order {}", id)));
        }
        Ok(false)
    }
}

/// Count one use of a discount inside the checkout transaction. The UPDATE
/// locks the discount row, so the per-customer count that follows cannot
/// race another checkout for the same code.
async fn redeem(tx: &mut sqlx::PgConnection, usage: &DiscountUsage) -> DatabaseResult<()> {
    let per_customer: Option<Option<i64>> = sqlx::query_scalar(
        "UPDATE discounts SET times_used = times_used + 1
         WHERE tenant_id = $1 AND id = $2 AND (usage_limit IS NULL OR times_used < usage_limit)
         RETURNING usage_limit_per_customer",
    )
    .bind(usage.tenant_id())
    .bind(usage.discount_id)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(per_customer) = per_customer else {
        return Err(DatabaseError::DiscountExhausted { per_customer: false });
    };

    if let Some(limit) = per_customer {
        let used: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM discount_usages WHERE discount_id = $1 AND customer_email = $2",
        )
        .bind(usage.discount_id)
        .bind(&usage.customer_email)
        .fetch_one(&mut *tx)
        .await?;
        if used >= limit {
            return Err(DatabaseError::DiscountExhausted { per_customer: true });
        }
    }

    sqlx::query(
        "INSERT INTO discount_usages (id, tenant_id, discount_id, customer_email, order_id, used_at)
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(usage.id)
    .bind(usage.tenant_id())
    .bind(usage.discount_id)
    .bind(&usage.customer_email)
    .bind(usage.order_id)
    .bind(usage.used_at)
    .execute(&mut *tx)
    .await?;
    Ok(())
}
