use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;
use uuid::Uuid;

use super::PgStore;
use crate::database::manager::{DatabaseError, DatabaseResult};
use crate::database::store::ProductStore;
use crate::models::{Product, ProductVariant, TenantOwned, TenantScope, Timestamps};

const PRODUCT_COLUMNS: &str =
    "id, tenant_id, name, slug, description, active, created_at, updated_at";
const VARIANT_COLUMNS: &str = "id, tenant_id, product_id, name, sku, price, stock_level";

#[derive(FromRow)]
struct ProductRow {
    id: Uuid,
    tenant_id: Uuid,
    name: String,
    slug: String,
    description: Option<String>,
    active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ProductRow {
    fn into_product(self, variants: Vec<ProductVariant>) -> Product {
        Product {
            id: self.id,
            name: self.name,
            slug: self.slug,
            description: self.description,
            active: self.active,
            variants,
            scope: TenantScope::new(self.tenant_id),
            timestamps: Timestamps {
                created_at: self.created_at,
                updated_at: self.updated_at,
            },
        }
    }
}

#[derive(FromRow)]
struct VariantRow {
    id: Uuid,
    tenant_id: Uuid,
    product_id: Uuid,
    name: String,
    sku: String,
    price: Decimal,
    stock_level: i64,
}

impl TryFrom<VariantRow> for ProductVariant {
    type Error = DatabaseError;

    fn try_from(row: VariantRow) -> Result<Self, Self::Error> {
        let stock_level = u32::try_from(row.stock_level)
            .map_err(|_| DatabaseError::Decode(format!("stock level {}", row.stock_level)))?;
        Ok(ProductVariant {
            id: row.id,
            product_id: row.product_id,
            name: row.name,
            sku: row.sku,
            price: row.price,
            stock_level,
            scope: TenantScope::new(row.tenant_id),
        })
    }
}

async fn insert_variant<'e, E>(executor: E, variant: &ProductVariant) -> DatabaseResult<()>
where
    E: sqlx::PgExecutor<'e>,
{
    sqlx::query(
        "INSERT INTO product_variants (id, tenant_id, product_id, name, sku, price, stock_level)
         VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(variant.id)
    .bind(variant.tenant_id())
    .bind(variant.product_id)
    .bind(&variant.name)
    .bind(&variant.sku)
    .bind(variant.price)
    .bind(i64::from(variant.stock_level))
    .execute(executor)
    .await
    .map_err(|err| DatabaseError::from_write(err, "variant sku"))?;
    Ok(())
}

impl PgStore {
    /// Attach variants to product rows with one extra query.
    async fn with_variants(&self, tenant_id: Uuid, rows: Vec<ProductRow>) -> DatabaseResult<Vec<Product>> {
        let ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
        let variant_rows = sqlx::query_as::<_, VariantRow>(&format!(
            "SELECT {VARIANT_COLUMNS} FROM product_variants
             WHERE tenant_id = $1 AND product_id = ANY($2)
             ORDER BY sku"
        ))
        .bind(tenant_id)
        .bind(&ids)
        .fetch_all(self.pool())
        .await?;

        let mut by_product: HashMap<Uuid, Vec<ProductVariant>> = HashMap::new();
        for row in variant_rows {
            let variant = ProductVariant::try_from(row)?;
            by_product.entry(variant.product_id).or_default().push(variant);
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let variants = by_product.remove(&row.id).unwrap_or_default();
                row.into_product(variants)
            })
            .collect())
    }

    async fn one_product(&self, tenant_id: Uuid, row: Option<ProductRow>) -> DatabaseResult<Option<Product>> {
        match row {
            Some(row) => Ok(self.with_variants(tenant_id, vec![row]).await?.pop()),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl ProductStore for PgStore {
    async fn insert(&self, product: &Product) -> DatabaseResult<()> {
        let mut tx = self.pool().begin().await?;

        sqlx::query(
            "INSERT INTO products (id, tenant_id, name, slug, description, active, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(product.id)
        .bind(product.tenant_id())
        .bind(&product.name)
        .bind(&product.slug)
        .bind(&product.description)
        .bind(product.active)
        .bind(product.timestamps.created_at)
        .bind(product.timestamps.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|err| DatabaseError::from_write(err, "product slug"))?;

        for variant in &product.variants {
            insert_variant(&mut *tx, variant).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn update(&self, product: &Product) -> DatabaseResult<()> {
        let result = sqlx::query(
            "UPDATE products
             SET name = $3, slug = $4, description = $5, active = $6, updated_at = $7
             WHERE tenant_id = $1 AND id = $2",
        )
        .bind(product.tenant_id())
        .bind(product.id)
        .bind(&product.name)
        .bind(&product.slug)
        .bind(&product.description)
        .bind(product.active)
        .bind(product.timestamps.updated_at)
        .execute(self.pool())
        .await
        .map_err(|err| DatabaseError::from_write(err, "product slug"))?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("product {}", product.id)));
        }
        Ok(())
    }

    async fn find_by_id(&self, tenant_id: Uuid, id: Uuid) -> DatabaseResult<Option<Product>> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE tenant_id = $1 AND id = $2"
        ))
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(self.pool())
        .await?;
        self.one_product(tenant_id, row).await
    }

    async fn find_by_slug(&self, tenant_id: Uuid, slug: &str) -> DatabaseResult<Option<Product>> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE tenant_id = $1 AND slug = $2"
        ))
        .bind(tenant_id)
        .bind(slug)
        .fetch_optional(self.pool())
        .await?;
        self.one_product(tenant_id, row).await
    }

    async fn list(&self, tenant_id: Uuid, active_only: bool) -> DatabaseResult<Vec<Product>> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products
             WHERE tenant_id = $1 AND (active OR NOT $2)
             ORDER BY name, id"
        ))
        .bind(tenant_id)
        .bind(active_only)
        .fetch_all(self.pool())
        .await?;
        self.with_variants(tenant_id, rows).await
    }

    async fn delete(&self, tenant_id: Uuid, id: Uuid) -> DatabaseResult<()> {
        // variants go with the product (ON DELETE CASCADE)
        let result = sqlx::query("DELETE FROM products WHERE tenant_id = $1 AND id = $2")
            .bind(tenant_id)
            .bind(id)
            .execute(self.pool())
            .await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("product {}", id)));
        }
        Ok(())
    }

    async fn find_variant(&self, tenant_id: Uuid, id: Uuid) -> DatabaseResult<Option<ProductVariant>> {
        let row = sqlx::query_as::<_, VariantRow>(&format!(
            "SELECT {VARIANT_COLUMNS} FROM product_variants WHERE tenant_id = $1 AND id = $2"
        ))
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(self.pool())
        .await?;
        row.map(ProductVariant::try_from).transpose()
    }

    async fn find_variant_by_sku(&self, tenant_id: Uuid, sku: &str) -> DatabaseResult<Option<ProductVariant>> {
        let row = sqlx::query_as::<_, VariantRow>(&format!(
            "SELECT {VARIANT_COLUMNS} FROM product_variants WHERE tenant_id = $1 AND sku = $2"
        ))
        .bind(tenant_id)
        .bind(sku)
        .fetch_optional(self.pool())
        .await?;
        row.map(ProductVariant::try_from).transpose()
    }

    async fn update_variant(&self, variant: &ProductVariant) -> DatabaseResult<()> {
        let result = sqlx::query(
            "UPDATE product_variants
             SET name = $3, sku = $4, price = $5, stock_level = $6
             WHERE tenant_id = $1 AND id = $2",
        )
        .bind(variant.tenant_id())
        .bind(variant.id)
        .bind(&variant.name)
        .bind(&variant.sku)
        .bind(variant.price)
        .bind(i64::from(variant.stock_level))
        .execute(self.pool())
        .await
        .map_err(|err| DatabaseError::from_write(err, "variant sku"))?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("product variant {}", variant.id)));
        }
        Ok(())
    }
}
