//! Store catalog management.

use std::collections::HashSet;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use super::error::{ServiceError, ServiceResult};
use super::validation::{is_valid_amount, is_valid_slug, FieldErrors};
use crate::database::ProductStore;
use crate::models::{Product, ProductVariant};

const PRICE_MESSAGE: &str = "Price must be between 0 and 1000000000 with at most 2 decimal places";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantInput {
    pub name: Option<String>,
    pub sku: String,
    pub price: Decimal,
    #[serde(default)]
    pub stock_level: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub active: Option<bool>,
    #[serde(default)]
    pub variants: Vec<VariantInput>,
}

/// Product fields a merchant may change after creation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductChanges {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub active: Option<bool>,
}

/// Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantChanges {
    pub name: Option<String>,
    pub price: Option<Decimal>,
    pub stock_level: Option<u32>,
}

fn clean(text: Option<String>) -> Option<String> {
    text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())
}

#[derive(Clone)]
pub struct ProductService {
    products: Arc<dyn ProductStore>,
}

impl ProductService {
    pub fn new(products: Arc<dyn ProductStore>) -> Self {
        Self { products }
    }

    /// Create a product with at least one variant. Slug and SKUs must be
    /// unused in the store.
    pub async fn create_product(&self, tenant_id: Uuid, input: ProductInput) -> ServiceResult<Product> {
        let slug = input.slug.trim().to_ascii_lowercase();
        let mut errors = FieldErrors::new();
        errors
            .require(&input.name, "name")
            .check(
                is_valid_slug(&slug),
                "slug",
                "Slug may only contain lower-case letters, digits and hyphens",
            )
            .check(!input.variants.is_empty(), "variants", "At least one variant is required");

        let mut seen = HashSet::new();
        for (i, variant) in input.variants.iter().enumerate() {
            let sku = variant.sku.trim();
            errors
                .require(sku, &format!("variants[{}].sku", i))
                .check(is_valid_amount(variant.price), &format!("variants[{}].price", i), PRICE_MESSAGE)
                .check(
                    seen.insert(sku.to_string()),
                    &format!("variants[{}].sku", i),
                    "SKU is repeated in this request",
                );
        }
        errors.finish()?;

        if self.products.find_by_slug(tenant_id, &slug).await?.is_some() {
            return Err(ServiceError::duplicate(format!(
                "Product with slug '{}' already exists",
                slug
            )));
        }
        for variant in &input.variants {
            let sku = variant.sku.trim();
            if self.products.find_variant_by_sku(tenant_id, sku).await?.is_some() {
                return Err(ServiceError::duplicate(format!(
                    "Variant with SKU '{}' already exists",
                    sku
                )));
            }
        }

        let name = input.name.trim().to_string();
        let mut product = Product::new(tenant_id, name.clone(), slug, clean(input.description));
        product.active = input.active.unwrap_or(true);
        product.variants = input
            .variants
            .into_iter()
            .map(|v| {
                let variant_name = clean(v.name).unwrap_or_else(|| name.clone());
                ProductVariant::new(&product, variant_name, v.sku.trim(), v.price, v.stock_level)
            })
            .collect();

        self.products.insert(&product).await?;
        tracing::info!(
            product_id = %product.id,
            %tenant_id,
            variants = product.variants.len(),
            "product created"
        );
        Ok(product)
    }

    pub async fn update_product(&self, tenant_id: Uuid, id: Uuid, changes: ProductChanges) -> ServiceResult<Product> {
        let slug = changes.slug.trim().to_ascii_lowercase();
        let mut errors = FieldErrors::new();
        errors.require(&changes.name, "name").check(
            is_valid_slug(&slug),
            "slug",
            "Slug may only contain lower-case letters, digits and hyphens",
        );
        errors.finish()?;

        let mut product = self.get_product(tenant_id, id).await?;
        if product.slug != slug && self.products.find_by_slug(tenant_id, &slug).await?.is_some() {
            return Err(ServiceError::duplicate(format!(
                "Product with slug '{}' already exists",
                slug
            )));
        }

        product.name = changes.name.trim().to_string();
        product.slug = slug;
        product.description = clean(changes.description);
        if let Some(active) = changes.active {
            product.active = active;
        }
        product.timestamps.touch();

        self.products.update(&product).await?;
        Ok(product)
    }

    /// Re-price, rename or restock one variant.
    pub async fn update_variant(
        &self,
        tenant_id: Uuid,
        product_id: Uuid,
        variant_id: Uuid,
        changes: VariantChanges,
    ) -> ServiceResult<ProductVariant> {
        if let Some(price) = changes.price {
            let mut errors = FieldErrors::new();
            errors.check(is_valid_amount(price), "price", PRICE_MESSAGE);
            errors.finish()?;
        }

        let mut variant = self
            .products
            .find_variant(tenant_id, variant_id)
            .await?
            .filter(|v| v.product_id == product_id)
            .ok_or_else(|| ServiceError::not_found(format!("Product variant not found with id: {}", variant_id)))?;

        if let Some(name) = clean(changes.name) {
            variant.name = name;
        }
        if let Some(price) = changes.price {
            variant.price = price;
        }
        if let Some(stock_level) = changes.stock_level {
            variant.stock_level = stock_level;
        }

        self.products.update_variant(&variant).await?;
        tracing::info!(variant_id = %variant.id, sku = %variant.sku, stock = variant.stock_level, "variant updated");
        Ok(variant)
    }

    pub async fn get_product(&self, tenant_id: Uuid, id: Uuid) -> ServiceResult<Product> {
        self.products
            .find_by_id(tenant_id, id)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("Product not found with id: {}", id)))
    }

    pub async fn get_product_by_slug(&self, tenant_id: Uuid, slug: &str) -> ServiceResult<Product> {
        self.products
            .find_by_slug(tenant_id, slug)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("Product not found with slug: {}", slug)))
    }

    pub async fn list_products(&self, tenant_id: Uuid, active_only: bool) -> ServiceResult<Vec<Product>> {
        Ok(self.products.list(tenant_id, active_only).await?)
    }

    /// Past orders keep their copied lines; open carts that still point at
    /// the product fail at checkout.
    pub async fn delete_product(&self, tenant_id: Uuid, id: Uuid) -> ServiceResult<()> {
        self.products.delete(tenant_id, id).await.map_err(|err| match ServiceError::from(err) {
            ServiceError::NotFound(_) => ServiceError::not_found(format!("Product not found with id: {}", id)),
            other => other,
        })?;
        tracing::info!(product_id = %id, %tenant_id, "product deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Stores;

    fn mug() -> ProductInput {
        ProductInput {
            name: "Mug".into(),
            slug: "mug".into(),
            description: Some("  ".into()),
            active: None,
            variants: vec![
                VariantInput {
                    name: Some("Small".into()),
                    sku: "MUG-S".into(),
                    price: Decimal::new(1000, 2),
                    stock_level: 5,
                },
                VariantInput {
                    name: None,
                    sku: "MUG-L".into(),
                    price: Decimal::new(1250, 2),
                    stock_level: 2,
                },
            ],
        }
    }

    fn service() -> ProductService {
        ProductService::new(Stores::memory().products)
    }

    #[tokio::test]
    async fn create_and_find() {
        let service = service();
        let tenant = Uuid::new_v4();
        let product = service.create_product(tenant, mug()).await.unwrap();
        assert_eq!(product.variants.len(), 2);
        assert_eq!(product.description, None);
        assert_eq!(product.variants[1].name, "Mug");

        assert_eq!(service.get_product_by_slug(tenant, "mug").await.unwrap().id, product.id);
        assert!(matches!(
            service.get_product(Uuid::new_v4(), product.id).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn slug_and_sku_are_unique_per_store() {
        let service = service();
        let tenant = Uuid::new_v4();
        service.create_product(tenant, mug()).await.unwrap();

        assert!(matches!(
            service.create_product(tenant, mug()).await,
            Err(ServiceError::Duplicate(ref m)) if m.contains("slug")
        ));

        let same_sku = ProductInput { slug: "mug-2".into(), ..mug() };
        assert!(matches!(
            service.create_product(tenant, same_sku).await,
            Err(ServiceError::Duplicate(ref m)) if m.contains("MUG-S")
        ));

        service.create_product(Uuid::new_v4(), mug()).await.unwrap();
    }

    #[tokio::test]
    async fn prices_must_be_money() {
        let mut input = mug();
        input.variants[0].price = Decimal::new(-1, 0);
        input.variants[1].price = Decimal::new(10_001, 3);
        match service().create_product(Uuid::new_v4(), input).await {
            Err(ServiceError::Validation { field_errors, .. }) => {
                assert!(field_errors.contains_key("variants[0].price"));
                assert!(field_errors.contains_key("variants[1].price"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn restock_and_reprice() {
        let service = service();
        let tenant = Uuid::new_v4();
        let product = service.create_product(tenant, mug()).await.unwrap();
        let variant = &product.variants[0];

        let updated = service
            .update_variant(
                tenant,
                product.id,
                variant.id,
                VariantChanges {
                    price: Some(Decimal::new(900, 2)),
                    stock_level: Some(40),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.price, Decimal::new(900, 2));
        assert_eq!(updated.stock_level, 40);
        assert_eq!(updated.name, "Small");

        assert!(matches!(
            service
                .update_variant(tenant, Uuid::new_v4(), variant.id, VariantChanges::default())
                .await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn deactivated_products_drop_out_of_the_active_list() {
        let service = service();
        let tenant = Uuid::new_v4();
        let product = service.create_product(tenant, mug()).await.unwrap();
        service
            .update_product(
                tenant,
                product.id,
                ProductChanges {
                    name: "Mug".into(),
                    slug: "mug".into(),
                    description: None,
                    active: Some(false),
                },
            )
            .await
            .unwrap();

        assert!(service.list_products(tenant, true).await.unwrap().is_empty());
        assert_eq!(service.list_products(tenant, false).await.unwrap().len(), 1);

        service.delete_product(tenant, product.id).await.unwrap();
        assert!(matches!(
            service.delete_product(tenant, product.id).await,
            Err(ServiceError::NotFound(_))
        ));
    }
}
