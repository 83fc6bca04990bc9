//! Store catalog.
//!
//! A product is a display grouping; shoppers buy a [`ProductVariant`], which
//! carries the SKU, the price and the stock level. SKUs and product slugs are
//! unique within a tenant.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{TenantScope, Timestamps};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductVariant {
    pub id: Uuid,
    pub product_id: Uuid,
    pub name: String,
    pub sku: String,
    pub price: Decimal,
    pub stock_level: u32,
    #[serde(flatten)]
    pub scope: TenantScope,
}

impl ProductVariant {
    pub fn new(
        product: &Product,
        name: impl Into<String>,
        sku: impl Into<String>,
        price: Decimal,
        stock_level: u32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            product_id: product.id,
            name: name.into(),
            sku: sku.into(),
            price,
            stock_level,
            scope: product.scope,
        }
    }

    pub fn in_stock(&self, quantity: u32) -> bool {
        self.stock_level >= quantity
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub active: bool,
    pub variants: Vec<ProductVariant>,
    #[serde(flatten)]
    pub scope: TenantScope,
    #[serde(flatten)]
    pub timestamps: Timestamps,
}

impl Product {
    pub fn new(
        tenant_id: Uuid,
        name: impl Into<String>,
        slug: impl Into<String>,
        description: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            slug: slug.into(),
            description,
            active: true,
            variants: Vec::new(),
            scope: TenantScope::new(tenant_id),
            timestamps: Timestamps::now(),
        }
    }

    pub fn variant(&self, id: Uuid) -> Option<&ProductVariant> {
        self.variants.iter().find(|v| v.id == id)
    }

    /// "Product / Variant", or just the product name for a default variant.
    pub fn display_name(&self, variant: &ProductVariant) -> String {
        if variant.name.is_empty() || variant.name == self.name {
            self.name.clone()
        } else {
            format!("{} / {}", self.name, variant.name)
        }
    }
}
