//! Product catalog: base products and their live list price.

use std::sync::Arc;

use chrono::Utc;

use printshop_core::{AggregateId, Money, TenantId};
use printshop_events::execute;
use printshop_products::{
    ArchiveProduct, ChangeListPrice, CreateProduct, Product, ProductCommand, ProductId,
};

use crate::lookup::LookupError;
use crate::read_model::{InMemoryTenantStore, TenantStore};

/// Read access to products. Prices are read on demand and never cached by
/// the order side.
pub trait ProductCatalog: Send + Sync {
    fn product(&self, tenant_id: TenantId, product_id: ProductId) -> Result<Product, LookupError>;

    fn list_price(&self, tenant_id: TenantId, product_id: ProductId) -> Result<Money, LookupError> {
        Ok(self.product(tenant_id, product_id)?.list_price())
    }
}

impl<C> ProductCatalog for Arc<C>
where
    C: ProductCatalog + ?Sized,
{
    fn product(&self, tenant_id: TenantId, product_id: ProductId) -> Result<Product, LookupError> {
        (**self).product(tenant_id, product_id)
    }

    fn list_price(&self, tenant_id: TenantId, product_id: ProductId) -> Result<Money, LookupError> {
        (**self).list_price(tenant_id, product_id)
    }
}

/// In-memory catalog for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryProductCatalog {
    products: InMemoryTenantStore<ProductId, Product>,
}

impl InMemoryProductCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(
        &self,
        tenant_id: TenantId,
        sku: impl Into<String>,
        name: impl Into<String>,
        list_price: Money,
    ) -> Result<Product, LookupError> {
        let product_id = ProductId::new(AggregateId::new());
        let mut product = Product::empty(product_id);
        execute(
            &mut product,
            &ProductCommand::CreateProduct(CreateProduct {
                tenant_id,
                product_id,
                sku: sku.into(),
                name: name.into(),
                list_price,
                occurred_at: Utc::now(),
            }),
        )?;

        self.products.upsert(tenant_id, product_id, product.clone())?;
        Ok(product)
    }

    /// Change a product's list price. Orders pick the new price up on their
    /// next recompute (see `OrderService::reprice_product`).
    pub fn set_list_price(
        &self,
        tenant_id: TenantId,
        product_id: ProductId,
        list_price: Money,
    ) -> Result<Product, LookupError> {
        self.update(tenant_id, product_id, |product_id| {
            ProductCommand::ChangeListPrice(ChangeListPrice {
                tenant_id,
                product_id,
                list_price,
                occurred_at: Utc::now(),
            })
        })
    }

    pub fn archive(&self, tenant_id: TenantId, product_id: ProductId) -> Result<Product, LookupError> {
        self.update(tenant_id, product_id, |product_id| {
            ProductCommand::ArchiveProduct(ArchiveProduct {
                tenant_id,
                product_id,
                occurred_at: Utc::now(),
            })
        })
    }

    fn update(
        &self,
        tenant_id: TenantId,
        product_id: ProductId,
        command: impl FnOnce(ProductId) -> ProductCommand,
    ) -> Result<Product, LookupError> {
        let mut product = self.product(tenant_id, product_id)?;
        execute(&mut product, &command(product_id))?;
        self.products.upsert(tenant_id, product_id, product.clone())?;
        Ok(product)
    }
}

impl ProductCatalog for InMemoryProductCatalog {
    fn product(&self, tenant_id: TenantId, product_id: ProductId) -> Result<Product, LookupError> {
        self.products
            .get(tenant_id, &product_id)
            .ok_or_else(|| LookupError::not_found("product", product_id))
    }
}
