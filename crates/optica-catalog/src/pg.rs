//! [`ProductStore`] over the `products` table.

use optica_core::{ProductDraft, ProductRecord};
use optica_db::products;
use serde_json::{Map, Value};
use sqlx::PgPool;
use tracing::instrument;

use crate::{ProductStore, StoreError};

#[derive(Debug, Clone)]
pub struct PgProductStore {
    pool: PgPool,
}

impl PgProductStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait::async_trait]
impl ProductStore for PgProductStore {
    #[instrument(skip(self), level = "debug")]
    async fn find_by_sku(
        &self,
        sku: &str,
        product_type: Option<&str>,
    ) -> Result<Option<ProductRecord>, StoreError> {
        let row = match product_type {
            Some(product_type) => {
                products::get_product_by_sku_and_type(&self.pool, sku, product_type).await?
            }
            None => products::get_product_by_sku(&self.pool, sku).await?,
        };
        Ok(row.map(ProductRecord::from))
    }

    #[instrument(skip(self), level = "debug")]
    async fn list_by_type(
        &self,
        product_type: &str,
        availability: Option<&str>,
    ) -> Result<Vec<ProductRecord>, StoreError> {
        let rows = products::list_products_by_type(&self.pool, product_type, availability).await?;
        Ok(rows.into_iter().map(ProductRecord::from).collect())
    }

    #[instrument(skip(self, draft, attributes), fields(sku = %draft.sku), level = "debug")]
    async fn insert(
        &self,
        draft: &ProductDraft,
        attributes: &Map<String, Value>,
    ) -> Result<Option<ProductRecord>, StoreError> {
        let row = products::insert_product(&self.pool, draft, attributes).await?;
        Ok(row.map(ProductRecord::from))
    }

    #[instrument(skip(self, draft, patch), fields(sku = %draft.sku), level = "debug")]
    async fn update(
        &self,
        id: i64,
        expected_version: i32,
        draft: &ProductDraft,
        patch: &Map<String, Value>,
    ) -> Result<Option<ProductRecord>, StoreError> {
        let row =
            products::update_product_if_version(&self.pool, id, expected_version, draft, patch)
                .await?;
        Ok(row.map(ProductRecord::from))
    }

    #[instrument(skip(self), level = "debug")]
    async fn delete(&self, id: i64, expected_version: i32) -> Result<bool, StoreError> {
        Ok(products::delete_product_if_version(&self.pool, id, expected_version).await?)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        optica_db::health_check(&self.pool).await?;
        Ok(())
    }
}
