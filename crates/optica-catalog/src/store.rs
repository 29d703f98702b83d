use optica_core::{ProductDraft, ProductRecord};
use serde_json::{Map, Value};

use crate::StoreError;

/// Persistence for product rows.
///
/// Writes are compare-and-swap on `version`. A lost race is not an error:
/// `insert` returns `None` when the SKU is taken, `update` returns `None` and
/// `delete` returns `false` when the row moved past `expected_version`.
#[async_trait::async_trait]
pub trait ProductStore: Send + Sync {
    /// Live product by SKU, optionally restricted to one
    /// `attributes.product_type`.
    async fn find_by_sku(
        &self,
        sku: &str,
        product_type: Option<&str>,
    ) -> Result<Option<ProductRecord>, StoreError>;

    /// Live products of one type, most recently updated first.
    async fn list_by_type(
        &self,
        product_type: &str,
        availability: Option<&str>,
    ) -> Result<Vec<ProductRecord>, StoreError>;

    async fn insert(
        &self,
        draft: &ProductDraft,
        attributes: &Map<String, Value>,
    ) -> Result<Option<ProductRecord>, StoreError>;

    /// Overwrites base columns, merges `patch` over the stored attributes
    /// key by key, and bumps `version`.
    async fn update(
        &self,
        id: i64,
        expected_version: i32,
        draft: &ProductDraft,
        patch: &Map<String, Value>,
    ) -> Result<Option<ProductRecord>, StoreError>;

    async fn delete(&self, id: i64, expected_version: i32) -> Result<bool, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}
