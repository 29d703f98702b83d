//! Loads and saves lens records on top of a [`ProductStore`].

use std::sync::Arc;

use optica_core::{AttributeDocument, LensRecord, ProductDraft, CONTACT_LENS_PRODUCT_TYPE};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::{CatalogError, ProductStore, StoreError};

#[derive(Clone)]
pub struct CatalogRepository {
    store: Arc<dyn ProductStore>,
}

impl CatalogRepository {
    #[must_use]
    pub fn new(store: Arc<dyn ProductStore>) -> Self {
        Self { store }
    }

    /// Loads a lens by SKU. Prefers a record typed `contact_lens`, then falls
    /// back to any product with that SKU, which covers records written before
    /// `product_type` existed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store fails.
    pub async fn load(&self, sku: &str) -> Result<Option<LensRecord>, StoreError> {
        if let Some(record) = self.load_typed(sku).await? {
            return Ok(Some(record));
        }
        let legacy = self.store.find_by_sku(sku, None).await?;
        if legacy.is_some() {
            debug!(sku, "loaded untyped product through legacy fallback");
        }
        Ok(legacy.map(LensRecord::from_record))
    }

    /// Loads only a record explicitly typed `contact_lens`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store fails.
    pub async fn load_typed(&self, sku: &str) -> Result<Option<LensRecord>, StoreError> {
        let record = self
            .store
            .find_by_sku(sku, Some(CONTACT_LENS_PRODUCT_TYPE))
            .await?;
        Ok(record.map(LensRecord::from_record))
    }

    /// # Errors
    ///
    /// Returns [`StoreError`] if the store fails.
    pub async fn list(&self, available_only: bool) -> Result<Vec<LensRecord>, StoreError> {
        let availability = available_only.then_some("in_stock");
        let rows = self
            .store
            .list_by_type(CONTACT_LENS_PRODUCT_TYPE, availability)
            .await?;
        Ok(rows.into_iter().map(LensRecord::from_record).collect())
    }

    /// Inserts a new lens at version 1.
    ///
    /// # Errors
    ///
    /// [`CatalogError::VersionConflict`] (expected 0) when another writer took
    /// the SKU first, [`CatalogError::Store`] on store failure.
    pub async fn create(
        &self,
        draft: &ProductDraft,
        document: &AttributeDocument,
    ) -> Result<LensRecord, CatalogError> {
        match self.store.insert(draft, &document.to_map()).await? {
            Some(record) => Ok(LensRecord::from_record(record)),
            None => {
                let actual = self
                    .store
                    .find_by_sku(&draft.sku, None)
                    .await?
                    .map_or(0, |p| p.version);
                warn!(sku = %draft.sku, actual, "sku taken by concurrent create");
                Err(CatalogError::VersionConflict {
                    expected: 0,
                    actual,
                })
            }
        }
    }

    /// Writes `draft` and merges `patch` into the attribute document, guarded
    /// by the version `current` was loaded at.
    ///
    /// # Errors
    ///
    /// [`CatalogError::VersionConflict`] when the row moved since it was
    /// loaded, [`CatalogError::LensNotFound`] when it disappeared,
    /// [`CatalogError::Store`] on store failure.
    pub async fn save(
        &self,
        current: &LensRecord,
        draft: &ProductDraft,
        patch: &Map<String, Value>,
    ) -> Result<LensRecord, CatalogError> {
        let product = &current.product;
        if patch.contains_key("variants") {
            let lossy = current.lossy_variant_entries();
            if lossy > 0 {
                warn!(
                    sku = %product.sku,
                    lossy,
                    "rewriting variant list drops unreadable stored entries"
                );
            }
        }
        match self
            .store
            .update(product.id, product.version, draft, patch)
            .await?
        {
            Some(record) => Ok(LensRecord::from_record(record)),
            None => Err(self.lost_race(&product.sku, product.version).await),
        }
    }

    /// Removes the whole product row, guarded by its loaded version.
    ///
    /// # Errors
    ///
    /// Same as [`Self::save`].
    pub async fn delete(&self, current: &LensRecord) -> Result<(), CatalogError> {
        let product = &current.product;
        if self.store.delete(product.id, product.version).await? {
            Ok(())
        } else {
            Err(self.lost_race(&product.sku, product.version).await)
        }
    }

    /// # Errors
    ///
    /// Returns [`StoreError`] if the store is unreachable.
    pub async fn ping(&self) -> Result<(), StoreError> {
        self.store.ping().await
    }

    async fn lost_race(&self, sku: &str, expected: i32) -> CatalogError {
        match self.store.find_by_sku(sku, None).await {
            Ok(Some(now)) => {
                warn!(sku, expected, actual = now.version, "concurrent write detected");
                CatalogError::VersionConflict {
                    expected,
                    actual: now.version,
                }
            }
            Ok(None) => CatalogError::LensNotFound(sku.to_string()),
            Err(err) => CatalogError::Store(err),
        }
    }
}
