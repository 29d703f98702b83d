//! In-process [`ProductStore`] for tests and offline tooling.
//!
//! Mirrors the Postgres semantics: unique SKUs, version-guarded writes, and a
//! top-level key merge of attribute patches.

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use optica_core::{merge_document, ProductDraft, ProductRecord};
use serde_json::{Map, Value};
use tokio::sync::Mutex;

use crate::{ProductStore, StoreError};

#[derive(Debug, Default)]
struct Rows {
    next_id: i64,
    products: Vec<ProductRecord>,
}

#[derive(Debug, Default)]
pub struct MemoryProductStore {
    rows: Mutex<Rows>,
    offline: AtomicBool,
}

impl MemoryProductStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every later call fail with [`StoreError::Unavailable`].
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Inserts a row with an arbitrary attribute document, bypassing the
    /// catalog. Used to stage records written by other subsystems.
    pub async fn seed(&self, draft: &ProductDraft, attributes: Map<String, Value>) -> ProductRecord {
        let mut rows = self.rows.lock().await;
        let record = new_record(&mut rows, draft, attributes);
        rows.products.push(record.clone());
        record
    }

    /// Snapshot of one row regardless of type, for assertions.
    pub async fn get(&self, sku: &str) -> Option<ProductRecord> {
        let rows = self.rows.lock().await;
        rows.products.iter().find(|p| p.sku == sku).cloned()
    }

    fn check_online(&self) -> Result<(), StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store is offline".to_string()));
        }
        Ok(())
    }
}

fn new_record(rows: &mut Rows, draft: &ProductDraft, attributes: Map<String, Value>) -> ProductRecord {
    rows.next_id += 1;
    let now = Utc::now();
    ProductRecord {
        id: rows.next_id,
        sku: draft.sku.clone(),
        ean: draft.ean.clone(),
        slug: draft.slug.clone(),
        title_el: draft.title_el.clone(),
        title_en: draft.title_en.clone(),
        description: draft.description.clone(),
        images: draft.images.clone(),
        price: draft.price,
        compare_at_price: draft.compare_at_price,
        stock: draft.stock,
        status: draft.status.clone(),
        visible: draft.visible,
        version: 1,
        attributes,
        created_at: now,
        updated_at: now,
    }
}

fn product_type(record: &ProductRecord) -> Option<&str> {
    record.attributes.get("product_type").and_then(Value::as_str)
}

#[async_trait::async_trait]
impl ProductStore for MemoryProductStore {
    async fn find_by_sku(
        &self,
        sku: &str,
        wanted_type: Option<&str>,
    ) -> Result<Option<ProductRecord>, StoreError> {
        self.check_online()?;
        let rows = self.rows.lock().await;
        Ok(rows
            .products
            .iter()
            .find(|p| p.sku == sku && wanted_type.is_none_or(|t| product_type(p) == Some(t)))
            .cloned())
    }

    async fn list_by_type(
        &self,
        wanted_type: &str,
        availability: Option<&str>,
    ) -> Result<Vec<ProductRecord>, StoreError> {
        self.check_online()?;
        let rows = self.rows.lock().await;
        let mut matched: Vec<ProductRecord> = rows
            .products
            .iter()
            .filter(|p| product_type(p) == Some(wanted_type))
            .filter(|p| {
                availability.is_none_or(|a| {
                    p.attributes.get("availability").and_then(Value::as_str) == Some(a)
                })
            })
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(b.id.cmp(&a.id)));
        Ok(matched)
    }

    async fn insert(
        &self,
        draft: &ProductDraft,
        attributes: &Map<String, Value>,
    ) -> Result<Option<ProductRecord>, StoreError> {
        self.check_online()?;
        let mut rows = self.rows.lock().await;
        if rows.products.iter().any(|p| p.sku == draft.sku) {
            return Ok(None);
        }
        let record = new_record(&mut rows, draft, attributes.clone());
        rows.products.push(record.clone());
        Ok(Some(record))
    }

    async fn update(
        &self,
        id: i64,
        expected_version: i32,
        draft: &ProductDraft,
        patch: &Map<String, Value>,
    ) -> Result<Option<ProductRecord>, StoreError> {
        self.check_online()?;
        let mut rows = self.rows.lock().await;
        let Some(row) = rows
            .products
            .iter_mut()
            .find(|p| p.id == id && p.version == expected_version)
        else {
            return Ok(None);
        };

        row.ean.clone_from(&draft.ean);
        row.slug.clone_from(&draft.slug);
        row.title_el.clone_from(&draft.title_el);
        row.title_en.clone_from(&draft.title_en);
        row.description.clone_from(&draft.description);
        row.images.clone_from(&draft.images);
        row.price = draft.price;
        row.compare_at_price = draft.compare_at_price;
        row.stock = draft.stock;
        row.status.clone_from(&draft.status);
        row.visible = draft.visible;
        merge_document(&mut row.attributes, patch.clone());
        row.version += 1;
        row.updated_at = Utc::now();
        Ok(Some(row.clone()))
    }

    async fn delete(&self, id: i64, expected_version: i32) -> Result<bool, StoreError> {
        self.check_online()?;
        let mut rows = self.rows.lock().await;
        let before = rows.products.len();
        rows.products
            .retain(|p| !(p.id == id && p.version == expected_version));
        Ok(rows.products.len() < before)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.check_online()
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use serde_json::json;

    use super::*;

    fn draft(sku: &str) -> ProductDraft {
        ProductDraft {
            sku: sku.to_string(),
            ean: None,
            slug: sku.to_lowercase(),
            title_el: "Lens".to_string(),
            title_en: "Lens".to_string(),
            description: None,
            images: Vec::new(),
            price: Decimal::new(1990, 2),
            compare_at_price: None,
            stock: 0,
            status: "preorder".to_string(),
            visible: true,
        }
    }

    fn attrs(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    #[tokio::test]
    async fn insert_rejects_taken_sku() {
        let store = MemoryProductStore::new();
        let first = store.insert(&draft("A"), &Map::new()).await.unwrap();
        assert_eq!(first.map(|r| r.version), Some(1));
        assert!(store.insert(&draft("A"), &Map::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_merges_patch_and_bumps_version() {
        let store = MemoryProductStore::new();
        let base = attrs(json!({"product_type": "contact_lens", "seo": {"k": 1}}));
        let row = store.insert(&draft("A"), &base).await.unwrap().unwrap();

        let patch = attrs(json!({"availability": "in_stock"}));
        let updated = store
            .update(row.id, 1, &draft("A"), &patch)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.version, 2);
        assert_eq!(updated.attributes["seo"], json!({"k": 1}));
        assert_eq!(updated.attributes["availability"], json!("in_stock"));
    }

    #[tokio::test]
    async fn stale_update_and_delete_are_refused() {
        let store = MemoryProductStore::new();
        let row = store.insert(&draft("A"), &Map::new()).await.unwrap().unwrap();
        store.update(row.id, 1, &draft("A"), &Map::new()).await.unwrap();

        assert!(store.update(row.id, 1, &draft("A"), &Map::new()).await.unwrap().is_none());
        assert!(!store.delete(row.id, 1).await.unwrap());
        assert!(store.delete(row.id, 2).await.unwrap());
        assert!(store.get("A").await.is_none());
    }

    #[tokio::test]
    async fn find_filters_by_product_type() {
        let store = MemoryProductStore::new();
        store.seed(&draft("LEGACY"), Map::new()).await;
        assert!(store
            .find_by_sku("LEGACY", Some("contact_lens"))
            .await
            .unwrap()
            .is_none());
        assert!(store.find_by_sku("LEGACY", None).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn offline_store_fails_every_call() {
        let store = MemoryProductStore::new();
        store.set_offline(true);
        assert!(matches!(store.ping().await, Err(StoreError::Unavailable(_))));
        assert!(store.find_by_sku("A", None).await.is_err());
    }
}
