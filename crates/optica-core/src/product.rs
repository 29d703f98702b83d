//! Base product rows and the lens-specific view over them.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::attributes::AttributeDocument;
use crate::availability::ProductAvailability;
use crate::lens::LensPayload;

/// A persisted product, whatever its type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub id: i64,
    pub sku: String,
    pub ean: Option<String>,
    pub slug: String,
    pub title_el: String,
    pub title_en: String,
    pub description: Option<String>,
    pub images: Vec<String>,
    pub price: Decimal,
    pub compare_at_price: Option<Decimal>,
    pub stock: i32,
    pub status: String,
    pub visible: bool,
    pub version: i32,
    pub attributes: Map<String, Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Base columns to write. Attributes travel separately as a merge patch.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductDraft {
    pub sku: String,
    pub ean: Option<String>,
    pub slug: String,
    pub title_el: String,
    pub title_en: String,
    pub description: Option<String>,
    pub images: Vec<String>,
    pub price: Decimal,
    pub compare_at_price: Option<Decimal>,
    pub stock: i32,
    pub status: String,
    pub visible: bool,
}

impl ProductDraft {
    /// Base columns for a create-or-upsert. On upsert, `existing` supplies the
    /// fallbacks for empty slug/title, the previous EAN when none is given,
    /// and the current stock.
    #[must_use]
    pub fn for_lens(
        payload: &LensPayload,
        existing: Option<&ProductRecord>,
        availability: ProductAvailability,
    ) -> Self {
        let ean = payload
            .ean
            .clone()
            .or_else(|| existing.and_then(|p| p.ean.clone()));
        let stock = existing.map_or(0, |p| p.stock);
        Self::merged(payload, existing, ean, stock, availability)
    }

    /// Base columns for an explicit update. EAN and description are taken
    /// from the payload even when null.
    #[must_use]
    pub fn for_lens_update(
        payload: &LensPayload,
        existing: &ProductRecord,
        availability: ProductAvailability,
    ) -> Self {
        Self::merged(
            payload,
            Some(existing),
            payload.ean.clone(),
            existing.stock,
            availability,
        )
    }

    /// Same row with only the derived status columns changed.
    #[must_use]
    pub fn with_availability(existing: &ProductRecord, availability: ProductAvailability) -> Self {
        Self {
            sku: existing.sku.clone(),
            ean: existing.ean.clone(),
            slug: existing.slug.clone(),
            title_el: existing.title_el.clone(),
            title_en: existing.title_en.clone(),
            description: existing.description.clone(),
            images: existing.images.clone(),
            price: existing.price,
            compare_at_price: existing.compare_at_price,
            stock: existing.stock,
            status: availability.status().to_string(),
            visible: availability.visible,
        }
    }

    fn merged(
        payload: &LensPayload,
        existing: Option<&ProductRecord>,
        ean: Option<String>,
        stock: i32,
        availability: ProductAvailability,
    ) -> Self {
        let keep = |new: &str, old: Option<&String>| -> String {
            match old {
                Some(old) if new.is_empty() => old.clone(),
                _ => new.to_string(),
            }
        };
        Self {
            sku: payload.sku.clone(),
            ean,
            slug: keep(&payload.slug, existing.map(|p| &p.slug)),
            title_el: keep(&payload.title, existing.map(|p| &p.title_el)),
            title_en: keep(&payload.title, existing.map(|p| &p.title_en)),
            description: payload.description.clone(),
            images: payload.image.iter().filter(|i| !i.is_empty()).cloned().collect(),
            price: payload.price,
            compare_at_price: None,
            stock,
            status: availability.status().to_string(),
            visible: availability.visible,
        }
    }
}

/// A product record paired with its parsed attribute document.
#[derive(Debug, Clone, PartialEq)]
pub struct LensRecord {
    pub product: ProductRecord,
    pub document: AttributeDocument,
}

impl LensRecord {
    #[must_use]
    pub fn from_record(product: ProductRecord) -> Self {
        let document = AttributeDocument::from_map(product.attributes.clone());
        Self { product, document }
    }

    /// Stored variant entries the parsed document could not carry over
    /// intact. Rewriting the variant list drops or normalizes them.
    #[must_use]
    pub fn lossy_variant_entries(&self) -> usize {
        crate::lenient::lossy_variant_entries(self.product.attributes.get("variants"))
    }
}
