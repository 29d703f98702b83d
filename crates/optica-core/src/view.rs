//! Read-side shapes returned to admin clients.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::product::LensRecord;
use crate::variant::Variant;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocalizedTitle {
    pub el: String,
    pub en: String,
}

/// Distinct sorted optical values present across a variant list, used by
/// the admin table headers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VariantSummary {
    pub sphere: Vec<Decimal>,
    pub cylinder: Vec<Decimal>,
    pub axis: Vec<i32>,
}

impl VariantSummary {
    #[must_use]
    pub fn of(variants: &[Variant]) -> Self {
        let sphere: BTreeSet<Decimal> = variants.iter().filter_map(|v| v.sphere).collect();
        let cylinder: BTreeSet<Decimal> = variants.iter().filter_map(|v| v.cylinder).collect();
        let axis: BTreeSet<i32> = variants.iter().filter_map(|v| v.axis).collect();
        Self {
            sphere: sphere.into_iter().collect(),
            cylinder: cylinder.into_iter().collect(),
            axis: axis.into_iter().collect(),
        }
    }
}

/// A lens product with its summary; the variants themselves are only counted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LensView {
    pub id: i64,
    pub sku: String,
    pub ean: Option<String>,
    pub slug: String,
    pub title: LocalizedTitle,
    pub brand: Option<String>,
    pub family: Option<String>,
    pub duration: Option<String>,
    pub lens_type: Option<String>,
    pub bc: Option<Decimal>,
    pub diameter: Option<Decimal>,
    pub price: Decimal,
    pub status: String,
    pub availability: String,
    #[serde(flatten)]
    pub summary: VariantSummary,
    pub description: Option<String>,
    pub image: Option<String>,
    pub attributes: Map<String, Value>,
    pub variants_count: usize,
    pub version: i32,
}

impl From<&LensRecord> for LensView {
    fn from(record: &LensRecord) -> Self {
        let p = &record.product;
        let lens = &record.document.lens;
        Self {
            id: p.id,
            sku: p.sku.clone(),
            ean: p.ean.clone(),
            slug: p.slug.clone(),
            title: LocalizedTitle {
                el: p.title_el.clone(),
                en: p.title_en.clone(),
            },
            brand: lens.brand_label.clone(),
            family: lens.lens_family.clone(),
            duration: lens.duration.clone(),
            lens_type: lens.lens_type.clone(),
            bc: lens.bc,
            diameter: lens.diameter,
            price: p.price,
            status: p.status.clone(),
            availability: lens
                .availability
                .map_or_else(|| p.status.clone(), |a| a.as_str().to_string()),
            summary: VariantSummary::of(&lens.variants),
            description: p.description.clone(),
            image: p.images.first().cloned(),
            attributes: p.attributes.clone(),
            variants_count: lens.variants.len(),
            version: p.version,
        }
    }
}

/// Lens header plus every variant in display order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LensVariantsView {
    pub sku: String,
    pub ean: Option<String>,
    pub slug: String,
    pub title: LocalizedTitle,
    pub brand: Option<String>,
    pub family: Option<String>,
    pub duration: Option<String>,
    pub lens_type: Option<String>,
    pub bc: Option<Decimal>,
    pub diameter: Option<Decimal>,
    pub version: i32,
    pub variants: Vec<Variant>,
}

impl From<&LensRecord> for LensVariantsView {
    fn from(record: &LensRecord) -> Self {
        let p = &record.product;
        let lens = &record.document.lens;
        let mut variants = lens.variants.clone();
        sort_variants(&mut variants);
        Self {
            sku: p.sku.clone(),
            ean: p.ean.clone(),
            slug: p.slug.clone(),
            title: LocalizedTitle {
                el: p.title_el.clone(),
                en: p.title_en.clone(),
            },
            brand: lens.brand_label.clone(),
            family: lens.lens_family.clone(),
            duration: lens.duration.clone(),
            lens_type: lens.lens_type.clone(),
            bc: lens.bc,
            diameter: lens.diameter,
            version: p.version,
            variants,
        }
    }
}

/// Orders by sphere, cylinder, axis, then label. Missing values sort as
/// `0`, `0`, `-1` and `""`. The sort is stable.
pub fn sort_variants(variants: &mut [Variant]) {
    variants.sort_by(compare_variants);
}

fn compare_variants(a: &Variant, b: &Variant) -> Ordering {
    let zero = Decimal::ZERO;
    a.sphere
        .unwrap_or(zero)
        .cmp(&b.sphere.unwrap_or(zero))
        .then_with(|| a.cylinder.unwrap_or(zero).cmp(&b.cylinder.unwrap_or(zero)))
        .then_with(|| a.axis.unwrap_or(-1).cmp(&b.axis.unwrap_or(-1)))
        .then_with(|| {
            a.addition_label
                .as_deref()
                .unwrap_or("")
                .cmp(b.addition_label.as_deref().unwrap_or(""))
        })
}
