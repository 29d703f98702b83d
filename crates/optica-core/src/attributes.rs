//! Typed view over a product's JSON attribute document.
//!
//! The document is shared with other subsystems. Lens-owned keys are read
//! into [`LensAttributes`]; everything else is kept verbatim in
//! [`AttributeDocument::extra`] and never rewritten by this crate.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::availability::{aggregate_availability, ProductAvailability};
use crate::lenient;
use crate::lens::{AdditionScheme, Availability, LensPayload, LensType};
use crate::variant::Variant;
use crate::LensError;

pub const CONTACT_LENS_PRODUCT_TYPE: &str = "contact_lens";

/// Lens-owned keys of the attribute document.
///
/// Enum-like values stay strings here: documents may carry values written by
/// older code, and they are only parsed when an operation needs them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LensAttributes {
    #[serde(default, deserialize_with = "lenient::string")]
    pub product_type: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub brand_label: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub lens_family: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub duration: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub lens_type: Option<String>,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub bc: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub diameter: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub sph_min: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub sph_max: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub cyl_min: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub cyl_max: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub addition_scheme: Option<String>,
    #[serde(default, deserialize_with = "lenient::variants")]
    pub variants: Vec<Variant>,
    #[serde(default, deserialize_with = "lenient::optional_availability")]
    pub availability: Option<Availability>,
}

impl LensAttributes {
    pub const KEYS: [&'static str; 14] = [
        "product_type",
        "brand_label",
        "lens_family",
        "duration",
        "lens_type",
        "bc",
        "diameter",
        "sph_min",
        "sph_max",
        "cyl_min",
        "cyl_max",
        "addition_scheme",
        "variants",
        "availability",
    ];

    /// Copies classification and ranges from a payload. Absent optional
    /// inputs become null so ranges from a previous lens type do not linger.
    pub fn apply_payload(&mut self, payload: &LensPayload) {
        self.product_type = Some(CONTACT_LENS_PRODUCT_TYPE.to_string());
        self.brand_label.clone_from(&payload.brand);
        self.lens_family = Some(payload.family.as_str().to_string());
        self.duration = Some(payload.duration.as_str().to_string());
        self.lens_type = Some(payload.lens_type.as_str().to_string());
        self.bc = payload.bc;
        self.diameter = payload.diameter;
        self.sph_min = payload.sph_min;
        self.sph_max = payload.sph_max;
        self.cyl_min = payload.cyl_min;
        self.cyl_max = payload.cyl_max;
        self.addition_scheme = payload.addition_scheme.map(|s| s.as_str().to_string());
    }

    /// Replaces the variant list and recomputes the derived availability.
    pub fn set_variants(&mut self, variants: Vec<Variant>) -> ProductAvailability {
        let aggregate = aggregate_availability(&variants);
        self.variants = variants;
        self.availability = Some(aggregate.availability);
        aggregate
    }

    /// Recomputes availability after an in-place edit of `variants`.
    pub fn refresh_availability(&mut self) -> ProductAvailability {
        let aggregate = aggregate_availability(&self.variants);
        self.availability = Some(aggregate.availability);
        aggregate
    }

    /// # Errors
    ///
    /// [`LensError::InvalidLensSpec`] when the document has no lens type,
    /// [`LensError::UnsupportedLensType`] when it holds an unknown one.
    pub fn lens_type(&self) -> Result<LensType, LensError> {
        self.lens_type
            .as_deref()
            .ok_or_else(|| LensError::invalid("lens type unspecified for this product"))?
            .parse()
    }

    /// The stored scheme, if it is one this crate knows.
    #[must_use]
    pub fn addition_scheme(&self) -> Option<AdditionScheme> {
        self.addition_scheme.as_deref().and_then(|s| s.parse().ok())
    }

    #[must_use]
    pub fn is_contact_lens(&self) -> bool {
        self.product_type.as_deref() == Some(CONTACT_LENS_PRODUCT_TYPE)
    }
}

/// The whole attribute document: typed lens keys plus opaque extras.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeDocument {
    pub lens: LensAttributes,
    pub extra: Map<String, Value>,
}

impl AttributeDocument {
    /// Splits a stored document. Unreadable lens values read as null.
    #[must_use]
    pub fn from_map(mut map: Map<String, Value>) -> Self {
        let mut lens_map = Map::new();
        for key in LensAttributes::KEYS {
            if let Some(value) = map.remove(key) {
                lens_map.insert(key.to_string(), value);
            }
        }
        // Every field reader is lenient, so this only falls back on a
        // structurally impossible input.
        let lens = serde_json::from_value(Value::Object(lens_map)).unwrap_or_default();
        Self { lens, extra: map }
    }

    /// Reads any JSON value; non-objects are treated as an empty document.
    #[must_use]
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => Self::from_map(map),
            _ => Self::default(),
        }
    }

    /// Every lens-owned key, to be merged over the stored document. The
    /// record is always stamped as a contact lens.
    #[must_use]
    pub fn lens_patch(&self) -> Map<String, Value> {
        let l = &self.lens;
        let mut patch = Map::with_capacity(LensAttributes::KEYS.len());
        patch.insert("brand_label".into(), json!(l.brand_label));
        patch.insert("lens_family".into(), json!(l.lens_family));
        patch.insert("duration".into(), json!(l.duration));
        patch.insert("lens_type".into(), json!(l.lens_type));
        patch.insert("bc".into(), json!(l.bc));
        patch.insert("diameter".into(), json!(l.diameter));
        patch.insert("sph_min".into(), json!(l.sph_min));
        patch.insert("sph_max".into(), json!(l.sph_max));
        patch.insert("cyl_min".into(), json!(l.cyl_min));
        patch.insert("cyl_max".into(), json!(l.cyl_max));
        patch.insert("addition_scheme".into(), json!(l.addition_scheme));
        patch.extend(self.variants_patch());
        patch
    }

    /// `product_type`, `variants` and `availability` only, for single-variant
    /// and bulk edits that leave the rest of the lens description untouched.
    /// Writing `product_type` upgrades legacy records on first edit.
    #[must_use]
    pub fn variants_patch(&self) -> Map<String, Value> {
        let mut patch = Map::with_capacity(3);
        patch.insert(
            "product_type".into(),
            json!(CONTACT_LENS_PRODUCT_TYPE),
        );
        patch.insert("variants".into(), json!(self.lens.variants));
        patch.insert("availability".into(), json!(self.lens.availability));
        patch
    }

    /// Full document as it would be stored: extras overlaid with the patch.
    #[must_use]
    pub fn to_map(&self) -> Map<String, Value> {
        let mut map = self.extra.clone();
        merge_document(&mut map, self.lens_patch());
        map
    }
}

/// Top-level key merge: keys in `patch` overwrite, every other key survives.
pub fn merge_document(base: &mut Map<String, Value>, patch: Map<String, Value>) {
    for (key, value) in patch {
        base.insert(key, value);
    }
}
