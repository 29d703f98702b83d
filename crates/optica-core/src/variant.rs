//! Purchasable optical variants and the request shapes that produce them.
//!
//! A variant has no surrogate key. Its identity is the normalized
//! `(sphere, cylinder, axis, addition, addition_label)` tuple, see
//! [`crate::VariantSignature`].

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::lenient;
use crate::lens::Availability;

/// A variant as stored in the attribute document.
///
/// Deserialization is tolerant: unreadable numbers become `None`, an unknown
/// or missing availability reads as `unavailable`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub sphere: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub cylinder: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::axis")]
    pub axis: Option<i32>,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub addition: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub addition_label: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub ean: Option<String>,
    #[serde(
        default = "lenient::unavailable",
        deserialize_with = "lenient::availability"
    )]
    pub availability: Availability,
    #[serde(default, deserialize_with = "lenient::quantity")]
    pub quantity: u32,
}

impl Variant {
    /// Freshly generated stock: `preorder`, zero quantity, no EAN override.
    #[must_use]
    pub fn generated(
        sphere: Decimal,
        cylinder: Option<Decimal>,
        axis: Option<i32>,
        addition: Option<Decimal>,
        addition_label: Option<String>,
    ) -> Self {
        Self {
            sphere: Some(sphere),
            cylinder,
            axis,
            addition,
            addition_label,
            ean: None,
            availability: Availability::Preorder,
            quantity: 0,
        }
    }

    #[must_use]
    pub fn is_stocked(&self) -> bool {
        self.availability == Availability::InStock && self.quantity > 0
    }
}

/// Body of a single-variant create. Optical fields not used by the lens
/// family are discarded by [`crate::prepare_variant`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewVariant {
    pub sphere: Decimal,
    pub cylinder: Option<Decimal>,
    pub axis: Option<i32>,
    pub addition: Option<Decimal>,
    pub addition_label: Option<String>,
    pub ean: Option<String>,
    #[serde(default)]
    pub availability: Availability,
    #[serde(default)]
    pub quantity: u32,
}

/// One entry of a bulk replacement. Every optical field is optional so
/// callers can round-trip whatever the stored list holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantDraft {
    pub sphere: Option<Decimal>,
    pub cylinder: Option<Decimal>,
    pub axis: Option<i32>,
    pub addition: Option<Decimal>,
    pub addition_label: Option<String>,
    pub ean: Option<String>,
    #[serde(default)]
    pub availability: Availability,
    #[serde(default)]
    pub quantity: u32,
}

impl From<VariantDraft> for Variant {
    fn from(draft: VariantDraft) -> Self {
        Self {
            sphere: draft.sphere,
            cylinder: draft.cylinder,
            axis: draft.axis,
            addition: draft.addition,
            addition_label: trim_label(draft.addition_label),
            ean: draft.ean,
            availability: draft.availability,
            quantity: draft.quantity,
        }
    }
}

/// Optical parameters identifying one variant, used to address deletes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantKey {
    pub sphere: Option<Decimal>,
    pub cylinder: Option<Decimal>,
    pub axis: Option<i32>,
    pub addition: Option<Decimal>,
    pub addition_label: Option<String>,
}

/// Trims a label; blank labels become `None`.
pub(crate) fn trim_label(label: Option<String>) -> Option<String> {
    label
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
}
