//! Variant identity by value.
//!
//! Numbers are normalized to a fixed two-decimal string so `1`, `1.0`,
//! `"1.00"` all compare equal; labels are trimmed and blank labels are null.

use std::collections::HashMap;
use std::fmt;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::variant::{NewVariant, Variant, VariantDraft, VariantKey};

/// Access to the optical fields that make up a variant's identity.
pub trait OpticalParams {
    fn sphere(&self) -> Option<Decimal>;
    fn cylinder(&self) -> Option<Decimal>;
    fn axis(&self) -> Option<i32>;
    fn addition(&self) -> Option<Decimal>;
    fn addition_label(&self) -> Option<&str>;
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct VariantSignature {
    sphere: Option<String>,
    cylinder: Option<String>,
    axis: Option<i32>,
    addition: Option<String>,
    addition_label: Option<String>,
}

impl VariantSignature {
    pub fn of<P: OpticalParams + ?Sized>(params: &P) -> Self {
        Self {
            sphere: params.sphere().map(normalize_diopter),
            cylinder: params.cylinder().map(normalize_diopter),
            axis: params.axis(),
            addition: params.addition().map(normalize_diopter),
            addition_label: params
                .addition_label()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(ToOwned::to_owned),
        }
    }
}

/// Two-decimal string form; negative zero collapses to `0.00`.
#[must_use]
pub fn normalize_diopter(value: Decimal) -> String {
    let rounded = value.round_dp(2);
    if rounded.is_zero() {
        return "0.00".to_string();
    }
    format!("{rounded:.2}")
}

impl fmt::Display for VariantSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dash = "-";
        write!(
            f,
            "sph={} cyl={} axis={} add={} label={}",
            self.sphere.as_deref().unwrap_or(dash),
            self.cylinder.as_deref().unwrap_or(dash),
            self.axis.map_or_else(|| dash.to_string(), |a| a.to_string()),
            self.addition.as_deref().unwrap_or(dash),
            self.addition_label.as_deref().unwrap_or(dash),
        )
    }
}

/// Signature → position lookup over a variant list.
///
/// When a list holds the same signature more than once (possible in legacy
/// documents), the first position wins.
#[derive(Debug, Default)]
pub struct VariantIndex {
    positions: HashMap<VariantSignature, usize>,
}

impl VariantIndex {
    #[must_use]
    pub fn build(variants: &[Variant]) -> Self {
        let mut positions = HashMap::with_capacity(variants.len());
        for (i, v) in variants.iter().enumerate() {
            positions.entry(VariantSignature::of(v)).or_insert(i);
        }
        Self { positions }
    }

    #[must_use]
    pub fn position(&self, signature: &VariantSignature) -> Option<usize> {
        self.positions.get(signature).copied()
    }

    #[must_use]
    pub fn contains(&self, signature: &VariantSignature) -> bool {
        self.positions.contains_key(signature)
    }

    /// Returns the first signature that appears more than once in `variants`.
    #[must_use]
    pub fn first_duplicate(variants: &[Variant]) -> Option<VariantSignature> {
        let mut seen = Self::default();
        for (i, v) in variants.iter().enumerate() {
            let signature = VariantSignature::of(v);
            if seen.contains(&signature) {
                return Some(signature);
            }
            seen.positions.insert(signature, i);
        }
        None
    }
}

impl OpticalParams for Variant {
    fn sphere(&self) -> Option<Decimal> {
        self.sphere
    }
    fn cylinder(&self) -> Option<Decimal> {
        self.cylinder
    }
    fn axis(&self) -> Option<i32> {
        self.axis
    }
    fn addition(&self) -> Option<Decimal> {
        self.addition
    }
    fn addition_label(&self) -> Option<&str> {
        self.addition_label.as_deref()
    }
}

impl OpticalParams for VariantKey {
    fn sphere(&self) -> Option<Decimal> {
        self.sphere
    }
    fn cylinder(&self) -> Option<Decimal> {
        self.cylinder
    }
    fn axis(&self) -> Option<i32> {
        self.axis
    }
    fn addition(&self) -> Option<Decimal> {
        self.addition
    }
    fn addition_label(&self) -> Option<&str> {
        self.addition_label.as_deref()
    }
}

impl OpticalParams for VariantDraft {
    fn sphere(&self) -> Option<Decimal> {
        self.sphere
    }
    fn cylinder(&self) -> Option<Decimal> {
        self.cylinder
    }
    fn axis(&self) -> Option<i32> {
        self.axis
    }
    fn addition(&self) -> Option<Decimal> {
        self.addition
    }
    fn addition_label(&self) -> Option<&str> {
        self.addition_label.as_deref()
    }
}

impl OpticalParams for NewVariant {
    fn sphere(&self) -> Option<Decimal> {
        Some(self.sphere)
    }
    fn cylinder(&self) -> Option<Decimal> {
        self.cylinder
    }
    fn axis(&self) -> Option<i32> {
        self.axis
    }
    fn addition(&self) -> Option<Decimal> {
        self.addition
    }
    fn addition_label(&self) -> Option<&str> {
        self.addition_label.as_deref()
    }
}

#[cfg(test)]
#[path = "signature_test.rs"]
mod tests;
