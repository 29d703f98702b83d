//! Lens classification, the loosely-shaped create/update payload, and the
//! validated per-family range specs that variant generation consumes.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::range::{decimal_steps, DecimalSteps};
use crate::LensError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LensFamily {
    Soft,
    Rgp,
    Keratoconic,
    Scleral,
    #[default]
    Other,
}

impl LensFamily {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            LensFamily::Soft => "soft",
            LensFamily::Rgp => "rgp",
            LensFamily::Keratoconic => "keratoconic",
            LensFamily::Scleral => "scleral",
            LensFamily::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LensDuration {
    #[serde(rename = "daily")]
    Daily,
    #[serde(rename = "monthly")]
    Monthly,
    #[serde(rename = "15days")]
    FifteenDays,
    #[serde(rename = "3months")]
    ThreeMonths,
    #[serde(rename = "yearly")]
    Yearly,
}

impl LensDuration {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            LensDuration::Daily => "daily",
            LensDuration::Monthly => "monthly",
            LensDuration::FifteenDays => "15days",
            LensDuration::ThreeMonths => "3months",
            LensDuration::Yearly => "yearly",
        }
    }
}

/// Decides which optical axes a lens has and which validation rules apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LensType {
    Spherical,
    Astigmatic,
    Multifocal,
}

impl LensType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            LensType::Spherical => "spherical",
            LensType::Astigmatic => "astigmatic",
            LensType::Multifocal => "multifocal",
        }
    }
}

impl fmt::Display for LensType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LensType {
    type Err = LensError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "spherical" => Ok(LensType::Spherical),
            "astigmatic" => Ok(LensType::Astigmatic),
            "multifocal" => Ok(LensType::Multifocal),
            other => Err(LensError::UnsupportedLensType(other.to_string())),
        }
    }
}

/// Addition-power enumeration for multifocal lenses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AdditionScheme {
    /// Label-only LOW / HIGH.
    #[serde(rename = "HL")]
    Hl,
    /// Label-only LOW / MEDIUM / HIGH.
    #[serde(rename = "HML")]
    Hml,
    /// Numeric 1.00 to 2.75 in 0.25 steps, each as a dominant (D) and
    /// non-dominant (N) entry.
    #[serde(rename = "DN_RANGE")]
    DnRange,
}

impl AdditionScheme {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AdditionScheme::Hl => "HL",
            AdditionScheme::Hml => "HML",
            AdditionScheme::DnRange => "DN_RANGE",
        }
    }
}

impl FromStr for AdditionScheme {
    type Err = LensError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "HL" => Ok(AdditionScheme::Hl),
            "HML" => Ok(AdditionScheme::Hml),
            "DN_RANGE" => Ok(AdditionScheme::DnRange),
            other => Err(LensError::invalid(format!(
                "unknown addition scheme '{other}'"
            ))),
        }
    }
}

/// Per-variant stock state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    InStock,
    #[default]
    Preorder,
    Unavailable,
}

impl Availability {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Availability::InStock => "in_stock",
            Availability::Preorder => "preorder",
            Availability::Unavailable => "unavailable",
        }
    }
}

impl fmt::Display for Availability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Availability {
    type Err = LensError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in_stock" => Ok(Availability::InStock),
            "preorder" => Ok(Availability::Preorder),
            "unavailable" => Ok(Availability::Unavailable),
            other => Err(LensError::invalid(format!("unknown availability '{other}'"))),
        }
    }
}

/// Base lens product as submitted by the admin UI.
///
/// Range fields are optional here because which ones are required depends on
/// `lens_type`; [`crate::validate_lens`] turns this into a [`LensSpec`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LensPayload {
    pub title: String,
    pub slug: String,
    pub sku: String,
    pub brand: Option<String>,
    pub ean: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    #[serde(default)]
    pub family: LensFamily,
    pub duration: LensDuration,
    pub lens_type: LensType,
    /// Base curve, descriptive only.
    pub bc: Option<Decimal>,
    /// Diameter in mm, descriptive only.
    pub diameter: Option<Decimal>,
    pub price: Decimal,
    pub sph_min: Option<Decimal>,
    pub sph_max: Option<Decimal>,
    pub cyl_min: Option<Decimal>,
    pub cyl_max: Option<Decimal>,
    pub addition_scheme: Option<AdditionScheme>,
}

/// Inclusive diopter bounds. `min <= max` holds for every constructed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiopterRange {
    min: Decimal,
    max: Decimal,
}

impl DiopterRange {
    /// # Errors
    ///
    /// Returns [`LensError::InvalidLensSpec`] when `min > max`.
    pub fn new(min: Decimal, max: Decimal) -> Result<Self, LensError> {
        if min > max {
            return Err(LensError::invalid(format!(
                "range minimum {min} cannot be greater than maximum {max}"
            )));
        }
        Ok(Self { min, max })
    }

    #[must_use]
    pub fn min(&self) -> Decimal {
        self.min
    }

    #[must_use]
    pub fn max(&self) -> Decimal {
        self.max
    }

    /// Values from `min` to `max` inclusive, `step` apart.
    #[must_use]
    pub fn steps(&self, step: Decimal) -> DecimalSteps {
        decimal_steps(self.min, self.max, step)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SphericalRanges {
    pub sphere: DiopterRange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AstigmaticRanges {
    pub sphere: DiopterRange,
    pub cylinder: DiopterRange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MultifocalRanges {
    pub sphere: DiopterRange,
    pub scheme: AdditionScheme,
}

/// A validated lens description: one fully-required range struct per family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LensSpec {
    Spherical(SphericalRanges),
    Astigmatic(AstigmaticRanges),
    Multifocal(MultifocalRanges),
}

impl LensSpec {
    #[must_use]
    pub fn lens_type(&self) -> LensType {
        match self {
            LensSpec::Spherical(_) => LensType::Spherical,
            LensSpec::Astigmatic(_) => LensType::Astigmatic,
            LensSpec::Multifocal(_) => LensType::Multifocal,
        }
    }
}
