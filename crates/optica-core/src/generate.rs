//! Variant Generator.
//!
//! One generator per lens family, each taking the family's fully-required
//! range struct. Output order is sphere-major and fully deterministic, so
//! regenerating the same payload yields the same list.

use rust_decimal::Decimal;

use crate::lens::{AdditionScheme, AstigmaticRanges, LensSpec, MultifocalRanges, SphericalRanges};
use crate::range::decimal_steps;
use crate::validate::{force_negative, AXIS_MAX};
use crate::variant::Variant;

pub const SPHERE_STEP: Decimal = Decimal::from_parts(25, 0, 0, false, 2);
pub const CYLINDER_STEP: Decimal = Decimal::from_parts(50, 0, 0, false, 2);
pub const ADDITION_STEP: Decimal = Decimal::from_parts(25, 0, 0, false, 2);
pub const AXIS_STEP: usize = 10;

/// One entry of a multifocal addition set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Addition {
    pub value: Option<Decimal>,
    pub label: String,
}

impl Addition {
    fn label_only(label: &str) -> Self {
        Self {
            value: None,
            label: label.to_string(),
        }
    }
}

/// The addition powers a multifocal lens is sold in.
#[must_use]
pub fn addition_set(scheme: AdditionScheme) -> Vec<Addition> {
    match scheme {
        AdditionScheme::Hl => vec![Addition::label_only("LOW"), Addition::label_only("HIGH")],
        AdditionScheme::Hml => vec![
            Addition::label_only("LOW"),
            Addition::label_only("MEDIUM"),
            Addition::label_only("HIGH"),
        ],
        AdditionScheme::DnRange => {
            let first = Decimal::new(100, 2);
            let last = Decimal::new(275, 2);
            decimal_steps(first, last, ADDITION_STEP)
                .map(two_places)
                .flat_map(|value| {
                    [
                        Addition {
                            value: Some(value),
                            label: format!("{value:.2}D"),
                        },
                        Addition {
                            value: Some(value),
                            label: format!("{value:.2}N"),
                        },
                    ]
                })
                .collect()
        }
    }
}

/// Full variant list for a validated lens.
#[must_use]
pub fn generate_variants(spec: &LensSpec) -> Vec<Variant> {
    match spec {
        LensSpec::Spherical(ranges) => spherical(ranges),
        LensSpec::Astigmatic(ranges) => astigmatic(ranges),
        LensSpec::Multifocal(ranges) => multifocal(ranges),
    }
}

fn spherical(ranges: &SphericalRanges) -> Vec<Variant> {
    ranges
        .sphere
        .steps(SPHERE_STEP)
        .map(|sph| Variant::generated(two_places(sph), None, None, None, None))
        .collect()
}

fn astigmatic(ranges: &AstigmaticRanges) -> Vec<Variant> {
    let spheres = ranges.sphere.steps(SPHERE_STEP);
    // A range straddling zero folds onto itself once negated; keep the first
    // occurrence so every generated signature stays unique.
    let mut cylinders: Vec<Decimal> = Vec::new();
    for cyl in ranges
        .cylinder
        .steps(CYLINDER_STEP)
        .map(|cyl| two_places(force_negative(cyl)))
    {
        if !cylinders.contains(&cyl) {
            cylinders.push(cyl);
        }
    }
    let axes: Vec<i32> = (0..=AXIS_MAX).step_by(AXIS_STEP).collect();

    let mut variants =
        Vec::with_capacity(spheres.size_hint().0 * cylinders.len() * axes.len());
    for sph in spheres.map(two_places) {
        for &cyl in &cylinders {
            variants.extend(
                axes.iter()
                    .map(|&axis| Variant::generated(sph, Some(cyl), Some(axis), None, None)),
            );
        }
    }
    variants
}

fn multifocal(ranges: &MultifocalRanges) -> Vec<Variant> {
    let spheres = ranges.sphere.steps(SPHERE_STEP);
    let additions = addition_set(ranges.scheme);

    let mut variants = Vec::with_capacity(spheres.size_hint().0 * additions.len());
    for sph in spheres.map(two_places) {
        variants.extend(additions.iter().map(|add| {
            Variant::generated(sph, None, None, add.value, Some(add.label.clone()))
        }));
    }
    variants
}

/// Rescales to two decimal places so stored values read `-5.75`, `0.00`.
fn two_places(mut value: Decimal) -> Decimal {
    value.rescale(2);
    if value.is_zero() {
        value.set_sign_positive(true);
    }
    value
}
