//! Lens Validator: per-family required/forbidden field rules.
//!
//! Every check here is pure; callers run them before any mutation is applied.

use rust_decimal::Decimal;

use crate::lens::{
    AdditionScheme, AstigmaticRanges, DiopterRange, LensPayload, LensSpec, LensType,
    MultifocalRanges, SphericalRanges,
};
use crate::variant::{trim_label, NewVariant, Variant};
use crate::LensError;

/// Highest valid axis in degrees.
pub const AXIS_MAX: i32 = 180;

/// Largest sphere power, either sign, a lens may be sold in.
pub const SPHERE_LIMIT: Decimal = Decimal::from_parts(30, 0, 0, false, 0);

/// Largest cylinder power, either sign, a lens may be sold in.
pub const CYLINDER_LIMIT: Decimal = Decimal::from_parts(10, 0, 0, false, 0);

fn check_bound(field: &str, value: Decimal, limit: Decimal) -> Result<(), LensError> {
    if value.abs() > limit {
        return Err(LensError::invalid(format!(
            "{field} must be between -{limit} and {limit}"
        )));
    }
    Ok(())
}

/// Turns a loosely-shaped payload into a fully-required per-family spec.
///
/// # Errors
///
/// Returns [`LensError::InvalidLensSpec`] when a required range is missing,
/// a `min` exceeds its `max`, a bound lies outside [`SPHERE_LIMIT`] or
/// [`CYLINDER_LIMIT`], or a field forbidden for the lens type is set.
pub fn validate_lens(payload: &LensPayload) -> Result<LensSpec, LensError> {
    let (Some(sph_min), Some(sph_max)) = (payload.sph_min, payload.sph_max) else {
        return Err(LensError::invalid(
            "sph_min and sph_max are required for all lens types",
        ));
    };
    if sph_min > sph_max {
        return Err(LensError::invalid("sph_min cannot be greater than sph_max"));
    }
    check_bound("sph_min", sph_min, SPHERE_LIMIT)?;
    check_bound("sph_max", sph_max, SPHERE_LIMIT)?;
    let sphere = DiopterRange::new(sph_min, sph_max)?;
    let has_cylinder = payload.cyl_min.is_some() || payload.cyl_max.is_some();

    match payload.lens_type {
        LensType::Spherical => {
            if has_cylinder {
                return Err(LensError::invalid(
                    "cyl_min/cyl_max must be empty for spherical lenses",
                ));
            }
            if payload.addition_scheme.is_some() {
                return Err(LensError::invalid(
                    "addition_scheme must be empty for spherical lenses",
                ));
            }
            Ok(LensSpec::Spherical(SphericalRanges { sphere }))
        }
        LensType::Astigmatic => {
            let (Some(cyl_min), Some(cyl_max)) = (payload.cyl_min, payload.cyl_max) else {
                return Err(LensError::invalid(
                    "cyl_min and cyl_max are required for astigmatic lenses",
                ));
            };
            if cyl_min > cyl_max {
                return Err(LensError::invalid("cyl_min cannot be greater than cyl_max"));
            }
            check_bound("cyl_min", cyl_min, CYLINDER_LIMIT)?;
            check_bound("cyl_max", cyl_max, CYLINDER_LIMIT)?;
            if payload.addition_scheme.is_some() {
                return Err(LensError::invalid(
                    "addition_scheme must be empty for astigmatic lenses",
                ));
            }
            Ok(LensSpec::Astigmatic(AstigmaticRanges {
                sphere,
                cylinder: DiopterRange::new(cyl_min, cyl_max)?,
            }))
        }
        LensType::Multifocal => {
            let Some(scheme) = payload.addition_scheme else {
                return Err(LensError::invalid(
                    "addition_scheme is required for multifocal lenses",
                ));
            };
            if has_cylinder {
                return Err(LensError::invalid(
                    "cyl_min/cyl_max must be empty for multifocal lenses",
                ));
            }
            Ok(LensSpec::Multifocal(MultifocalRanges { sphere, scheme }))
        }
    }
}

/// Blocks a lens type change unless the caller asked for regeneration.
///
/// `existing` is the raw stored value; a record without one (legacy) may take
/// any type.
///
/// # Errors
///
/// Returns [`LensError::LensTypeChangeBlocked`] when the type differs and
/// `regenerate` is false.
pub fn check_lens_type_change(
    existing: Option<&str>,
    requested: LensType,
    regenerate: bool,
) -> Result<(), LensError> {
    match existing {
        Some(current) if current != requested.as_str() && !regenerate => {
            Err(LensError::LensTypeChangeBlocked {
                from: current.to_string(),
                to: requested,
            })
        }
        _ => Ok(()),
    }
}

/// Applies the per-family field rules to a single new variant and returns
/// the normalized value to store.
///
/// Fields the family does not use are dropped rather than rejected.
///
/// # Errors
///
/// Returns [`LensError::InvalidLensSpec`] when a field the family requires is
/// missing or out of range.
pub fn prepare_variant(
    lens_type: LensType,
    scheme: Option<AdditionScheme>,
    input: NewVariant,
) -> Result<Variant, LensError> {
    let NewVariant {
        sphere,
        cylinder,
        axis,
        addition,
        addition_label,
        ean,
        availability,
        quantity,
    } = input;

    let mut variant = Variant {
        sphere: Some(sphere),
        cylinder: None,
        axis: None,
        addition: None,
        addition_label: None,
        ean,
        availability,
        quantity,
    };

    match lens_type {
        LensType::Spherical => {}
        LensType::Astigmatic => {
            let (Some(cylinder), Some(axis)) = (cylinder, axis) else {
                return Err(LensError::invalid(
                    "cylinder and axis are required for astigmatic variants",
                ));
            };
            if !(0..=AXIS_MAX).contains(&axis) {
                return Err(LensError::invalid("axis must be in the 0-180 range"));
            }
            variant.cylinder = Some(force_negative(cylinder));
            variant.axis = Some(axis);
        }
        LensType::Multifocal => {
            let Some(scheme) = scheme else {
                return Err(LensError::invalid(
                    "addition scheme missing for multifocal lens",
                ));
            };
            let Some(label) = trim_label(addition_label) else {
                return Err(LensError::invalid(
                    "addition label is required for multifocal variants",
                ));
            };
            if scheme == AdditionScheme::DnRange {
                if addition.is_none() {
                    return Err(LensError::invalid(
                        "addition numeric value is required for DN_RANGE variants",
                    ));
                }
                variant.addition = addition;
            }
            variant.addition_label = Some(label);
        }
    }

    Ok(variant)
}

/// Cylinder is conventionally negative. Zero stays zero.
pub(crate) fn force_negative(cylinder: Decimal) -> Decimal {
    if cylinder > Decimal::ZERO {
        -cylinder
    } else {
        cylinder
    }
}

#[cfg(test)]
#[path = "validate_test.rs"]
mod tests;
