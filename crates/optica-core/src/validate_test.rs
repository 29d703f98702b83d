use serde_json::json;

use super::*;
use crate::lens::Availability;

fn payload(overrides: serde_json::Value) -> LensPayload {
    let mut base = json!({
        "title": "Acuvue Oasys",
        "slug": "acuvue-oasys",
        "sku": "AO-1",
        "duration": "monthly",
        "lens_type": "spherical",
        "price": "24.90",
        "sph_min": "-6.00",
        "sph_max": "-5.00"
    });
    if let (Some(base), Some(extra)) = (base.as_object_mut(), overrides.as_object()) {
        for (k, v) in extra {
            base.insert(k.clone(), v.clone());
        }
    }
    serde_json::from_value(base).expect("test payload should deserialize")
}

fn message(err: LensError) -> String {
    match err {
        LensError::InvalidLensSpec(msg) => msg,
        other => panic!("expected InvalidLensSpec, got {other:?}"),
    }
}

fn new_variant(value: serde_json::Value) -> NewVariant {
    serde_json::from_value(value).expect("test variant should deserialize")
}

#[test]
fn spherical_payload_yields_spherical_spec() {
    let spec = validate_lens(&payload(json!({}))).expect("valid");
    assert_eq!(spec.lens_type(), LensType::Spherical);
}

#[test]
fn sphere_range_is_required_for_every_type() {
    for lens_type in ["spherical", "astigmatic", "multifocal"] {
        let err = validate_lens(&payload(json!({"lens_type": lens_type, "sph_min": null})))
            .unwrap_err();
        assert_eq!(
            message(err),
            "sph_min and sph_max are required for all lens types"
        );
    }
}

#[test]
fn inverted_sphere_range_is_rejected() {
    let err = validate_lens(&payload(json!({"sph_min": 2, "sph_max": 1}))).unwrap_err();
    assert_eq!(message(err), "sph_min cannot be greater than sph_max");
}

#[test]
fn spherical_rejects_cylinder_and_addition() {
    let err = validate_lens(&payload(json!({"cyl_max": -1}))).unwrap_err();
    assert!(message(err).contains("spherical"));

    let err = validate_lens(&payload(json!({"addition_scheme": "HL"}))).unwrap_err();
    assert!(message(err).contains("addition_scheme"));
}

#[test]
fn astigmatic_requires_ordered_cylinder_range() {
    let err = validate_lens(&payload(json!({"lens_type": "astigmatic"}))).unwrap_err();
    assert_eq!(
        message(err),
        "cyl_min and cyl_max are required for astigmatic lenses"
    );

    let err = validate_lens(&payload(json!({
        "lens_type": "astigmatic", "cyl_min": -0.75, "cyl_max": -1.25
    })))
    .unwrap_err();
    assert_eq!(message(err), "cyl_min cannot be greater than cyl_max");

    let spec = validate_lens(&payload(json!({
        "lens_type": "astigmatic", "cyl_min": -1.25, "cyl_max": -0.75
    })))
    .expect("valid astigmatic");
    let LensSpec::Astigmatic(ranges) = spec else {
        panic!("expected astigmatic spec");
    };
    assert_eq!(ranges.cylinder.min(), Decimal::new(-125, 2));
}

#[test]
fn astigmatic_rejects_addition_scheme() {
    let err = validate_lens(&payload(json!({
        "lens_type": "astigmatic", "cyl_min": -1, "cyl_max": -1, "addition_scheme": "HML"
    })))
    .unwrap_err();
    assert_eq!(
        message(err),
        "addition_scheme must be empty for astigmatic lenses"
    );
}

#[test]
fn multifocal_requires_scheme_and_no_cylinder() {
    let err = validate_lens(&payload(json!({"lens_type": "multifocal"}))).unwrap_err();
    assert_eq!(
        message(err),
        "addition_scheme is required for multifocal lenses"
    );

    let err = validate_lens(&payload(json!({
        "lens_type": "multifocal", "addition_scheme": "HL", "cyl_min": -1
    })))
    .unwrap_err();
    assert_eq!(
        message(err),
        "cyl_min/cyl_max must be empty for multifocal lenses"
    );
}

#[test]
fn sphere_bounds_beyond_the_limit_are_rejected() {
    let err = validate_lens(&payload(json!({
        "sph_min": "-79228162514264337593543950335",
        "sph_max": "79228162514264337593543950335"
    })))
    .unwrap_err();
    assert_eq!(message(err), "sph_min must be between -30 and 30");

    let err = validate_lens(&payload(json!({"sph_min": 0, "sph_max": "30.25"}))).unwrap_err();
    assert_eq!(message(err), "sph_max must be between -30 and 30");

    assert!(validate_lens(&payload(json!({"sph_min": -30, "sph_max": 30}))).is_ok());
}

#[test]
fn cylinder_bounds_beyond_the_limit_are_rejected() {
    let err = validate_lens(&payload(json!({
        "lens_type": "astigmatic", "cyl_min": "-1000000000000", "cyl_max": -1
    })))
    .unwrap_err();
    assert_eq!(message(err), "cyl_min must be between -10 and 10");
}

#[test]
fn validation_is_deterministic() {
    let p = payload(json!({"lens_type": "multifocal", "addition_scheme": "DN_RANGE"}));
    assert_eq!(validate_lens(&p), validate_lens(&p));
}

#[test]
fn type_change_without_regenerate_is_blocked() {
    let err = check_lens_type_change(Some("spherical"), LensType::Astigmatic, false).unwrap_err();
    assert_eq!(
        err,
        LensError::LensTypeChangeBlocked {
            from: "spherical".to_string(),
            to: LensType::Astigmatic,
        }
    );
    assert!(check_lens_type_change(Some("spherical"), LensType::Astigmatic, true).is_ok());
    assert!(check_lens_type_change(Some("spherical"), LensType::Spherical, false).is_ok());
    assert!(check_lens_type_change(None, LensType::Multifocal, false).is_ok());
}

#[test]
fn spherical_variant_drops_unused_fields() {
    let v = prepare_variant(
        LensType::Spherical,
        None,
        new_variant(json!({
            "sphere": -1.5, "cylinder": -0.75, "axis": 90, "addition_label": "LOW",
            "availability": "in_stock", "quantity": 2
        })),
    )
    .expect("valid");
    assert_eq!(v.sphere, Some(Decimal::new(-150, 2)));
    assert!(v.cylinder.is_none() && v.axis.is_none() && v.addition_label.is_none());
    assert_eq!(v.availability, Availability::InStock);
    assert_eq!(v.quantity, 2);
}

#[test]
fn astigmatic_variant_forces_negative_cylinder() {
    let v = prepare_variant(
        LensType::Astigmatic,
        None,
        new_variant(json!({"sphere": 0, "cylinder": 1.25, "axis": 180})),
    )
    .expect("valid");
    assert_eq!(v.cylinder, Some(Decimal::new(-125, 2)));
    assert_eq!(v.axis, Some(180));
}

#[test]
fn astigmatic_variant_needs_axis_in_range() {
    let err = prepare_variant(
        LensType::Astigmatic,
        None,
        new_variant(json!({"sphere": 0, "cylinder": -1})),
    )
    .unwrap_err();
    assert!(message(err).contains("required"));

    let err = prepare_variant(
        LensType::Astigmatic,
        None,
        new_variant(json!({"sphere": 0, "cylinder": -1, "axis": 181})),
    )
    .unwrap_err();
    assert_eq!(message(err), "axis must be in the 0-180 range");
}

#[test]
fn multifocal_variant_rules_depend_on_scheme() {
    let err = prepare_variant(
        LensType::Multifocal,
        None,
        new_variant(json!({"sphere": 0, "addition_label": "LOW"})),
    )
    .unwrap_err();
    assert!(message(err).contains("scheme missing"));

    let err = prepare_variant(
        LensType::Multifocal,
        Some(AdditionScheme::Hl),
        new_variant(json!({"sphere": 0, "addition_label": "  "})),
    )
    .unwrap_err();
    assert!(message(err).contains("label is required"));

    let v = prepare_variant(
        LensType::Multifocal,
        Some(AdditionScheme::Hml),
        new_variant(json!({"sphere": 0, "addition": 1.5, "addition_label": " MEDIUM "})),
    )
    .expect("valid HML variant");
    assert_eq!(v.addition, None);
    assert_eq!(v.addition_label.as_deref(), Some("MEDIUM"));

    let err = prepare_variant(
        LensType::Multifocal,
        Some(AdditionScheme::DnRange),
        new_variant(json!({"sphere": 0, "addition_label": "1.50D"})),
    )
    .unwrap_err();
    assert!(message(err).contains("DN_RANGE"));

    let v = prepare_variant(
        LensType::Multifocal,
        Some(AdditionScheme::DnRange),
        new_variant(json!({"sphere": 0, "addition": "1.50", "addition_label": "1.50D"})),
    )
    .expect("valid DN variant");
    assert_eq!(v.addition, Some(Decimal::new(150, 2)));
}
