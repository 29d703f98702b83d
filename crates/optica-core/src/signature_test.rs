use proptest::prelude::*;
use serde_json::json;

use super::*;

fn key(value: serde_json::Value) -> VariantKey {
    serde_json::from_value(value).expect("valid variant key")
}

#[test]
fn numeric_representation_does_not_matter() {
    let a = VariantSignature::of(&key(json!({"sphere": 1.0})));
    let b = VariantSignature::of(&key(json!({"sphere": "1.00"})));
    let c = VariantSignature::of(&key(json!({"sphere": 1})));
    assert_eq!(a, b);
    assert_eq!(b, c);
}

#[test]
fn label_whitespace_and_blank_are_normalized() {
    let padded = VariantSignature::of(&key(json!({"sphere": 0, "addition_label": "  LOW "})));
    let plain = VariantSignature::of(&key(json!({"sphere": 0, "addition_label": "LOW"})));
    assert_eq!(padded, plain);

    let blank = VariantSignature::of(&key(json!({"sphere": 0, "addition_label": ""})));
    let missing = VariantSignature::of(&key(json!({"sphere": 0})));
    assert_eq!(blank, missing);
}

#[test]
fn field_order_in_request_is_irrelevant() {
    let a: VariantKey =
        serde_json::from_str(r#"{"axis": 90, "cylinder": -0.75, "sphere": -2}"#).expect("key");
    let b: VariantKey =
        serde_json::from_str(r#"{"sphere": "-2.00", "cylinder": "-0.75", "axis": 90}"#)
            .expect("key");
    assert_eq!(VariantSignature::of(&a), VariantSignature::of(&b));
}

#[test]
fn different_axis_means_different_variant() {
    let a = VariantSignature::of(&key(json!({"sphere": 0, "cylinder": -1, "axis": 10})));
    let b = VariantSignature::of(&key(json!({"sphere": 0, "cylinder": -1, "axis": 20})));
    assert_ne!(a, b);
}

#[test]
fn negative_zero_matches_zero() {
    let neg = VariantSignature::of(&key(json!({"sphere": "-0.00"})));
    let pos = VariantSignature::of(&key(json!({"sphere": 0})));
    assert_eq!(neg, pos);
}

#[test]
fn stored_variant_and_key_share_a_signature() {
    let stored = Variant::generated(
        Decimal::new(-575, 2),
        Some(Decimal::new(-125, 2)),
        Some(170),
        None,
        None,
    );
    let k = key(json!({"sphere": -5.75, "cylinder": -1.25, "axis": 170}));
    assert_eq!(VariantSignature::of(&stored), VariantSignature::of(&k));
}

#[test]
fn display_marks_missing_fields() {
    let sig = VariantSignature::of(&key(json!({"sphere": 1.5, "addition_label": "HIGH"})));
    assert_eq!(sig.to_string(), "sph=1.50 cyl=- axis=- add=- label=HIGH");
}

#[test]
fn index_keeps_first_position_of_repeated_signature() {
    let v = Variant::generated(Decimal::ONE, None, None, None, None);
    let other = Variant::generated(Decimal::TWO, None, None, None, None);
    let list = vec![v.clone(), other, v.clone()];

    let index = VariantIndex::build(&list);
    assert_eq!(index.position(&VariantSignature::of(&v)), Some(0));
    assert_eq!(
        VariantIndex::first_duplicate(&list),
        Some(VariantSignature::of(&v))
    );
}

#[test]
fn first_duplicate_is_none_for_distinct_list() {
    let list = vec![
        Variant::generated(Decimal::ONE, None, None, None, None),
        Variant::generated(Decimal::TWO, None, None, None, None),
    ];
    assert!(VariantIndex::first_duplicate(&list).is_none());
}

proptest! {
    #[test]
    fn signature_is_reflexive_and_symmetric(
        sphere in -2000i64..2000,
        cylinder in proptest::option::of(-600i64..0),
        axis in proptest::option::of(0i32..=180),
        label in proptest::option::of("[A-Z]{0,6}"),
    ) {
        let a = VariantKey {
            sphere: Some(Decimal::new(sphere, 2)),
            cylinder: cylinder.map(|c| Decimal::new(c, 2)),
            axis,
            addition: None,
            addition_label: label.clone(),
        };
        // Same values at a different scale, with padded label.
        let b = VariantKey {
            sphere: Some(Decimal::new(sphere * 10, 3)),
            cylinder: cylinder.map(|c| Decimal::new(c * 100, 4)),
            axis,
            addition: None,
            addition_label: label.map(|l| format!(" {l} ")),
        };
        let sa = VariantSignature::of(&a);
        let sb = VariantSignature::of(&b);
        prop_assert_eq!(&sa, &VariantSignature::of(&a));
        prop_assert_eq!(&sa, &sb);
        prop_assert_eq!(&sb, &sa);
    }
}
