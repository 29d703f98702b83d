use std::sync::Arc;

use optica_catalog::{
    Actor, AuditAction, BulkUpdateVariantsRequest, CatalogError, CatalogRepository,
    CatalogSettings, CreateVariantRequest, DeleteVariantRequest, LensCatalog, MemoryAuditSink,
    MemoryProductStore, UpdateLensRequest, UpsertLensRequest,
};
use optica_core::{Availability, ProductDraft, Variant, VariantDraft};
use rust_decimal::Decimal;
use serde_json::{json, Map, Value};

struct Harness {
    catalog: LensCatalog,
    store: Arc<MemoryProductStore>,
    audit: Arc<MemoryAuditSink>,
    actor: Actor,
}

fn harness_with(settings: CatalogSettings, audit: MemoryAuditSink) -> Harness {
    let store = Arc::new(MemoryProductStore::new());
    let audit = Arc::new(audit);
    Harness {
        catalog: LensCatalog::new(store.clone(), audit.clone(), settings),
        store,
        audit,
        actor: Actor::new("tester"),
    }
}

fn harness() -> Harness {
    harness_with(CatalogSettings::default(), MemoryAuditSink::new())
}

fn d(raw: &str) -> Decimal {
    raw.parse().expect("decimal literal")
}

fn spherical(sku: &str) -> Value {
    json!({
        "title": "Daily Clear",
        "slug": "daily-clear",
        "sku": sku,
        "brand": "Acme",
        "duration": "daily",
        "family": "soft",
        "lens_type": "spherical",
        "bc": 8.6,
        "diameter": "14.2",
        "price": "19.90",
        "sph_min": "-6.00",
        "sph_max": "-5.00"
    })
}

fn astigmatic(sku: &str) -> Value {
    json!({
        "title": "Toric",
        "slug": "toric",
        "sku": sku,
        "duration": "monthly",
        "lens_type": "astigmatic",
        "price": 25,
        "sph_min": 0,
        "sph_max": 0.25,
        "cyl_min": -0.75,
        "cyl_max": -0.75
    })
}

fn upsert(body: Value) -> UpsertLensRequest {
    serde_json::from_value(body).expect("upsert request")
}

fn update(body: Value) -> UpdateLensRequest {
    serde_json::from_value(body).expect("update request")
}

fn with(mut body: Value, key: &str, value: Value) -> Value {
    body[key] = value;
    body
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

fn as_drafts(variants: &[Variant]) -> Vec<VariantDraft> {
    variants
        .iter()
        .map(|v| VariantDraft {
            sphere: v.sphere,
            cylinder: v.cylinder,
            axis: v.axis,
            addition: v.addition,
            addition_label: v.addition_label.clone(),
            ean: v.ean.clone(),
            availability: v.availability,
            quantity: v.quantity,
        })
        .collect()
}

#[tokio::test]
async fn spherical_create_generates_five_preorder_variants() {
    let h = harness();
    let out = h
        .catalog
        .create_or_upsert_lens(&h.actor, upsert(spherical("SPH-1")))
        .await
        .unwrap();

    assert!(out.created);
    assert_eq!(out.product.variants_count, 5);
    assert_eq!(out.product.status, "preorder");
    assert_eq!(out.product.version, 1);
    assert_eq!(
        out.product.summary.sphere,
        vec![d("-6.00"), d("-5.75"), d("-5.50"), d("-5.25"), d("-5.00")]
    );

    let events = h.audit.events().await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].action, AuditAction::ContactLensCreate);
    assert_eq!(events[0].actor.name(), "tester");
}

#[tokio::test]
async fn astigmatic_create_generates_thirty_eight_variants() {
    let h = harness();
    let out = h
        .catalog
        .create_or_upsert_lens(&h.actor, upsert(astigmatic("TOR-1")))
        .await
        .unwrap();

    assert_eq!(out.product.variants_count, 38);
    assert_eq!(out.product.summary.cylinder, vec![d("-0.75")]);
    assert_eq!(out.product.summary.axis.len(), 19);

    let variants = h.catalog.get_variants("TOR-1").await.unwrap().variants;
    assert!(variants.iter().all(|v| v.cylinder.is_some_and(|c| c <= Decimal::ZERO)));
    assert_eq!(variants[0].axis, Some(0));
    assert_eq!(variants[18].axis, Some(180));
}

#[tokio::test]
async fn upsert_regenerates_in_place_and_bumps_version() {
    let h = harness();
    h.catalog
        .create_or_upsert_lens(&h.actor, upsert(spherical("SPH-1")))
        .await
        .unwrap();
    let again = h
        .catalog
        .create_or_upsert_lens(&h.actor, upsert(spherical("SPH-1")))
        .await
        .unwrap();

    assert!(!again.created);
    assert_eq!(again.product.version, 2);
    assert_eq!(again.product.variants_count, 5);
    let actions: Vec<_> = h.audit.events().await.iter().map(|e| e.action).collect();
    assert_eq!(
        actions,
        vec![AuditAction::ContactLensCreate, AuditAction::ContactLensUpdate]
    );
}

#[tokio::test]
async fn bulk_update_to_in_stock_makes_product_in_stock() {
    let h = harness();
    h.catalog
        .create_or_upsert_lens(&h.actor, upsert(spherical("SPH-1")))
        .await
        .unwrap();

    let current = h.catalog.get_variants("SPH-1").await.unwrap();
    let mut drafts = as_drafts(&current.variants);
    drafts[2].availability = Availability::InStock;
    drafts[2].quantity = 3;

    let out = h
        .catalog
        .bulk_update_variants(
            &h.actor,
            "SPH-1",
            BulkUpdateVariantsRequest {
                variants: drafts,
                expected_version: Some(current.version),
            },
        )
        .await
        .unwrap();

    assert_eq!(out.availability, Availability::InStock);
    assert_eq!(out.updated_count, 5);
    assert_eq!(out.variants_total, 5);

    let lens = h.catalog.get_lens("SPH-1").await.unwrap();
    assert_eq!(lens.status, "in_stock");
    assert_eq!(lens.availability, "in_stock");
    let listed = h.catalog.list_lenses(true).await.unwrap();
    assert_eq!(listed.len(), 1);
}

#[tokio::test]
async fn lens_type_change_without_regenerate_is_blocked() {
    let h = harness();
    h.catalog
        .create_or_upsert_lens(&h.actor, upsert(spherical("SPH-1")))
        .await
        .unwrap();

    let err = h
        .catalog
        .update_lens(&h.actor, "SPH-1", update(astigmatic("SPH-1")))
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::LensTypeChangeBlocked { .. }), "got {err:?}");

    let unchanged = h.catalog.get_lens("SPH-1").await.unwrap();
    assert_eq!(unchanged.version, 1);
    assert_eq!(unchanged.lens_type.as_deref(), Some("spherical"));
}

#[tokio::test]
async fn lens_type_change_with_regenerate_rebuilds_variants() {
    let h = harness();
    h.catalog
        .create_or_upsert_lens(&h.actor, upsert(spherical("SPH-1")))
        .await
        .unwrap();

    let body = with(astigmatic("SPH-1"), "regenerate_variants", json!(true));
    let out = h
        .catalog
        .update_lens(&h.actor, "SPH-1", update(body))
        .await
        .unwrap();

    assert!(out.regenerated);
    assert_eq!(out.product.variants_count, 38);
    assert_eq!(out.product.lens_type.as_deref(), Some("astigmatic"));
}

#[tokio::test]
async fn update_without_regenerate_keeps_variants_and_overwrites_ean() {
    let h = harness();
    let created = with(spherical("SPH-1"), "ean", json!("5200000000001"));
    h.catalog
        .create_or_upsert_lens(&h.actor, upsert(created))
        .await
        .unwrap();

    let body = with(spherical("SPH-1"), "title", json!("Daily Clear Plus"));
    let out = h
        .catalog
        .update_lens(&h.actor, "SPH-1", update(body))
        .await
        .unwrap();

    assert!(!out.regenerated);
    assert_eq!(out.product.variants_count, 5);
    assert_eq!(out.product.title.en, "Daily Clear Plus");
    assert_eq!(out.product.ean, None);
}

#[tokio::test]
async fn update_rejects_sku_mismatch_and_unknown_lens() {
    let h = harness();
    let err = h
        .catalog
        .update_lens(&h.actor, "OTHER", update(spherical("SPH-1")))
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::SkuMismatch { .. }));

    let err = h
        .catalog
        .update_lens(&h.actor, "SPH-1", update(spherical("SPH-1")))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn cylinder_range_across_zero_round_trips_through_bulk_update() {
    let h = harness();
    let body = with(astigmatic("TOR-0"), "sph_max", json!(0));
    let body = with(with(body, "cyl_min", json!(-0.5)), "cyl_max", json!(0.5));
    let out = h
        .catalog
        .create_or_upsert_lens(&h.actor, upsert(body))
        .await
        .unwrap();
    assert_eq!(out.product.variants_count, 2 * 19);

    let current = h.catalog.get_variants("TOR-0").await.unwrap();
    let out = h
        .catalog
        .bulk_update_variants(
            &h.actor,
            "TOR-0",
            BulkUpdateVariantsRequest {
                variants: as_drafts(&current.variants),
                expected_version: Some(current.version),
            },
        )
        .await
        .unwrap();
    assert_eq!(out.variants_total, 38);
}

#[tokio::test]
async fn oversized_sphere_range_is_rejected_before_generation() {
    let h = harness();
    let body = with(spherical("HUGE"), "sph_min", json!("-1000000000000"));
    let body = with(body, "sph_max", json!("1000000000000"));
    let err = h
        .catalog
        .create_or_upsert_lens(&h.actor, upsert(body))
        .await
        .unwrap_err();

    assert!(matches!(err, CatalogError::InvalidLensSpec(ref m) if m.contains("sph_min")));
    assert!(h.store.get("HUGE").await.is_none());
}

#[tokio::test]
async fn invalid_payload_writes_nothing() {
    let h = harness();
    let body = with(spherical("SPH-1"), "cyl_min", json!(-1));
    let err = h
        .catalog
        .create_or_upsert_lens(&h.actor, upsert(body))
        .await
        .unwrap_err();

    assert!(matches!(err, CatalogError::InvalidLensSpec(_)));
    assert!(h.store.get("SPH-1").await.is_none());
    assert!(h.audit.events().await.is_empty());
}

#[tokio::test]
async fn create_variant_rejects_duplicates_regardless_of_representation() {
    let h = harness();
    h.catalog
        .create_or_upsert_lens(&h.actor, upsert(astigmatic("TOR-1")))
        .await
        .unwrap();

    let existing: CreateVariantRequest = serde_json::from_value(json!({
        "axis": 90,
        "cylinder": "-0.750",
        "sphere": 0.25
    }))
    .unwrap();
    let err = h
        .catalog
        .create_variant(&h.actor, "TOR-1", existing)
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::DuplicateVariant(_)), "got {err:?}");

    let fresh: CreateVariantRequest = serde_json::from_value(json!({
        "sphere": "0.50",
        "cylinder": 0.75,
        "axis": 45,
        "availability": "in_stock",
        "quantity": 2
    }))
    .unwrap();
    let out = h
        .catalog
        .create_variant(&h.actor, "TOR-1", fresh)
        .await
        .unwrap();
    assert_eq!(out.variant.cylinder, Some(d("-0.75")));
    assert_eq!(out.variants_total, 39);
    assert_eq!(out.availability, Availability::InStock);
    assert_eq!(out.version, 2);
}

#[tokio::test]
async fn create_variant_enforces_axis_range() {
    let h = harness();
    h.catalog
        .create_or_upsert_lens(&h.actor, upsert(astigmatic("TOR-1")))
        .await
        .unwrap();

    let request: CreateVariantRequest =
        serde_json::from_value(json!({"sphere": 1, "cylinder": -1, "axis": 181})).unwrap();
    let err = h
        .catalog
        .create_variant(&h.actor, "TOR-1", request)
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::InvalidLensSpec(ref m) if m.contains("0-180")));
}

#[tokio::test]
async fn multifocal_variant_requires_label() {
    let h = harness();
    let body = json!({
        "title": "Multi",
        "slug": "multi",
        "sku": "MF-1",
        "duration": "monthly",
        "lens_type": "multifocal",
        "price": 30,
        "sph_min": -1,
        "sph_max": -1,
        "addition_scheme": "HL"
    });
    let out = h
        .catalog
        .create_or_upsert_lens(&h.actor, upsert(body))
        .await
        .unwrap();
    assert_eq!(out.product.variants_count, 2);

    let missing: CreateVariantRequest =
        serde_json::from_value(json!({"sphere": 0, "addition_label": "  "})).unwrap();
    let err = h
        .catalog
        .create_variant(&h.actor, "MF-1", missing)
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::InvalidLensSpec(_)));
}

#[tokio::test]
async fn delete_variant_recomputes_availability_and_keeps_product() {
    let h = harness();
    h.catalog
        .create_or_upsert_lens(&h.actor, upsert(spherical("SPH-1")))
        .await
        .unwrap();

    for sphere in ["-6.00", "-5.75", "-5.50", "-5.25", "-5.00"] {
        let request: DeleteVariantRequest =
            serde_json::from_value(json!({ "sphere": sphere })).unwrap();
        h.catalog
            .delete_variant(&h.actor, "SPH-1", request)
            .await
            .unwrap();
    }

    let lens = h.catalog.get_lens("SPH-1").await.unwrap();
    assert_eq!(lens.variants_count, 0);
    assert_eq!(lens.status, "unavailable");

    let request: DeleteVariantRequest = serde_json::from_value(json!({"sphere": -6})).unwrap();
    let err = h
        .catalog
        .delete_variant(&h.actor, "SPH-1", request)
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::NoVariants));
}

#[tokio::test]
async fn delete_variant_reports_missing_signature() {
    let h = harness();
    h.catalog
        .create_or_upsert_lens(&h.actor, upsert(spherical("SPH-1")))
        .await
        .unwrap();

    let request: DeleteVariantRequest =
        serde_json::from_value(json!({"sphere": "-4.00"})).unwrap();
    let err = h
        .catalog
        .delete_variant(&h.actor, "SPH-1", request)
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::VariantNotFound(_)));
}

#[tokio::test]
async fn bulk_update_rejects_duplicates_and_empty_products() {
    let h = harness();
    h.catalog
        .create_or_upsert_lens(&h.actor, upsert(spherical("SPH-1")))
        .await
        .unwrap();

    let dup: BulkUpdateVariantsRequest = serde_json::from_value(json!({
        "variants": [{"sphere": "-1.00"}, {"sphere": -1}]
    }))
    .unwrap();
    let err = h
        .catalog
        .bulk_update_variants(&h.actor, "SPH-1", dup)
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::DuplicateVariant(_)));

    let legacy = ProductDraft {
        sku: "EMPTY".to_string(),
        ean: None,
        slug: "empty".to_string(),
        title_el: "Empty".to_string(),
        title_en: "Empty".to_string(),
        description: None,
        images: Vec::new(),
        price: d("10"),
        compare_at_price: None,
        stock: 0,
        status: "unavailable".to_string(),
        visible: false,
    };
    h.store
        .seed(&legacy, object(json!({"product_type": "contact_lens"})))
        .await;
    let req: BulkUpdateVariantsRequest =
        serde_json::from_value(json!({"variants": [{"sphere": 1}]})).unwrap();
    let err = h
        .catalog
        .bulk_update_variants(&h.actor, "EMPTY", req)
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::NoVariants));
}

#[tokio::test]
async fn unreadable_legacy_entries_are_counted_before_rewrite() {
    let h = harness();
    let draft = ProductDraft {
        sku: "OLD-2".to_string(),
        ean: None,
        slug: "old-2".to_string(),
        title_el: "Old".to_string(),
        title_en: "Old".to_string(),
        description: None,
        images: Vec::new(),
        price: d("12.50"),
        compare_at_price: None,
        stock: 0,
        status: "preorder".to_string(),
        visible: true,
    };
    h.store
        .seed(
            &draft,
            object(json!({
                "product_type": "contact_lens",
                "lens_type": "spherical",
                "variants": [
                    {"sphere": -1.0, "availability": "preorder", "quantity": 0},
                    "junk",
                    {"sphere": "n/a", "availability": "preorder"}
                ]
            })),
        )
        .await;

    let repository = CatalogRepository::new(h.store.clone());
    let loaded = repository.load("OLD-2").await.unwrap().expect("seeded lens");
    assert_eq!(loaded.lossy_variant_entries(), 2);
    assert_eq!(loaded.document.lens.variants.len(), 2);

    let req: CreateVariantRequest =
        serde_json::from_value(json!({"sphere": -2, "availability": "in_stock", "quantity": 1}))
            .unwrap();
    let out = h.catalog.create_variant(&h.actor, "OLD-2", req).await.unwrap();
    assert_eq!(out.variants_total, 3);

    let reloaded = repository.load("OLD-2").await.unwrap().expect("lens");
    assert_eq!(reloaded.lossy_variant_entries(), 0);
}

#[tokio::test]
async fn legacy_record_is_found_and_upgraded_on_edit() {
    let h = harness();
    let draft = ProductDraft {
        sku: "OLD-1".to_string(),
        ean: None,
        slug: "old".to_string(),
        title_el: "Old".to_string(),
        title_en: "Old".to_string(),
        description: None,
        images: Vec::new(),
        price: d("12.50"),
        compare_at_price: None,
        stock: 4,
        status: "preorder".to_string(),
        visible: true,
    };
    h.store
        .seed(
            &draft,
            object(json!({
                "lens_type": "spherical",
                "seo_title": "keep me",
                "variants": [{"sphere": -1.0, "availability": "preorder", "quantity": 0}]
            })),
        )
        .await;

    assert!(h.catalog.list_lenses(false).await.unwrap().is_empty());
    let view = h.catalog.get_variants("OLD-1").await.unwrap();
    assert_eq!(view.variants.len(), 1);

    let request: CreateVariantRequest = serde_json::from_value(json!({"sphere": -1.25})).unwrap();
    h.catalog
        .create_variant(&h.actor, "OLD-1", request)
        .await
        .unwrap();

    let stored = h.store.get("OLD-1").await.unwrap();
    assert_eq!(stored.attributes["product_type"], json!("contact_lens"));
    assert_eq!(stored.attributes["seo_title"], json!("keep me"));
    assert_eq!(stored.stock, 4);
    assert_eq!(h.catalog.list_lenses(false).await.unwrap().len(), 1);
}

#[tokio::test]
async fn delete_lens_ignores_untyped_products() {
    let h = harness();
    let draft = ProductDraft {
        sku: "FRAME-1".to_string(),
        ean: None,
        slug: "frame".to_string(),
        title_el: "Frame".to_string(),
        title_en: "Frame".to_string(),
        description: None,
        images: Vec::new(),
        price: d("80"),
        compare_at_price: None,
        stock: 1,
        status: "in_stock".to_string(),
        visible: true,
    };
    h.store.seed(&draft, Map::new()).await;

    let err = h
        .catalog
        .delete_lens(&h.actor, "FRAME-1", None)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert!(h.store.get("FRAME-1").await.is_some());

    h.catalog
        .create_or_upsert_lens(&h.actor, upsert(spherical("SPH-1")))
        .await
        .unwrap();
    let out = h.catalog.delete_lens(&h.actor, "SPH-1", Some(1)).await.unwrap();
    assert!(out.ok);
    assert!(h.store.get("SPH-1").await.is_none());
    let last = h.audit.events().await.pop().unwrap();
    assert_eq!(last.action, AuditAction::ContactLensDelete);
}

#[tokio::test]
async fn stale_expected_version_is_a_conflict() {
    let h = harness();
    h.catalog
        .create_or_upsert_lens(&h.actor, upsert(spherical("SPH-1")))
        .await
        .unwrap();
    h.catalog
        .create_or_upsert_lens(&h.actor, upsert(spherical("SPH-1")))
        .await
        .unwrap();

    let body = with(spherical("SPH-1"), "expected_version", json!(1));
    let err = h
        .catalog
        .update_lens(&h.actor, "SPH-1", update(body))
        .await
        .unwrap_err();
    assert!(
        matches!(err, CatalogError::VersionConflict { expected: 1, actual: 2 }),
        "got {err:?}"
    );
}

#[tokio::test]
async fn strict_mode_requires_expected_version_for_existing_products() {
    let h = harness_with(
        CatalogSettings {
            require_expected_version: true,
        },
        MemoryAuditSink::new(),
    );
    h.catalog
        .create_or_upsert_lens(&h.actor, upsert(spherical("SPH-1")))
        .await
        .unwrap();

    let err = h
        .catalog
        .delete_lens(&h.actor, "SPH-1", None)
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::ExpectedVersionRequired));

    let body = with(spherical("SPH-1"), "expected_version", json!(1));
    let out = h
        .catalog
        .update_lens(&h.actor, "SPH-1", update(body))
        .await
        .unwrap();
    assert_eq!(out.product.version, 2);
}

#[tokio::test]
async fn audit_failure_does_not_undo_the_mutation() {
    let h = harness_with(CatalogSettings::default(), MemoryAuditSink::failing());
    let out = h
        .catalog
        .create_or_upsert_lens(&h.actor, upsert(spherical("SPH-1")))
        .await
        .unwrap();

    assert!(out.created);
    assert!(h.store.get("SPH-1").await.is_some());
}

#[tokio::test]
async fn store_failure_propagates() {
    let h = harness();
    h.store.set_offline(true);
    let err = h.catalog.list_lenses(false).await.unwrap_err();
    assert!(matches!(err, CatalogError::Store(_)));
    assert!(h.catalog.health().await.is_err());
}

#[tokio::test]
async fn regeneration_is_deterministic() {
    let h = harness();
    h.catalog
        .create_or_upsert_lens(&h.actor, upsert(astigmatic("TOR-1")))
        .await
        .unwrap();
    let first = h.catalog.get_variants("TOR-1").await.unwrap().variants;

    h.catalog
        .create_or_upsert_lens(&h.actor, upsert(astigmatic("TOR-1")))
        .await
        .unwrap();
    let second = h.catalog.get_variants("TOR-1").await.unwrap().variants;
    assert_eq!(first, second);
}
