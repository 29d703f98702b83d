//! `lens` subcommands.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use optica_catalog::{CatalogSettings, LensCatalog, PgProductStore, TracingAuditSink};
use optica_core::{
    aggregate_availability, generate_variants, validate_lens, AppConfig, LensError, LensPayload,
    LensType, ProductAvailability, VariantSummary,
};
use rust_decimal::Decimal;

/// What a payload would produce if it were saved.
#[derive(Debug)]
pub(crate) struct LensPreview {
    pub lens_type: LensType,
    pub variants: usize,
    pub availability: ProductAvailability,
    pub summary: VariantSummary,
    pub additions: Vec<String>,
}

pub(crate) fn preview(payload: &LensPayload) -> Result<LensPreview, LensError> {
    let spec = validate_lens(payload)?;
    let variants = generate_variants(&spec);
    let mut additions: Vec<String> = Vec::new();
    for label in variants.iter().filter_map(|v| v.addition_label.as_ref()) {
        if !additions.contains(label) {
            additions.push(label.clone());
        }
    }
    Ok(LensPreview {
        lens_type: spec.lens_type(),
        variants: variants.len(),
        availability: aggregate_availability(&variants),
        summary: VariantSummary::of(&variants),
        additions,
    })
}

fn join_decimals(values: &[Decimal]) -> String {
    if values.is_empty() {
        return "-".to_string();
    }
    values
        .iter()
        .map(|v| format!("{v:.2}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Reads a payload file and prints the generated grid without saving it.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or the payload
/// breaks a lens rule.
pub(crate) fn run_lens_preview(path: &Path) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let payload: LensPayload = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a valid lens payload", path.display()))?;
    let preview = preview(&payload)?;

    println!("sku:          {}", payload.sku);
    println!("lens type:    {}", preview.lens_type);
    println!("variants:     {}", preview.variants);
    println!(
        "availability: {} (visible: {})",
        preview.availability.availability, preview.availability.visible
    );
    println!("sphere:       {}", join_decimals(&preview.summary.sphere));
    println!("cylinder:     {}", join_decimals(&preview.summary.cylinder));
    let axes: Vec<String> = preview.summary.axis.iter().map(ToString::to_string).collect();
    println!(
        "axis:         {}",
        if axes.is_empty() { "-".to_string() } else { axes.join(", ") }
    );
    if !preview.additions.is_empty() {
        println!("additions:    {}", preview.additions.join(", "));
    }
    Ok(())
}

/// # Errors
///
/// Returns an error if the database query fails.
pub(crate) async fn run_lens_list(
    pool: sqlx::PgPool,
    config: &AppConfig,
    available_only: bool,
) -> anyhow::Result<()> {
    let catalog = LensCatalog::new(
        Arc::new(PgProductStore::new(pool)),
        Arc::new(TracingAuditSink),
        CatalogSettings::from_app_config(config),
    );
    let lenses = catalog.list_lenses(available_only).await?;

    if lenses.is_empty() {
        println!("no contact lenses found");
        return Ok(());
    }

    println!(
        "{:<20}{:<14}{:<14}{:>10}{:>9}  TITLE",
        "SKU", "TYPE", "STATUS", "VARIANTS", "VERSION"
    );
    for lens in &lenses {
        println!(
            "{:<20}{:<14}{:<14}{:>10}{:>9}  {}",
            lens.sku,
            lens.lens_type.as_deref().unwrap_or("-"),
            lens.availability,
            lens.variants_count,
            lens.version,
            lens.title.en
        );
    }

    Ok(())
}
