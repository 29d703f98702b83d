//! The catalog operations offered to the HTTP layer and CLI.
//!
//! Each call is one read-modify-write: load, validate, compute, then a single
//! version-guarded save. Nothing is written until every check has passed.

use std::sync::Arc;

use optica_core::{
    check_lens_type_change, generate_variants, prepare_variant, validate_lens, AppConfig,
    AttributeDocument, Availability, LensPayload, LensRecord, LensVariantsView, LensView,
    NewVariant, ProductAvailability, ProductDraft, Variant, VariantDraft, VariantIndex, VariantKey,
    VariantSignature,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, error, info};

use crate::audit::{Actor, AuditAction, AuditEvent, AuditSink};
use crate::repository::CatalogRepository;
use crate::{CatalogError, ProductStore, StoreError};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CatalogSettings {
    /// Refuse mutations of existing products that carry no `expected_version`.
    pub require_expected_version: bool,
}

impl CatalogSettings {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            require_expected_version: config.require_expected_version,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpsertLensRequest {
    #[serde(flatten)]
    pub lens: LensPayload,
    #[serde(default)]
    pub expected_version: Option<i32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateLensRequest {
    #[serde(flatten)]
    pub lens: LensPayload,
    #[serde(default)]
    pub regenerate_variants: bool,
    #[serde(default)]
    pub expected_version: Option<i32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateVariantRequest {
    #[serde(flatten)]
    pub variant: NewVariant,
    #[serde(default)]
    pub expected_version: Option<i32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BulkUpdateVariantsRequest {
    pub variants: Vec<VariantDraft>,
    #[serde(default)]
    pub expected_version: Option<i32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeleteVariantRequest {
    #[serde(flatten)]
    pub key: VariantKey,
    #[serde(default)]
    pub expected_version: Option<i32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpsertLensResponse {
    pub created: bool,
    pub product: LensView,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateLensResponse {
    pub ok: bool,
    pub product: LensView,
    pub regenerated: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateVariantResponse {
    pub ok: bool,
    pub variant: Variant,
    pub variants_total: usize,
    pub availability: Availability,
    pub version: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct BulkUpdateVariantsResponse {
    pub ok: bool,
    pub updated_count: usize,
    pub availability: Availability,
    pub variants_total: usize,
    pub version: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteVariantResponse {
    pub ok: bool,
    pub sku: String,
    pub variants_remaining: usize,
    pub availability: Availability,
    pub version: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteLensResponse {
    pub ok: bool,
    pub sku: String,
}

#[derive(Clone)]
pub struct LensCatalog {
    repo: CatalogRepository,
    audit: Arc<dyn AuditSink>,
    settings: CatalogSettings,
}

impl LensCatalog {
    #[must_use]
    pub fn new(
        store: Arc<dyn ProductStore>,
        audit: Arc<dyn AuditSink>,
        settings: CatalogSettings,
    ) -> Self {
        Self {
            repo: CatalogRepository::new(store),
            audit,
            settings,
        }
    }

    /// # Errors
    ///
    /// Returns [`StoreError`] if the backing store is unreachable.
    pub async fn health(&self) -> Result<(), StoreError> {
        self.repo.ping().await
    }

    /// Validates the payload, regenerates the full variant grid and writes
    /// it: a new row when the SKU is unknown, otherwise an in-place upsert.
    ///
    /// # Errors
    ///
    /// Domain errors from validation, [`CatalogError::VersionConflict`] on a
    /// stale `expected_version` or lost race, [`CatalogError::Store`].
    pub async fn create_or_upsert_lens(
        &self,
        actor: &Actor,
        request: UpsertLensRequest,
    ) -> Result<UpsertLensResponse, CatalogError> {
        let payload = request.lens;
        let spec = validate_lens(&payload)?;
        let existing = self.repo.load(&payload.sku).await?;
        if let Some(current) = &existing {
            self.check_version(current, request.expected_version)?;
        }

        let mut document = existing
            .as_ref()
            .map(|r| r.document.clone())
            .unwrap_or_default();
        document.lens.apply_payload(&payload);
        let aggregate = document.lens.set_variants(generate_variants(&spec));
        let draft =
            ProductDraft::for_lens(&payload, existing.as_ref().map(|r| &r.product), aggregate);

        let created = existing.is_none();
        let saved = match &existing {
            None => self.repo.create(&draft, &document).await?,
            Some(current) => self.repo.save(current, &draft, &document.lens_patch()).await?,
        };

        let variants = saved.document.lens.variants.len();
        info!(
            sku = %payload.sku,
            lens_type = %spec.lens_type(),
            variants,
            availability = %aggregate.availability,
            created,
            "contact lens saved"
        );
        let action = if created {
            AuditAction::ContactLensCreate
        } else {
            AuditAction::ContactLensUpdate
        };
        self.audit(AuditEvent::product(
            actor,
            action,
            saved.product.id,
            json!({
                "sku": payload.sku,
                "slug": saved.product.slug,
                "status": saved.product.status,
                "lens_type": spec.lens_type(),
                "variants_count": variants,
                "created": created,
            }),
        ))
        .await;

        Ok(UpsertLensResponse {
            created,
            product: LensView::from(&saved),
        })
    }

    /// # Errors
    ///
    /// Returns [`CatalogError::Store`] if the store fails.
    pub async fn list_lenses(&self, available_only: bool) -> Result<Vec<LensView>, CatalogError> {
        let records = self.repo.list(available_only).await?;
        Ok(records.iter().map(LensView::from).collect())
    }

    /// # Errors
    ///
    /// [`CatalogError::LensNotFound`], [`CatalogError::Store`].
    pub async fn get_lens(&self, sku: &str) -> Result<LensView, CatalogError> {
        let record = self.require(sku).await?;
        Ok(LensView::from(&record))
    }

    /// Rewrites the lens description. Variants are regenerated only on
    /// request; a lens type change without regeneration is refused.
    ///
    /// # Errors
    ///
    /// Domain errors from validation, [`CatalogError::SkuMismatch`],
    /// [`CatalogError::LensTypeChangeBlocked`],
    /// [`CatalogError::LensNotFound`], [`CatalogError::VersionConflict`],
    /// [`CatalogError::Store`].
    pub async fn update_lens(
        &self,
        actor: &Actor,
        sku: &str,
        request: UpdateLensRequest,
    ) -> Result<UpdateLensResponse, CatalogError> {
        let payload = request.lens;
        let regenerate = request.regenerate_variants;
        if payload.sku != sku {
            return Err(CatalogError::SkuMismatch {
                path: sku.to_string(),
                payload: payload.sku,
            });
        }
        let spec = validate_lens(&payload)?;
        let current = self.require(sku).await?;
        self.check_version(&current, request.expected_version)?;
        check_lens_type_change(
            current.document.lens.lens_type.as_deref(),
            payload.lens_type,
            regenerate,
        )
        .inspect_err(|err| debug!(sku, %err, "lens type change refused"))?;

        let mut document = current.document.clone();
        document.lens.apply_payload(&payload);
        let aggregate = if regenerate {
            document.lens.set_variants(generate_variants(&spec))
        } else {
            document.lens.refresh_availability()
        };
        let draft = ProductDraft::for_lens_update(&payload, &current.product, aggregate);
        let saved = self
            .repo
            .save(&current, &draft, &document.lens_patch())
            .await?;

        let variants_total = saved.document.lens.variants.len();
        info!(sku, regenerated = regenerate, variants_total, "contact lens updated");
        self.audit(AuditEvent::product(
            actor,
            AuditAction::ContactLensUpdate,
            saved.product.id,
            json!({
                "sku": sku,
                "regenerated": regenerate,
                "variants_total": variants_total,
            }),
        ))
        .await;

        Ok(UpdateLensResponse {
            ok: true,
            product: LensView::from(&saved),
            regenerated: regenerate,
        })
    }

    /// # Errors
    ///
    /// [`CatalogError::LensNotFound`], [`CatalogError::Store`].
    pub async fn get_variants(&self, sku: &str) -> Result<LensVariantsView, CatalogError> {
        let record = self.require(sku).await?;
        Ok(LensVariantsView::from(&record))
    }

    /// Appends one variant after checking it against the lens family's
    /// field requirements and the existing signatures.
    ///
    /// # Errors
    ///
    /// [`CatalogError::InvalidLensSpec`], [`CatalogError::UnsupportedLensType`],
    /// [`CatalogError::DuplicateVariant`], [`CatalogError::LensNotFound`],
    /// [`CatalogError::VersionConflict`], [`CatalogError::Store`].
    pub async fn create_variant(
        &self,
        actor: &Actor,
        sku: &str,
        request: CreateVariantRequest,
    ) -> Result<CreateVariantResponse, CatalogError> {
        let current = self.require(sku).await?;
        self.check_version(&current, request.expected_version)?;

        let lens = &current.document.lens;
        let variant = prepare_variant(lens.lens_type()?, lens.addition_scheme(), request.variant)?;
        let signature = VariantSignature::of(&variant);
        if VariantIndex::build(&lens.variants).contains(&signature) {
            debug!(sku, %signature, "duplicate variant refused");
            return Err(CatalogError::DuplicateVariant(signature));
        }

        let mut document = current.document.clone();
        document.lens.variants.push(variant.clone());
        let aggregate = document.lens.refresh_availability();
        let saved = self.save_variants(&current, &document, aggregate).await?;

        let variants_total = saved.document.lens.variants.len();
        info!(sku, %signature, variants_total, "variant added");
        self.audit(AuditEvent::product(
            actor,
            AuditAction::ContactLensVariantCreate,
            saved.product.id,
            json!({
                "sku": sku,
                "variant": signature,
                "variants_total": variants_total,
            }),
        ))
        .await;

        Ok(CreateVariantResponse {
            ok: true,
            variant,
            variants_total,
            availability: aggregate.availability,
            version: saved.product.version,
        })
    }

    /// Replaces the whole variant list.
    ///
    /// # Errors
    ///
    /// [`CatalogError::NoVariants`] when the lens has none to replace,
    /// [`CatalogError::DuplicateVariant`] when the new list repeats a
    /// signature, plus the usual load/save errors.
    pub async fn bulk_update_variants(
        &self,
        actor: &Actor,
        sku: &str,
        request: BulkUpdateVariantsRequest,
    ) -> Result<BulkUpdateVariantsResponse, CatalogError> {
        let current = self.require(sku).await?;
        self.check_version(&current, request.expected_version)?;
        if current.document.lens.variants.is_empty() {
            return Err(CatalogError::NoVariants);
        }

        let variants: Vec<Variant> = request.variants.into_iter().map(Variant::from).collect();
        if let Some(signature) = VariantIndex::first_duplicate(&variants) {
            debug!(sku, %signature, "duplicate in replacement list");
            return Err(CatalogError::DuplicateVariant(signature));
        }
        let updated_count = variants.len();

        let mut document = current.document.clone();
        let aggregate = document.lens.set_variants(variants);
        let saved = self.save_variants(&current, &document, aggregate).await?;

        let variants_total = saved.document.lens.variants.len();
        info!(
            sku,
            updated_count,
            availability = %aggregate.availability,
            "variants replaced"
        );
        self.audit(AuditEvent::product(
            actor,
            AuditAction::ContactLensVariantsUpdate,
            saved.product.id,
            json!({
                "sku": sku,
                "updated_count": updated_count,
                "variants_total": variants_total,
                "availability": aggregate.availability,
            }),
        ))
        .await;

        Ok(BulkUpdateVariantsResponse {
            ok: true,
            updated_count,
            availability: aggregate.availability,
            variants_total,
            version: saved.product.version,
        })
    }

    /// Removes the first variant whose signature matches `request.key`. The
    /// product itself is kept even when its last variant goes.
    ///
    /// # Errors
    ///
    /// [`CatalogError::NoVariants`], [`CatalogError::VariantNotFound`], plus
    /// the usual load/save errors.
    pub async fn delete_variant(
        &self,
        actor: &Actor,
        sku: &str,
        request: DeleteVariantRequest,
    ) -> Result<DeleteVariantResponse, CatalogError> {
        let current = self.require(sku).await?;
        self.check_version(&current, request.expected_version)?;
        if current.document.lens.variants.is_empty() {
            return Err(CatalogError::NoVariants);
        }

        let signature = VariantSignature::of(&request.key);
        let position = VariantIndex::build(&current.document.lens.variants)
            .position(&signature)
            .ok_or_else(|| CatalogError::VariantNotFound(signature.clone()))?;

        let mut document = current.document.clone();
        document.lens.variants.remove(position);
        let aggregate = document.lens.refresh_availability();
        let saved = self.save_variants(&current, &document, aggregate).await?;

        let variants_remaining = saved.document.lens.variants.len();
        info!(sku, %signature, variants_remaining, "variant deleted");
        self.audit(AuditEvent::product(
            actor,
            AuditAction::ContactLensVariantDelete,
            saved.product.id,
            json!({
                "sku": sku,
                "variant_deleted": signature,
                "variants_remaining": variants_remaining,
            }),
        ))
        .await;

        Ok(DeleteVariantResponse {
            ok: true,
            sku: sku.to_string(),
            variants_remaining,
            availability: aggregate.availability,
            version: saved.product.version,
        })
    }

    /// Removes the product row. Only records typed `contact_lens` qualify.
    ///
    /// # Errors
    ///
    /// [`CatalogError::LensNotFound`], [`CatalogError::VersionConflict`],
    /// [`CatalogError::Store`].
    pub async fn delete_lens(
        &self,
        actor: &Actor,
        sku: &str,
        expected_version: Option<i32>,
    ) -> Result<DeleteLensResponse, CatalogError> {
        let current = self
            .repo
            .load_typed(sku)
            .await?
            .ok_or_else(|| CatalogError::LensNotFound(sku.to_string()))?;
        self.check_version(&current, expected_version)?;
        self.repo.delete(&current).await?;

        info!(sku, "contact lens deleted");
        self.audit(AuditEvent::product(
            actor,
            AuditAction::ContactLensDelete,
            current.product.id,
            json!({ "sku": sku, "slug": current.product.slug }),
        ))
        .await;

        Ok(DeleteLensResponse {
            ok: true,
            sku: sku.to_string(),
        })
    }

    async fn require(&self, sku: &str) -> Result<LensRecord, CatalogError> {
        self.repo
            .load(sku)
            .await?
            .ok_or_else(|| CatalogError::LensNotFound(sku.to_string()))
    }

    async fn save_variants(
        &self,
        current: &LensRecord,
        document: &AttributeDocument,
        aggregate: ProductAvailability,
    ) -> Result<LensRecord, CatalogError> {
        let draft = ProductDraft::with_availability(&current.product, aggregate);
        self.repo
            .save(current, &draft, &document.variants_patch())
            .await
    }

    fn check_version(&self, current: &LensRecord, expected: Option<i32>) -> Result<(), CatalogError> {
        let actual = current.product.version;
        match expected {
            Some(expected) if expected != actual => {
                debug!(sku = %current.product.sku, expected, actual, "stale expected_version");
                Err(CatalogError::VersionConflict { expected, actual })
            }
            Some(_) => Ok(()),
            None if self.settings.require_expected_version => {
                Err(CatalogError::ExpectedVersionRequired)
            }
            None => Ok(()),
        }
    }

    async fn audit(&self, event: AuditEvent) {
        if let Err(err) = self.audit.record(&event).await {
            error!(
                action = %event.action,
                resource_id = event.resource_id.as_deref().unwrap_or("-"),
                error = %err,
                "failed to record audit event"
            );
        }
    }
}
