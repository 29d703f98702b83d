//! Domain core for the contact-lens variant catalog.
//!
//! Everything in this crate is pure: payload validation, variant generation,
//! signature matching, availability aggregation and the typed attribute
//! document. Persistence and transport live in the sibling crates.

pub mod app_config;
pub mod attributes;
pub mod availability;
pub mod config;
pub mod generate;
pub mod lens;
pub(crate) mod lenient;
pub mod product;
pub mod range;
pub mod signature;
pub mod validate;
pub mod variant;
pub mod view;

use thiserror::Error;

pub use app_config::{ApiKey, AppConfig, Environment};
pub use attributes::{merge_document, AttributeDocument, LensAttributes, CONTACT_LENS_PRODUCT_TYPE};
pub use availability::{aggregate_availability, ProductAvailability};
pub use config::{load_app_config, load_app_config_from_env, DEFAULT_API_ACTOR};
pub use generate::{addition_set, generate_variants, Addition};
pub use lens::{
    AdditionScheme, AstigmaticRanges, Availability, DiopterRange, LensDuration, LensFamily,
    LensPayload, LensSpec, LensType, MultifocalRanges, SphericalRanges,
};
pub use product::{LensRecord, ProductDraft, ProductRecord};
pub use range::{decimal_range, decimal_steps, DecimalSteps};
pub use signature::{OpticalParams, VariantIndex, VariantSignature};
pub use validate::{check_lens_type_change, prepare_variant, validate_lens};
pub use variant::{NewVariant, Variant, VariantDraft, VariantKey};
pub use view::{sort_variants, LensVariantsView, LensView, LocalizedTitle, VariantSummary};

/// Violations of the lens domain rules. Every variant maps to a client error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LensError {
    #[error("invalid lens specification: {0}")]
    InvalidLensSpec(String),
    #[error("changing lens type from '{from}' to '{to}' requires variant regeneration")]
    LensTypeChangeBlocked { from: String, to: LensType },
    #[error("variant already exists for this lens ({0})")]
    DuplicateVariant(VariantSignature),
    #[error("unsupported lens type: {0}")]
    UnsupportedLensType(String),
}

impl LensError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidLensSpec(message.into())
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
