use optica_core::{LensError, LensType, VariantSignature};
use optica_db::DbError;
use thiserror::Error;

/// Failures of a [`crate::ProductStore`] or [`crate::AuditSink`] backend.
///
/// Lost compare-and-swap races are not errors at this level; stores report
/// them through `Option`/`bool` returns and the repository turns them into
/// [`CatalogError::VersionConflict`].
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Db(#[from] DbError),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Every way a catalog operation can be refused.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("invalid lens specification: {0}")]
    InvalidLensSpec(String),
    #[error("changing lens type from '{from}' to '{to}' requires variant regeneration")]
    LensTypeChangeBlocked { from: String, to: LensType },
    #[error("variant already exists for this lens ({0})")]
    DuplicateVariant(VariantSignature),
    #[error("contact lens not found: {0}")]
    LensNotFound(String),
    #[error("variant not found ({0})")]
    VariantNotFound(VariantSignature),
    #[error("unsupported lens type: {0}")]
    UnsupportedLensType(String),
    #[error("payload sku '{payload}' does not match '{path}'")]
    SkuMismatch { path: String, payload: String },
    #[error("product has no variants")]
    NoVariants,
    #[error("version conflict: expected {expected}, found {actual}")]
    VersionConflict { expected: i32, actual: i32 },
    #[error("expected_version is required for this operation")]
    ExpectedVersionRequired,
    #[error("storage failure: {0}")]
    Store(#[from] StoreError),
}

impl CatalogError {
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::LensNotFound(_) | Self::VariantNotFound(_))
    }
}

impl From<LensError> for CatalogError {
    fn from(err: LensError) -> Self {
        match err {
            LensError::InvalidLensSpec(msg) => Self::InvalidLensSpec(msg),
            LensError::LensTypeChangeBlocked { from, to } => {
                Self::LensTypeChangeBlocked { from, to }
            }
            LensError::DuplicateVariant(sig) => Self::DuplicateVariant(sig),
            LensError::UnsupportedLensType(t) => Self::UnsupportedLensType(t),
        }
    }
}

impl From<DbError> for CatalogError {
    fn from(err: DbError) -> Self {
        Self::Store(StoreError::Db(err))
    }
}
