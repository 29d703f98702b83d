//! Contact-lens catalog engine.
//!
//! [`LensCatalog`] runs each admin operation as a validated, version-guarded
//! read-modify-write over a [`ProductStore`], and reports every committed
//! change to an [`AuditSink`].

pub mod audit;
pub mod error;
pub mod memory;
pub mod pg;
pub mod repository;
pub mod service;
pub mod store;

pub use audit::{
    Actor, AuditAction, AuditEvent, AuditSink, MemoryAuditSink, PgAuditSink, TracingAuditSink,
};
pub use error::{CatalogError, StoreError};
pub use memory::MemoryProductStore;
pub use pg::PgProductStore;
pub use repository::CatalogRepository;
pub use service::{
    BulkUpdateVariantsRequest, BulkUpdateVariantsResponse, CatalogSettings, CreateVariantRequest,
    CreateVariantResponse, DeleteLensResponse, DeleteVariantRequest, DeleteVariantResponse,
    LensCatalog, UpdateLensRequest, UpdateLensResponse, UpsertLensRequest, UpsertLensResponse,
};
pub use store::ProductStore;
