//! Audit trail for committed catalog mutations.

use std::fmt;

use serde::Serialize;
use serde_json::Value;
use sqlx::PgPool;
use tokio::sync::Mutex;

use crate::StoreError;

pub const PRODUCT_RESOURCE: &str = "product";

/// Who is performing an operation. Resolved by the transport layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Actor(String);

impl Actor {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    ContactLensCreate,
    ContactLensUpdate,
    ContactLensVariantCreate,
    ContactLensVariantsUpdate,
    ContactLensVariantDelete,
    ContactLensDelete,
}

impl AuditAction {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AuditAction::ContactLensCreate => "contact_lens_create",
            AuditAction::ContactLensUpdate => "contact_lens_update",
            AuditAction::ContactLensVariantCreate => "contact_lens_variant_create",
            AuditAction::ContactLensVariantsUpdate => "contact_lens_variants_update",
            AuditAction::ContactLensVariantDelete => "contact_lens_variant_delete",
            AuditAction::ContactLensDelete => "contact_lens_delete",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditEvent {
    pub actor: Actor,
    pub action: AuditAction,
    pub resource_type: &'static str,
    /// Product id, as text.
    pub resource_id: Option<String>,
    pub metadata: Value,
}

impl AuditEvent {
    #[must_use]
    pub fn product(actor: &Actor, action: AuditAction, product_id: i64, metadata: Value) -> Self {
        Self {
            actor: actor.clone(),
            action,
            resource_type: PRODUCT_RESOURCE,
            resource_id: Some(product_id.to_string()),
            metadata,
        }
    }
}

#[async_trait::async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, event: &AuditEvent) -> Result<(), StoreError>;
}

/// Writes to `admin_audit_logs`.
#[derive(Debug, Clone)]
pub struct PgAuditSink {
    pool: PgPool,
}

impl PgAuditSink {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl AuditSink for PgAuditSink {
    async fn record(&self, event: &AuditEvent) -> Result<(), StoreError> {
        let entry = optica_db::NewAuditLog {
            actor: event.actor.name(),
            action: event.action.as_str(),
            resource_type: event.resource_type,
            resource_id: event.resource_id.as_deref(),
            metadata: &event.metadata,
        };
        optica_db::insert_audit_log(&self.pool, &entry).await?;
        Ok(())
    }
}

/// Emits each event as a structured log line.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditSink;

#[async_trait::async_trait]
impl AuditSink for TracingAuditSink {
    async fn record(&self, event: &AuditEvent) -> Result<(), StoreError> {
        tracing::info!(
            target: "optica::audit",
            actor = %event.actor,
            action = %event.action,
            resource_type = event.resource_type,
            resource_id = event.resource_id.as_deref().unwrap_or("-"),
            metadata = %event.metadata,
            "audit"
        );
        Ok(())
    }
}

/// Keeps events in memory. Can be switched to failing mode to exercise the
/// "audit failure does not undo the mutation" path.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    events: Mutex<Vec<AuditEvent>>,
    failing: bool,
}

impl MemoryAuditSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn failing() -> Self {
        Self {
            events: Mutex::default(),
            failing: true,
        }
    }

    pub async fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().await.clone()
    }
}

#[async_trait::async_trait]
impl AuditSink for MemoryAuditSink {
    async fn record(&self, event: &AuditEvent) -> Result<(), StoreError> {
        if self.failing {
            return Err(StoreError::Unavailable("audit sink rejected event".to_string()));
        }
        self.events.lock().await.push(event.clone());
        Ok(())
    }
}
