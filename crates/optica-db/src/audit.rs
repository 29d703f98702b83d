//! Database operations for `admin_audit_logs`.

use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgPool;

use crate::DbError;

/// A row from the `admin_audit_logs` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AuditLogRow {
    pub id: i64,
    pub actor: String,
    pub action: String,
    pub resource_type: String,
    pub resource_id: Option<String>,
    pub metadata: Value,
    pub created_at: DateTime<Utc>,
}

/// Values for a new audit entry.
#[derive(Debug, Clone)]
pub struct NewAuditLog<'a> {
    pub actor: &'a str,
    pub action: &'a str,
    pub resource_type: &'a str,
    pub resource_id: Option<&'a str>,
    pub metadata: &'a Value,
}

/// Appends one audit entry and returns its id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_audit_log(pool: &PgPool, entry: &NewAuditLog<'_>) -> Result<i64, DbError> {
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO admin_audit_logs (actor, action, resource_type, resource_id, metadata) \
         VALUES ($1, $2, $3, $4, $5::jsonb) \
         RETURNING id",
    )
    .bind(entry.actor)
    .bind(entry.action)
    .bind(entry.resource_type)
    .bind(entry.resource_id)
    .bind(entry.metadata)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// Returns the newest entries for one resource, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_audit_logs_for_resource(
    pool: &PgPool,
    resource_type: &str,
    resource_id: &str,
    limit: i64,
) -> Result<Vec<AuditLogRow>, DbError> {
    let rows = sqlx::query_as::<_, AuditLogRow>(
        "SELECT id, actor, action, resource_type, resource_id, metadata, created_at \
         FROM admin_audit_logs \
         WHERE resource_type = $1 AND resource_id = $2 \
         ORDER BY created_at DESC, id DESC \
         LIMIT $3",
    )
    .bind(resource_type)
    .bind(resource_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
