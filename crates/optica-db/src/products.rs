//! Database operations for the shared `products` table.
//!
//! Writes are version-guarded: every update and delete names the version it
//! was computed from, and affects zero rows when another writer got there
//! first. Attribute writes merge a patch over the stored document
//! (`attributes || patch`) rather than replacing it.

use chrono::{DateTime, Utc};
use optica_core::{ProductDraft, ProductRecord};
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use sqlx::PgPool;

use crate::DbError;

/// A row from the `products` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductRow {
    pub id: i64,
    pub sku: String,
    pub ean: Option<String>,
    pub slug: String,
    pub title_el: String,
    pub title_en: String,
    pub description: Option<String>,
    /// JSON array of image URLs.
    pub images: Value,
    pub price: Decimal,
    pub compare_at_price: Option<Decimal>,
    /// JSON object shared by every subsystem that annotates products.
    pub attributes: Value,
    pub stock: i32,
    pub status: String,
    pub visible: bool,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ProductRow> for ProductRecord {
    fn from(row: ProductRow) -> Self {
        let images = match row.images {
            Value::Array(items) => items
                .into_iter()
                .filter_map(|v| match v {
                    Value::String(s) => Some(s),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        };
        let attributes = match row.attributes {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        ProductRecord {
            id: row.id,
            sku: row.sku,
            ean: row.ean,
            slug: row.slug,
            title_el: row.title_el,
            title_en: row.title_en,
            description: row.description,
            images,
            price: row.price,
            compare_at_price: row.compare_at_price,
            stock: row.stock,
            status: row.status,
            visible: row.visible,
            version: row.version,
            attributes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Returns the live product with `sku`, whatever its type.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_product_by_sku(pool: &PgPool, sku: &str) -> Result<Option<ProductRow>, DbError> {
    let row = sqlx::query_as::<_, ProductRow>(
        "SELECT id, sku, ean, slug, title_el, title_en, description, images, price, \
                compare_at_price, attributes, stock, status, visible, version, \
                created_at, updated_at \
         FROM products \
         WHERE sku = $1 AND deleted_at IS NULL",
    )
    .bind(sku)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Returns the live product with `sku` whose `attributes.product_type`
/// equals `product_type`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_product_by_sku_and_type(
    pool: &PgPool,
    sku: &str,
    product_type: &str,
) -> Result<Option<ProductRow>, DbError> {
    let row = sqlx::query_as::<_, ProductRow>(
        "SELECT id, sku, ean, slug, title_el, title_en, description, images, price, \
                compare_at_price, attributes, stock, status, visible, version, \
                created_at, updated_at \
         FROM products \
         WHERE sku = $1 \
           AND attributes->>'product_type' = $2 \
           AND deleted_at IS NULL",
    )
    .bind(sku)
    .bind(product_type)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Lists live products of one type, most recently updated first.
///
/// When `availability` is set, only rows whose `attributes.availability`
/// equals it are returned.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_products_by_type(
    pool: &PgPool,
    product_type: &str,
    availability: Option<&str>,
) -> Result<Vec<ProductRow>, DbError> {
    let rows = sqlx::query_as::<_, ProductRow>(
        "SELECT id, sku, ean, slug, title_el, title_en, description, images, price, \
                compare_at_price, attributes, stock, status, visible, version, \
                created_at, updated_at \
         FROM products \
         WHERE attributes->>'product_type' = $1 \
           AND ($2::TEXT IS NULL OR attributes->>'availability' = $2) \
           AND deleted_at IS NULL \
         ORDER BY updated_at DESC, id DESC",
    )
    .bind(product_type)
    .bind(availability)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Inserts a new product at version 1.
///
/// Returns `None` when the SKU is already taken.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails for any other reason.
pub async fn insert_product(
    pool: &PgPool,
    draft: &ProductDraft,
    attributes: &Map<String, Value>,
) -> Result<Option<ProductRow>, DbError> {
    let row = sqlx::query_as::<_, ProductRow>(
        "INSERT INTO products \
             (sku, ean, slug, title_el, title_en, description, images, price, \
              compare_at_price, attributes, stock, status, visible, version) \
         VALUES ($1, $2, $3, $4, $5, $6, $7::jsonb, $8, \
                 $9, $10::jsonb, $11, $12, $13, 1) \
         ON CONFLICT (sku) DO NOTHING \
         RETURNING id, sku, ean, slug, title_el, title_en, description, images, price, \
                   compare_at_price, attributes, stock, status, visible, version, \
                   created_at, updated_at",
    )
    .bind(&draft.sku)
    .bind(&draft.ean)
    .bind(&draft.slug)
    .bind(&draft.title_el)
    .bind(&draft.title_en)
    .bind(&draft.description)
    .bind(images_json(&draft.images))
    .bind(draft.price)
    .bind(draft.compare_at_price)
    .bind(Value::Object(attributes.clone()))
    .bind(draft.stock)
    .bind(&draft.status)
    .bind(draft.visible)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Overwrites base columns, merges `patch` into `attributes`, and bumps
/// `version` by one, but only if the row is still at `expected_version`.
///
/// Returns `None` when the row was concurrently modified or removed.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn update_product_if_version(
    pool: &PgPool,
    id: i64,
    expected_version: i32,
    draft: &ProductDraft,
    patch: &Map<String, Value>,
) -> Result<Option<ProductRow>, DbError> {
    let row = sqlx::query_as::<_, ProductRow>(
        "UPDATE products SET \
             ean              = $3, \
             slug             = $4, \
             title_el         = $5, \
             title_en         = $6, \
             description      = $7, \
             images           = $8::jsonb, \
             price            = $9, \
             compare_at_price = $10, \
             stock            = $11, \
             status           = $12, \
             visible          = $13, \
             attributes       = attributes || $14::jsonb, \
             version          = version + 1, \
             updated_at       = NOW() \
         WHERE id = $1 AND version = $2 AND deleted_at IS NULL \
         RETURNING id, sku, ean, slug, title_el, title_en, description, images, price, \
                   compare_at_price, attributes, stock, status, visible, version, \
                   created_at, updated_at",
    )
    .bind(id)
    .bind(expected_version)
    .bind(&draft.ean)
    .bind(&draft.slug)
    .bind(&draft.title_el)
    .bind(&draft.title_en)
    .bind(&draft.description)
    .bind(images_json(&draft.images))
    .bind(draft.price)
    .bind(draft.compare_at_price)
    .bind(draft.stock)
    .bind(&draft.status)
    .bind(draft.visible)
    .bind(Value::Object(patch.clone()))
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Permanently deletes the row if it is still at `expected_version`.
///
/// Returns `false` when nothing was deleted.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn delete_product_if_version(
    pool: &PgPool,
    id: i64,
    expected_version: i32,
) -> Result<bool, DbError> {
    let result = sqlx::query("DELETE FROM products WHERE id = $1 AND version = $2")
        .bind(id)
        .bind(expected_version)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() == 1)
}

fn images_json(images: &[String]) -> Value {
    Value::Array(images.iter().cloned().map(Value::String).collect())
}
