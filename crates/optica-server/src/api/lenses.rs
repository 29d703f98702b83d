//! Lens-level handlers under `/api/v1/admin/contact-lenses`.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use optica_catalog::{
    Actor, DeleteLensResponse, UpdateLensRequest, UpdateLensResponse, UpsertLensRequest,
    UpsertLensResponse,
};
use optica_core::LensView;
use serde::Deserialize;

use crate::middleware::RequestId;

use super::{map_catalog_error, parse_body, ApiError, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct ListQuery {
    #[serde(default)]
    pub available_only: bool,
}

#[derive(Debug, Deserialize)]
pub(super) struct DeleteQuery {
    pub expected_version: Option<i32>,
}

/// POST /api/v1/admin/contact-lenses: create, or upsert by SKU.
pub(super) async fn create_lens(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(actor): Extension<Actor>,
    body: Result<Json<UpsertLensRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<UpsertLensResponse>>), ApiError> {
    let request = parse_body(&req_id.0, body)?;
    let out = state
        .catalog
        .create_or_upsert_lens(&actor, request)
        .await
        .map_err(|e| map_catalog_error(req_id.0.clone(), &e))?;

    let status = if out.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, ApiResponse::ok(req_id.0, out)))
}

pub(super) async fn list_lenses(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<Vec<LensView>>>, ApiError> {
    let data = state
        .catalog
        .list_lenses(query.available_only)
        .await
        .map_err(|e| map_catalog_error(req_id.0.clone(), &e))?;

    Ok(ApiResponse::ok(req_id.0, data))
}

pub(super) async fn get_lens(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(sku): Path<String>,
) -> Result<Json<ApiResponse<LensView>>, ApiError> {
    let data = state
        .catalog
        .get_lens(&sku)
        .await
        .map_err(|e| map_catalog_error(req_id.0.clone(), &e))?;

    Ok(ApiResponse::ok(req_id.0, data))
}

/// PUT /api/v1/admin/contact-lenses/{sku}
pub(super) async fn update_lens(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(actor): Extension<Actor>,
    Path(sku): Path<String>,
    body: Result<Json<UpdateLensRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<UpdateLensResponse>>, ApiError> {
    let request = parse_body(&req_id.0, body)?;
    let data = state
        .catalog
        .update_lens(&actor, &sku, request)
        .await
        .map_err(|e| map_catalog_error(req_id.0.clone(), &e))?;

    Ok(ApiResponse::ok(req_id.0, data))
}

/// DELETE /api/v1/admin/contact-lenses/{sku}?expected_version=N
pub(super) async fn delete_lens(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(actor): Extension<Actor>,
    Path(sku): Path<String>,
    Query(query): Query<DeleteQuery>,
) -> Result<Json<ApiResponse<DeleteLensResponse>>, ApiError> {
    let data = state
        .catalog
        .delete_lens(&actor, &sku, query.expected_version)
        .await
        .map_err(|e| map_catalog_error(req_id.0.clone(), &e))?;

    Ok(ApiResponse::ok(req_id.0, data))
}
