//! Variant handlers under `/api/v1/admin/contact-lenses/{sku}/variants`.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Extension, Json,
};
use optica_catalog::{
    Actor, BulkUpdateVariantsRequest, BulkUpdateVariantsResponse, CreateVariantRequest,
    CreateVariantResponse, DeleteVariantRequest, DeleteVariantResponse,
};
use optica_core::LensVariantsView;

use crate::middleware::RequestId;

use super::{map_catalog_error, parse_body, ApiError, ApiResponse, AppState};

pub(super) async fn list_variants(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(sku): Path<String>,
) -> Result<Json<ApiResponse<LensVariantsView>>, ApiError> {
    let data = state
        .catalog
        .get_variants(&sku)
        .await
        .map_err(|e| map_catalog_error(req_id.0.clone(), &e))?;

    Ok(ApiResponse::ok(req_id.0, data))
}

pub(super) async fn create_variant(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(actor): Extension<Actor>,
    Path(sku): Path<String>,
    body: Result<Json<CreateVariantRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<CreateVariantResponse>>), ApiError> {
    let request = parse_body(&req_id.0, body)?;
    let data = state
        .catalog
        .create_variant(&actor, &sku, request)
        .await
        .map_err(|e| map_catalog_error(req_id.0.clone(), &e))?;

    Ok((StatusCode::CREATED, ApiResponse::ok(req_id.0, data)))
}

/// PUT replaces the whole list.
pub(super) async fn bulk_update_variants(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(actor): Extension<Actor>,
    Path(sku): Path<String>,
    body: Result<Json<BulkUpdateVariantsRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<BulkUpdateVariantsResponse>>, ApiError> {
    let request = parse_body(&req_id.0, body)?;
    let data = state
        .catalog
        .bulk_update_variants(&actor, &sku, request)
        .await
        .map_err(|e| map_catalog_error(req_id.0.clone(), &e))?;

    Ok(ApiResponse::ok(req_id.0, data))
}

/// DELETE takes the optical key in the JSON body.
pub(super) async fn delete_variant(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(actor): Extension<Actor>,
    Path(sku): Path<String>,
    body: Result<Json<DeleteVariantRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<DeleteVariantResponse>>, ApiError> {
    let request = parse_body(&req_id.0, body)?;
    let data = state
        .catalog
        .delete_variant(&actor, &sku, request)
        .await
        .map_err(|e| map_catalog_error(req_id.0.clone(), &e))?;

    Ok(ApiResponse::ok(req_id.0, data))
}
