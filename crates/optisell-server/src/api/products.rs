use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use optisell_core::{validate_product_input, LocalProduct, ProductCheck, ProductDraft};
use optisell_shopify::{sync_product as push_to_shopify, SyncAction, SyncMode};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::integrations::DeletedResponse;
use super::{
    connectable_integration, json_body, map_shopify_error, map_store_error, validation_error,
    ApiError, ApiResponse, AppState,
};

#[derive(Debug, Deserialize)]
pub(super) struct ProductQuery {
    pub q: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ProductSyncRequest {
    pub integration_id: Option<String>,
    #[serde(default)]
    pub intelligent: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ProductSyncResponse {
    action: SyncAction,
    shopify_product_id: String,
    shopify_variant_id: Option<String>,
    product: LocalProduct,
}

fn not_found(req_id: &RequestId, id: &str) -> ApiError {
    ApiError::new(&req_id.0, "not_found", format!("product {id} not found"))
}

pub(super) async fn list_products(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<ProductQuery>,
) -> Result<Json<ApiResponse<Vec<LocalProduct>>>, ApiError> {
    let search = query.q.as_deref().map(str::trim).filter(|q| !q.is_empty());
    let products = state
        .store
        .list_products(search)
        .await
        .map_err(|e| map_store_error(&req_id, &e))?;
    Ok(ApiResponse::new(&req_id, products))
}

pub(super) async fn create_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Result<Json<ProductDraft>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<LocalProduct>>), ApiError> {
    let draft = json_body(&req_id, body)?;
    validate_product_input(&draft, ProductCheck::Create)
        .map_err(|e| validation_error(&req_id, &e))?;
    let product = state
        .store
        .insert_product(draft)
        .await
        .map_err(|e| map_store_error(&req_id, &e))?;
    tracing::info!(product_id = %product.id, sku = %product.sku, "product created");
    Ok((StatusCode::CREATED, ApiResponse::new(&req_id, product)))
}

pub(super) async fn get_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<LocalProduct>>, ApiError> {
    let product = state
        .store
        .get_product(&id)
        .await
        .map_err(|e| map_store_error(&req_id, &e))?
        .ok_or_else(|| not_found(&req_id, &id))?;
    Ok(ApiResponse::new(&req_id, product))
}

pub(super) async fn update_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
    body: Result<Json<ProductDraft>, JsonRejection>,
) -> Result<Json<ApiResponse<LocalProduct>>, ApiError> {
    let draft = json_body(&req_id, body)?;
    validate_product_input(&draft, ProductCheck::Update)
        .map_err(|e| validation_error(&req_id, &e))?;
    let product = state
        .store
        .update_product(&id, draft)
        .await
        .map_err(|e| map_store_error(&req_id, &e))?
        .ok_or_else(|| not_found(&req_id, &id))?;
    Ok(ApiResponse::new(&req_id, product))
}

pub(super) async fn delete_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<DeletedResponse>>, ApiError> {
    let deleted = state
        .store
        .delete_product(&id)
        .await
        .map_err(|e| map_store_error(&req_id, &e))?;
    if !deleted {
        return Err(not_found(&req_id, &id));
    }
    Ok(ApiResponse::new(&req_id, DeletedResponse { deleted, id }))
}

pub(super) async fn duplicate_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<ApiResponse<LocalProduct>>), ApiError> {
    let copy = state
        .store
        .duplicate_product(&id)
        .await
        .map_err(|e| map_store_error(&req_id, &e))?
        .ok_or_else(|| not_found(&req_id, &id))?;
    tracing::info!(source_id = %id, product_id = %copy.id, "product duplicated");
    Ok((StatusCode::CREATED, ApiResponse::new(&req_id, copy)))
}

/// POST /api/products/{id}/sync
///
/// Pushes a stored product to the given integration and records the
/// resulting Shopify ids on it.
pub(super) async fn sync_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
    body: Result<Json<ProductSyncRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<ProductSyncResponse>>), ApiError> {
    let request = json_body(&req_id, body)?;
    let integration_id = request
        .integration_id
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::new(&req_id.0, "validation_error", "integrationId is required"))?;

    let product = state
        .store
        .get_product(&id)
        .await
        .map_err(|e| map_store_error(&req_id, &e))?
        .ok_or_else(|| not_found(&req_id, &id))?;
    let draft = product.to_draft();
    validate_product_input(&draft, ProductCheck::Push)
        .map_err(|e| validation_error(&req_id, &e))?;

    let integration = connectable_integration(&state, &req_id, integration_id).await?;
    let client = state
        .shopify_client(&integration)
        .map_err(|e| map_shopify_error(&req_id, &e))?;
    let mode = if request.intelligent {
        SyncMode::Intelligent
    } else {
        SyncMode::Direct
    };
    let outcome = push_to_shopify(&client, &draft, mode)
        .await
        .map_err(|e| map_shopify_error(&req_id, &e))?;

    let product = state
        .store
        .record_shopify_link(
            &id,
            outcome.shopify_product_id.clone(),
            outcome.shopify_variant_id.clone(),
        )
        .await
        .map_err(|e| map_store_error(&req_id, &e))?
        .ok_or_else(|| not_found(&req_id, &id))?;

    let status = match outcome.action {
        SyncAction::Created => StatusCode::CREATED,
        SyncAction::Updated => StatusCode::OK,
    };
    Ok((
        status,
        ApiResponse::new(
            &req_id,
            ProductSyncResponse {
                action: outcome.action,
                shopify_product_id: outcome.shopify_product_id,
                shopify_variant_id: outcome.shopify_variant_id,
                product,
            },
        ),
    ))
}
