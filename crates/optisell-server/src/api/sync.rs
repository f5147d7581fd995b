//! Push local product data to a connected store.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Extension, Json,
};
use optisell_core::{validate_product_input, ProductCheck, ProductDraft};
use optisell_shopify::{sync_many, sync_product, SyncAction, SyncMode, SyncOutcome};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::shopify_products::sync_status;
use super::{
    connectable_integration, json_body, map_shopify_error, map_store_error, validation_error,
    ApiError, ApiResponse, AppState,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct SyncRequest {
    pub product_local_data: Option<ProductDraft>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct BulkSyncRequest {
    #[serde(default)]
    pub product_ids: Vec<String>,
    #[serde(default)]
    pub intelligent: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct BulkItem {
    id: String,
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    action: Option<SyncAction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    shopify_product_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    shopify_variant_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl BulkItem {
    fn failed(id: String, error: String) -> Self {
        Self {
            id,
            success: false,
            action: None,
            shopify_product_id: None,
            shopify_variant_id: None,
            error: Some(error),
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct BulkSyncResponse {
    results: Vec<BulkItem>,
    succeeded: usize,
    failed: usize,
}

async fn sync_one(
    state: &AppState,
    req_id: &RequestId,
    id: &str,
    body: Result<Json<SyncRequest>, JsonRejection>,
    mode: SyncMode,
) -> Result<(StatusCode, Json<ApiResponse<SyncOutcome>>), ApiError> {
    let request = json_body(req_id, body)?;
    let draft = request.product_local_data.ok_or_else(|| {
        ApiError::new(&req_id.0, "bad_request", "productLocalData is required")
    })?;
    let check = match mode {
        SyncMode::Direct => ProductCheck::Push,
        SyncMode::Intelligent => ProductCheck::Create,
    };
    validate_product_input(&draft, check).map_err(|e| validation_error(req_id, &e))?;

    let integration = connectable_integration(state, req_id, id).await?;
    let client = state
        .shopify_client(&integration)
        .map_err(|e| map_shopify_error(req_id, &e))?;
    let outcome = sync_product(&client, &draft, mode)
        .await
        .map_err(|e| map_shopify_error(req_id, &e))?;

    tracing::info!(
        integration_id = %id,
        action = ?outcome.action,
        shopify_product_id = %outcome.shopify_product_id,
        "product synced"
    );
    Ok((sync_status(&outcome), ApiResponse::new(req_id, outcome)))
}

/// POST /api/shopify/sync/{id}: update when `shopifyId` is set, else create.
pub(super) async fn sync_direct(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
    body: Result<Json<SyncRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<SyncOutcome>>), ApiError> {
    sync_one(&state, &req_id, &id, body, SyncMode::Direct).await
}

/// POST /api/shopify/sync/{id}/intelligent: match by SKU before creating.
pub(super) async fn sync_intelligent(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
    body: Result<Json<SyncRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<SyncOutcome>>), ApiError> {
    sync_one(&state, &req_id, &id, body, SyncMode::Intelligent).await
}

/// POST /api/shopify/sync/{id}/bulk
///
/// Syncs stored products one after another and records each new link.
/// Individual failures are reported per item.
pub(super) async fn sync_bulk(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
    body: Result<Json<BulkSyncRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<BulkSyncResponse>>, ApiError> {
    let request = json_body(&req_id, body)?;
    if request.product_ids.is_empty() {
        return Err(ApiError::new(
            &req_id.0,
            "validation_error",
            "productIds must contain at least one id",
        ));
    }

    let integration = connectable_integration(&state, &req_id, &id).await?;
    let client = state
        .shopify_client(&integration)
        .map_err(|e| map_shopify_error(&req_id, &e))?;

    let mut results = Vec::with_capacity(request.product_ids.len());
    let mut drafts = Vec::new();
    for product_id in request.product_ids {
        let product = state
            .store
            .get_product(&product_id)
            .await
            .map_err(|e| map_store_error(&req_id, &e))?;
        match product {
            None => results.push(BulkItem::failed(product_id, "product not found".to_string())),
            Some(product) => {
                let draft = product.to_draft();
                match validate_product_input(&draft, ProductCheck::Push) {
                    Ok(()) => drafts.push((product_id, draft)),
                    Err(e) => results.push(BulkItem::failed(product_id, e.to_string())),
                }
            }
        }
    }

    let mode = if request.intelligent {
        SyncMode::Intelligent
    } else {
        SyncMode::Direct
    };
    for result in sync_many(&client, drafts, mode).await {
        match result.outcome {
            Ok(outcome) => {
                state
                    .store
                    .record_shopify_link(
                        &result.id,
                        outcome.shopify_product_id.clone(),
                        outcome.shopify_variant_id.clone(),
                    )
                    .await
                    .map_err(|e| map_store_error(&req_id, &e))?;
                results.push(BulkItem {
                    id: result.id,
                    success: true,
                    action: Some(outcome.action),
                    shopify_product_id: Some(outcome.shopify_product_id),
                    shopify_variant_id: outcome.shopify_variant_id,
                    error: None,
                });
            }
            Err(e) => results.push(BulkItem::failed(result.id, e.to_string())),
        }
    }

    let succeeded = results.iter().filter(|r| r.success).count();
    let failed = results.len() - succeeded;
    tracing::info!(integration_id = %id, succeeded, failed, "bulk sync finished");
    Ok(ApiResponse::new(
        &req_id,
        BulkSyncResponse {
            results,
            succeeded,
            failed,
        },
    ))
}
