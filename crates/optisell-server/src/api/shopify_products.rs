//! Products living in a connected Shopify store.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use optisell_core::{validate_product_input, ImportedProduct, ProductCheck, ProductDraft};
use optisell_shopify::{
    import_product, parse_shopify_id, sync_product, ProductListParams, ShopifyProduct, SyncAction,
    SyncMode, SyncOutcome, MAX_PAGE_LIMIT,
};
use optisell_store::ImportSummary;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::middleware::RequestId;

use super::{
    connectable_integration, json_body, map_shopify_error, map_store_error, validation_error,
    ApiError, ApiResponse, AppState,
};

#[derive(Debug, Deserialize)]
pub(super) struct RemoteProductQuery {
    pub limit: Option<u32>,
    pub page_info: Option<String>,
    pub ids: Option<String>,
    pub status: Option<String>,
    /// Return Shopify's own product shape instead of the local one.
    #[serde(default)]
    pub raw: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct RemoteProductPage<T: Serialize> {
    products: Vec<T>,
    count: usize,
    next_page_info: Option<String>,
    previous_page_info: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub(super) enum RemoteProducts {
    Local(RemoteProductPage<ImportedProduct>),
    Raw(RemoteProductPage<ShopifyProduct>),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct PushProductRequest {
    #[serde(alias = "product")]
    pub product_local_data: Option<ProductDraft>,
    #[serde(default, alias = "shopifyProductId")]
    pub shopify_id: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub(super) struct UpdateProductRequest {
    pub product: Option<ProductDraft>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct RemoteDeleted {
    deleted: bool,
    shopify_product_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ImportResponse {
    integration_id: String,
    #[serde(flatten)]
    summary: ImportSummary,
}

pub(super) fn sync_status(outcome: &SyncOutcome) -> StatusCode {
    match outcome.action {
        SyncAction::Created => StatusCode::CREATED,
        SyncAction::Updated => StatusCode::OK,
    }
}

/// Accepts a Shopify id given as a JSON number or string.
fn id_from_value(value: Option<Value>) -> Option<String> {
    match value? {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}

/// GET /api/shopify/integrations/{id}/products
pub(super) async fn list_remote_products(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
    Query(query): Query<RemoteProductQuery>,
) -> Result<Json<ApiResponse<RemoteProducts>>, ApiError> {
    let integration = connectable_integration(&state, &req_id, &id).await?;
    let client = state
        .shopify_client(&integration)
        .map_err(|e| map_shopify_error(&req_id, &e))?;

    let page = client
        .list_products(&ProductListParams {
            limit: query.limit,
            page_info: query.page_info,
            ids: query.ids,
            status: query.status,
        })
        .await
        .map_err(|e| map_shopify_error(&req_id, &e))?;

    let count = page.products.len();
    let data = if query.raw {
        RemoteProducts::Raw(RemoteProductPage {
            products: page.products,
            count,
            next_page_info: page.next_page_info,
            previous_page_info: page.previous_page_info,
        })
    } else {
        RemoteProducts::Local(RemoteProductPage {
            products: page.products.iter().map(import_product).collect(),
            count,
            next_page_info: page.next_page_info,
            previous_page_info: page.previous_page_info,
        })
    };
    Ok(ApiResponse::new(&req_id, data))
}

/// POST /api/shopify/integrations/{id}/products
///
/// Creates the product, or updates it when a Shopify id is given in the
/// body or the product itself.
pub(super) async fn push_remote_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
    body: Result<Json<PushProductRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<SyncOutcome>>), ApiError> {
    let request = json_body(&req_id, body)?;
    let mut draft = request.product_local_data.ok_or_else(|| {
        ApiError::new(&req_id.0, "bad_request", "productLocalData is required")
    })?;
    if let Some(shopify_id) = id_from_value(request.shopify_id) {
        draft.shopify_id = Some(shopify_id);
    }
    validate_product_input(&draft, ProductCheck::Create)
        .map_err(|e| validation_error(&req_id, &e))?;

    let integration = connectable_integration(&state, &req_id, &id).await?;
    let client = state
        .shopify_client(&integration)
        .map_err(|e| map_shopify_error(&req_id, &e))?;
    let outcome = sync_product(&client, &draft, SyncMode::Direct)
        .await
        .map_err(|e| map_shopify_error(&req_id, &e))?;

    Ok((sync_status(&outcome), ApiResponse::new(&req_id, outcome)))
}

/// PUT /api/shopify/integrations/{id}/products/{product_id}
pub(super) async fn update_remote_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path((id, product_id)): Path<(String, String)>,
    body: Result<Json<UpdateProductRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<SyncOutcome>>, ApiError> {
    let request = json_body(&req_id, body)?;
    let mut draft = request
        .product
        .ok_or_else(|| ApiError::new(&req_id.0, "bad_request", "product is required"))?;
    validate_product_input(&draft, ProductCheck::Update)
        .map_err(|e| validation_error(&req_id, &e))?;
    let shopify_id = parse_shopify_id(&product_id).map_err(|e| map_shopify_error(&req_id, &e))?;
    draft.shopify_id = Some(shopify_id.to_string());

    let integration = connectable_integration(&state, &req_id, &id).await?;
    let client = state
        .shopify_client(&integration)
        .map_err(|e| map_shopify_error(&req_id, &e))?;
    let outcome = sync_product(&client, &draft, SyncMode::Direct)
        .await
        .map_err(|e| map_shopify_error(&req_id, &e))?;

    Ok(ApiResponse::new(&req_id, outcome))
}

/// DELETE /api/shopify/integrations/{id}/products/{product_id}
pub(super) async fn delete_remote_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path((id, product_id)): Path<(String, String)>,
) -> Result<Json<ApiResponse<RemoteDeleted>>, ApiError> {
    let shopify_id = parse_shopify_id(&product_id).map_err(|e| map_shopify_error(&req_id, &e))?;
    let integration = connectable_integration(&state, &req_id, &id).await?;
    let client = state
        .shopify_client(&integration)
        .map_err(|e| map_shopify_error(&req_id, &e))?;
    client
        .delete_product(shopify_id)
        .await
        .map_err(|e| map_shopify_error(&req_id, &e))?;

    Ok(ApiResponse::new(
        &req_id,
        RemoteDeleted {
            deleted: true,
            shopify_product_id: shopify_id.to_string(),
        },
    ))
}

/// POST /api/shopify/integrations/{id}/import
///
/// Pulls every product page from the store and merges it into the local
/// catalogue.
pub(super) async fn import_products(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<ImportResponse>>, ApiError> {
    let integration = connectable_integration(&state, &req_id, &id).await?;
    let client = state
        .shopify_client(&integration)
        .map_err(|e| map_shopify_error(&req_id, &e))?;

    let remote = client
        .fetch_all_products(MAX_PAGE_LIMIT, state.config.import_max_pages)
        .await
        .map_err(|e| map_shopify_error(&req_id, &e))?;
    let imported = remote.iter().map(import_product).collect();
    let summary = state
        .store
        .merge_imported(imported)
        .await
        .map_err(|e| map_store_error(&req_id, &e))?;

    tracing::info!(
        integration_id = %id,
        shop = %integration.store_domain,
        created = summary.created,
        updated = summary.updated,
        "shopify import finished"
    );
    Ok(ApiResponse::new(
        &req_id,
        ImportResponse {
            integration_id: id,
            summary,
        },
    ))
}
