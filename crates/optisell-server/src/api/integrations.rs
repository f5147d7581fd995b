//! Stored Shopify integrations: CRUD and the connection test.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;
use optisell_core::{
    validate_integration_update, validate_new_integration, IntegrationInput, IntegrationPatch,
    IntegrationStatus, IntegrationView,
};
use optisell_shopify::{ConnectionTest, ShopifyShop};
use serde::Serialize;
use serde_json::Value;

use crate::middleware::RequestId;

use super::{
    connectable_integration, json_body, map_shopify_error, map_store_error, validation_error,
    ApiError, ApiResponse, AppState,
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct DeletedResponse {
    pub deleted: bool,
    pub id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ShopSummary {
    id: u64,
    name: String,
    email: Option<String>,
    domain: Option<String>,
    myshopify_domain: Option<String>,
    currency: Option<String>,
    timezone: Option<String>,
    plan_name: Option<String>,
}

impl From<ShopifyShop> for ShopSummary {
    fn from(shop: ShopifyShop) -> Self {
        Self {
            id: shop.id,
            name: shop.name,
            email: shop.email,
            domain: shop.domain,
            myshopify_domain: shop.myshopify_domain,
            currency: shop.currency,
            timezone: shop.iana_timezone,
            plan_name: shop.plan_name,
        }
    }
}

/// Connection test result. A failed test is still a successful request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ConnectionTestResponse {
    connected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    shop: Option<ShopSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    hint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
    integration: IntegrationView,
}

fn not_found(req_id: &RequestId, id: &str) -> ApiError {
    ApiError::new(&req_id.0, "not_found", format!("integration {id} not found"))
}

pub(super) async fn list_integrations(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Vec<IntegrationView>>>, ApiError> {
    let integrations = state
        .store
        .list_integrations()
        .await
        .map_err(|e| map_store_error(&req_id, &e))?;
    let views = integrations.iter().map(|i| i.view()).collect();
    Ok(ApiResponse::new(&req_id, views))
}

pub(super) async fn create_integration(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Result<Json<IntegrationInput>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<IntegrationView>>), ApiError> {
    let input = json_body(&req_id, body)?;
    let new = validate_new_integration(input).map_err(|e| validation_error(&req_id, &e))?;
    let integration = state
        .store
        .insert_integration(new)
        .await
        .map_err(|e| map_store_error(&req_id, &e))?;

    tracing::info!(
        integration_id = %integration.id,
        shop = %integration.store_domain,
        "integration created"
    );
    Ok((StatusCode::CREATED, ApiResponse::new(&req_id, integration.view())))
}

pub(super) async fn get_integration(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<IntegrationView>>, ApiError> {
    let integration = state
        .store
        .get_integration(&id)
        .await
        .map_err(|e| map_store_error(&req_id, &e))?
        .ok_or_else(|| not_found(&req_id, &id))?;
    Ok(ApiResponse::new(&req_id, integration.view()))
}

pub(super) async fn update_integration(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
    body: Result<Json<IntegrationInput>, JsonRejection>,
) -> Result<Json<ApiResponse<IntegrationView>>, ApiError> {
    let input = json_body(&req_id, body)?;
    let patch = validate_integration_update(input).map_err(|e| validation_error(&req_id, &e))?;
    let integration = state
        .store
        .update_integration(&id, patch)
        .await
        .map_err(|e| map_store_error(&req_id, &e))?
        .ok_or_else(|| not_found(&req_id, &id))?;
    Ok(ApiResponse::new(&req_id, integration.view()))
}

pub(super) async fn delete_integration(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<DeletedResponse>>, ApiError> {
    let deleted = state
        .store
        .delete_integration(&id)
        .await
        .map_err(|e| map_store_error(&req_id, &e))?;
    if !deleted {
        return Err(not_found(&req_id, &id));
    }
    tracing::info!(integration_id = %id, "integration deleted");
    Ok(ApiResponse::new(&req_id, DeletedResponse { deleted, id }))
}

/// POST /api/shopify/integrations/{id}/test
///
/// Calls `/shop.json` and records the outcome on the integration.
pub(super) async fn test_integration(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<ConnectionTestResponse>>, ApiError> {
    let integration = connectable_integration(&state, &req_id, &id).await?;
    let client = state
        .shopify_client(&integration)
        .map_err(|e| map_shopify_error(&req_id, &e))?;

    let now = Utc::now();
    let (patch, mut response) = match client.test_connection().await {
        ConnectionTest::Connected(shop) => (
            IntegrationPatch {
                status: Some(IntegrationStatus::Connected),
                shop_name: Some(Some(shop.name.clone())),
                last_tested_at: Some(now),
                last_error: Some(None),
                ..IntegrationPatch::default()
            },
            ConnectionTestResponse {
                connected: true,
                shop: Some(shop.into()),
                status: None,
                message: None,
                hint: None,
                details: None,
                integration: integration.view(),
            },
        ),
        ConnectionTest::Failed(failure) => (
            IntegrationPatch {
                status: Some(IntegrationStatus::Error),
                last_tested_at: Some(now),
                last_error: Some(Some(failure.message.clone())),
                ..IntegrationPatch::default()
            },
            ConnectionTestResponse {
                connected: false,
                shop: None,
                status: failure.status,
                message: Some(failure.message),
                hint: Some(failure.hint),
                details: failure.details,
                integration: integration.view(),
            },
        ),
    };

    let updated = state
        .store
        .update_integration(&id, patch)
        .await
        .map_err(|e| map_store_error(&req_id, &e))?
        .ok_or_else(|| not_found(&req_id, &id))?;
    response.integration = updated.view();

    Ok(ApiResponse::new(&req_id, response))
}
