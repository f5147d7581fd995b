mod integrations;
mod oauth;
mod products;
mod shopify_products;
mod sync;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post, put},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use optisell_core::{AppConfig, Integration, ValidationErrors};
use optisell_shopify::{status_hint, ClientSettings, ShopifyAdminClient, ShopifyError};
use optisell_store::{JsonStore, StoreError};
use serde::Serialize;
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::{
    enforce_rate_limit, request_id, require_bearer_auth, AuthState, RateLimitState, RequestId,
};

use oauth::OAuthStates;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<JsonStore>,
    pub config: Arc<AppConfig>,
    pub shopify: ClientSettings,
    pub oauth_states: Arc<OAuthStates>,
    /// Shared client for calls that are not bound to one store's token.
    pub http: reqwest::Client,
    /// Replaces `https://{shop}` as the Shopify origin. Used by tests.
    pub shopify_origin: Option<String>,
}

impl AppState {
    /// # Errors
    ///
    /// Returns an error if the shared HTTP client cannot be built.
    pub fn new(store: JsonStore, config: Arc<AppConfig>) -> Result<Self, reqwest::Error> {
        let shopify = ClientSettings::from_config(&config);
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(shopify.timeout_secs))
            .user_agent(shopify.user_agent.as_str())
            .build()?;
        Ok(Self {
            store: Arc::new(store),
            config,
            shopify,
            oauth_states: Arc::new(OAuthStates::default()),
            http,
            shopify_origin: None,
        })
    }

    pub(super) fn shopify_client(
        &self,
        integration: &Integration,
    ) -> Result<ShopifyAdminClient, ShopifyError> {
        match &self.shopify_origin {
            None => ShopifyAdminClient::new(
                &integration.store_domain,
                &integration.admin_access_token,
                &self.shopify,
            ),
            Some(origin) => ShopifyAdminClient::with_base_url(
                &integration.store_domain,
                &integration.admin_access_token,
                &self.shopify,
                &format!("{origin}/admin/api/{}", self.shopify.api_version),
            ),
        }
    }

    pub(super) fn token_url(&self, shop: &str) -> String {
        match &self.shopify_origin {
            None => optisell_shopify::oauth::token_url(shop),
            Some(origin) => format!("{origin}/admin/oauth/access_token"),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

impl<T: Serialize> ApiResponse<T> {
    pub(super) fn new(request_id: &RequestId, data: T) -> Json<Self> {
        Json(Self {
            data,
            meta: ResponseMeta::new(request_id.0.clone()),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    #[serde(skip)]
    status: StatusCode,
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    store: &'static str,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

fn status_for_code(code: &str) -> StatusCode {
    match code {
        "not_found" => StatusCode::NOT_FOUND,
        "unauthorized" => StatusCode::UNAUTHORIZED,
        "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
        "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
        "upstream_error" => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        let code = code.into();
        Self {
            status: status_for_code(&code),
            error: ErrorBody {
                code,
                message: message.into(),
                details: None,
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }

    #[must_use]
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    #[must_use]
    pub fn with_details(mut self, details: Value) -> Self {
        self.error.details = Some(details);
        self
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status, Json(self)).into_response()
    }
}

pub(super) fn map_store_error(request_id: &RequestId, error: &StoreError) -> ApiError {
    tracing::error!(error = %error, "store operation failed");
    ApiError::new(&request_id.0, "internal_error", "store operation failed")
}

pub(super) fn validation_error(request_id: &RequestId, errors: &ValidationErrors) -> ApiError {
    ApiError::new(&request_id.0, "validation_error", errors.to_string())
        .with_details(json!({ "errors": errors.messages() }))
}

/// Maps a Shopify failure onto the response. API errors keep Shopify's
/// status and carry the hint for it.
pub(super) fn map_shopify_error(request_id: &RequestId, error: &ShopifyError) -> ApiError {
    let rid = &request_id.0;
    match error {
        ShopifyError::InvalidShopDomain(_) | ShopifyError::InvalidAccessToken(_) => {
            ApiError::new(rid, "validation_error", error.to_string())
        }
        ShopifyError::InvalidId(_) | ShopifyError::OAuth(_) => {
            ApiError::new(rid, "bad_request", error.to_string())
        }
        ShopifyError::InvalidUrl(_) => {
            tracing::error!(error = %error, "could not build Shopify request");
            ApiError::new(rid, "internal_error", error.to_string())
        }
        _ => {
            tracing::warn!(error = %error, status = ?error.status(), "shopify call failed");
            let status = error
                .status()
                .and_then(|s| StatusCode::from_u16(s).ok())
                .filter(|s| s.is_client_error() || s.is_server_error())
                .unwrap_or(StatusCode::BAD_GATEWAY);
            let mut details = json!({ "hint": status_hint(error.status()) });
            if let Some(shopify) = error.details() {
                details["shopify"] = shopify.clone();
            }
            ApiError::new(rid, "upstream_error", error.to_string())
                .with_status(status)
                .with_details(details)
        }
    }
}

/// Unwraps a JSON body, turning axum's rejection into an enveloped 400.
pub(super) fn json_body<T>(
    request_id: &RequestId,
    body: Result<Json<T>, JsonRejection>,
) -> Result<T, ApiError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| ApiError::new(&request_id.0, "bad_request", rejection.body_text()))
}

/// Loads an integration that Shopify calls can be made with.
pub(super) async fn connectable_integration(
    state: &AppState,
    request_id: &RequestId,
    id: &str,
) -> Result<Integration, ApiError> {
    let integration = state
        .store
        .get_integration(id)
        .await
        .map_err(|e| map_store_error(request_id, &e))?
        .ok_or_else(|| ApiError::new(&request_id.0, "not_found", format!("integration {id} not found")))?;

    if !integration.has_token() {
        return Err(ApiError::new(
            &request_id.0,
            "bad_request",
            "integration has no Admin API access token configured",
        ));
    }
    Ok(integration)
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-request-id"),
        ])
}

fn protected_router(auth: AuthState, rate_limit: RateLimitState) -> Router<AppState> {
    Router::new()
        .route("/api/shopify/test", get(oauth::router_liveness))
        .route("/api/shopify/status", get(oauth::install_status))
        .route(
            "/api/shopify/integrations",
            get(integrations::list_integrations).post(integrations::create_integration),
        )
        .route(
            "/api/shopify/integrations/{id}",
            get(integrations::get_integration)
                .put(integrations::update_integration)
                .delete(integrations::delete_integration),
        )
        .route(
            "/api/shopify/integrations/{id}/test",
            post(integrations::test_integration),
        )
        .route(
            "/api/shopify/integrations/{id}/products",
            get(shopify_products::list_remote_products).post(shopify_products::push_remote_product),
        )
        .route(
            "/api/shopify/integrations/{id}/products/{product_id}",
            put(shopify_products::update_remote_product)
                .delete(shopify_products::delete_remote_product),
        )
        .route(
            "/api/shopify/integrations/{id}/import",
            post(shopify_products::import_products),
        )
        .route("/api/shopify/sync/{id}", post(sync::sync_direct))
        .route("/api/shopify/sync/{id}/intelligent", post(sync::sync_intelligent))
        .route("/api/shopify/sync/{id}/bulk", post(sync::sync_bulk))
        .route(
            "/api/products",
            get(products::list_products).post(products::create_product),
        )
        .route(
            "/api/products/{id}",
            get(products::get_product)
                .put(products::update_product)
                .delete(products::delete_product),
        )
        .route("/api/products/{id}/duplicate", post(products::duplicate_product))
        .route("/api/products/{id}/sync", post(products::sync_product))
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn_with_state(
                    rate_limit,
                    enforce_rate_limit,
                ))
                .layer(axum::middleware::from_fn_with_state(
                    auth,
                    require_bearer_auth,
                )),
        )
}

pub fn build_app(state: AppState, auth: AuthState, rate_limit: RateLimitState) -> Router {
    let public_routes = Router::new()
        .route("/api/health", get(health))
        .route("/api/shopify/install", get(oauth::install))
        .route("/api/shopify/callback", get(oauth::callback));

    Router::new()
        .merge(public_routes)
        .merge(protected_router(auth, rate_limit))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    match state.store.check().await {
        Ok(()) => (
            StatusCode::OK,
            ApiResponse::new(
                &req_id,
                HealthData {
                    status: "ok",
                    store: "ok",
                },
            ),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check: store unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                ApiResponse::new(
                    &req_id,
                    HealthData {
                        status: "degraded",
                        store: "unavailable",
                    },
                ),
            )
        }
    }
}

pub fn default_rate_limit_state() -> RateLimitState {
    RateLimitState::new(120, Duration::from_secs(60))
}

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;
