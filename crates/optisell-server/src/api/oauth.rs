//! Shopify app install: authorize redirect, callback and install status.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use axum::{
    extract::{Query, State},
    response::Redirect,
    Extension, Json,
};
use optisell_core::{normalize_shop_domain, IntegrationSource};
use optisell_shopify::oauth;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::middleware::RequestId;

use super::{map_shopify_error, map_store_error, ApiError, ApiResponse, AppState};

const STATE_TTL: Duration = Duration::from_secs(10 * 60);

struct PendingInstall {
    shop: String,
    issued_at: Instant,
}

/// In-memory OAuth `state` values awaiting their callback. Each is single use.
#[derive(Default)]
pub struct OAuthStates {
    pending: Mutex<HashMap<String, PendingInstall>>,
}

impl OAuthStates {
    /// Issues a fresh state for `shop`, dropping any that have expired.
    pub async fn issue(&self, shop: &str) -> String {
        let state = oauth::generate_state();
        let mut pending = self.pending.lock().await;
        pending.retain(|_, p| p.issued_at.elapsed() < STATE_TTL);
        pending.insert(
            state.clone(),
            PendingInstall {
                shop: shop.to_string(),
                issued_at: Instant::now(),
            },
        );
        state
    }

    /// Removes `state` and returns the shop it was issued for, unless it
    /// has expired.
    pub async fn take(&self, state: &str) -> Option<String> {
        let pending = self.pending.lock().await.remove(state)?;
        (pending.issued_at.elapsed() < STATE_TTL).then_some(pending.shop)
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct ShopQuery {
    pub shop: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct InstallStatus {
    installed: bool,
    has_token: bool,
    scope: Option<String>,
    shop: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct Liveness {
    status: &'static str,
    message: &'static str,
}

fn shop_param(req_id: &RequestId, raw: Option<&str>) -> Result<String, ApiError> {
    let raw = raw.map(str::trim).filter(|s| !s.is_empty()).ok_or_else(|| {
        ApiError::new(
            &req_id.0,
            "bad_request",
            "query parameter 'shop' is required, e.g. ?shop=my-store.myshopify.com",
        )
    })?;
    normalize_shop_domain(raw).map_err(|e| ApiError::new(&req_id.0, "validation_error", e.to_string()))
}

/// GET /api/shopify/test
pub(super) async fn router_liveness(Extension(req_id): Extension<RequestId>) -> Json<ApiResponse<Liveness>> {
    ApiResponse::new(
        &req_id,
        Liveness {
            status: "ok",
            message: "Shopify API endpoint is working",
        },
    )
}

/// GET /api/shopify/install?shop=
///
/// Redirects to Shopify's authorize page.
pub(super) async fn install(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<ShopQuery>,
) -> Result<Redirect, ApiError> {
    let shop = shop_param(&req_id, query.shop.as_deref())?;
    let credentials = &state.config.shopify;
    let client_id = credentials.client_id.as_deref().ok_or_else(|| {
        ApiError::new(&req_id.0, "internal_error", "SHOPIFY_CLIENT_ID is not configured")
    })?;

    let nonce = state.oauth_states.issue(&shop).await;
    let url = oauth::authorize_url(
        &shop,
        client_id,
        &credentials.scopes,
        &credentials.redirect_uri,
        &nonce,
    )
    .map_err(|e| map_shopify_error(&req_id, &e))?;

    tracing::info!(shop = %shop, "redirecting to shopify authorize page");
    Ok(Redirect::to(&url))
}

fn param<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    pairs
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.trim())
        .filter(|v| !v.is_empty())
}

/// GET /api/shopify/callback
///
/// Verifies the callback, exchanges the code and stores the token.
pub(super) async fn callback(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Redirect, ApiError> {
    let rid = &req_id.0;
    let (Some(code), Some(nonce), Some(raw_shop)) = (
        param(&pairs, "code"),
        param(&pairs, "state"),
        param(&pairs, "shop"),
    ) else {
        return Err(ApiError::new(
            rid,
            "bad_request",
            "query parameters code, state and shop are required",
        ));
    };

    let expected_shop = state
        .oauth_states
        .take(nonce)
        .await
        .ok_or_else(|| ApiError::new(rid, "bad_request", "invalid or expired state"))?;

    let shop = normalize_shop_domain(raw_shop)
        .map_err(|e| ApiError::new(rid, "validation_error", e.to_string()))?;
    if shop != expected_shop {
        tracing::warn!(shop = %shop, expected = %expected_shop, "oauth callback shop mismatch");
        return Err(ApiError::new(
            rid,
            "bad_request",
            "shop does not match the one the install was started for",
        ));
    }

    let credentials = &state.config.shopify;
    let (Some(client_id), Some(client_secret)) = (
        credentials.client_id.as_deref(),
        credentials.client_secret.as_deref(),
    ) else {
        return Err(ApiError::new(
            rid,
            "internal_error",
            "SHOPIFY_CLIENT_ID or SHOPIFY_CLIENT_SECRET is not configured",
        ));
    };

    if !oauth::verify_callback_hmac(&pairs, client_secret) {
        tracing::warn!(shop = %shop, "oauth callback hmac verification failed");
        return Err(ApiError::new(rid, "unauthorized", "callback HMAC verification failed"));
    }

    let grant = oauth::exchange_code(
        &state.http,
        &state.token_url(&shop),
        client_id,
        client_secret,
        code,
    )
    .await
    .map_err(|e| map_shopify_error(&req_id, &e))?;

    let scope = grant.scope.or_else(|| Some(credentials.scopes.clone()));
    let integration = state
        .store
        .upsert_oauth_integration(&shop, grant.access_token, scope)
        .await
        .map_err(|e| map_store_error(&req_id, &e))?;
    tracing::info!(shop = %shop, integration_id = %integration.id, "shopify app installed");

    let target = format!(
        "{}/connections?shopify_installed=true&shop={shop}",
        state.config.frontend_url.trim_end_matches('/'),
    );
    Ok(Redirect::to(&target))
}

/// GET /api/shopify/status: whether an OAuth install exists.
pub(super) async fn install_status(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<ShopQuery>,
) -> Result<Json<ApiResponse<InstallStatus>>, ApiError> {
    let found = if let Some(raw) = query.shop.as_deref().filter(|s| !s.trim().is_empty()) {
        let shop = shop_param(&req_id, Some(raw))?;
        state
            .store
            .find_integration_by_domain(&shop)
            .await
            .map_err(|e| map_store_error(&req_id, &e))?
    } else {
        state
            .store
            .list_integrations()
            .await
            .map_err(|e| map_store_error(&req_id, &e))?
            .into_iter()
            .find(|i| i.source == IntegrationSource::Oauth)
    };

    let status = match found {
        Some(integration) => InstallStatus {
            installed: true,
            has_token: integration.has_token(),
            scope: integration.scope,
            shop: Some(integration.store_domain),
        },
        None => InstallStatus {
            installed: false,
            has_token: false,
            scope: None,
            shop: None,
        },
    };
    Ok(ApiResponse::new(&req_id, status))
}

#[cfg(test)]
#[path = "oauth_test.rs"]
mod tests;
