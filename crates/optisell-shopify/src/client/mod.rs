//! HTTP client for one store's Shopify Admin REST API.

mod fetch_all;
mod products;

use std::time::{Duration, Instant};

use optisell_core::{clean_token, normalize_shop_domain, token_preview, AppConfig};
use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::{status_hint, ShopifyError};
use crate::types::{ShopEnvelope, ShopifyShop};

pub use products::{ProductListParams, ProductPage, SkuMatch, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};

pub const ACCESS_TOKEN_HEADER: &str = "X-Shopify-Access-Token";

/// Transport settings shared by every client built from one configuration.
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub api_version: String,
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            api_version: optisell_core::config::DEFAULT_SHOPIFY_API_VERSION.to_string(),
            timeout_secs: 30,
            user_agent: "optisell-integrator/0.1".to_string(),
        }
    }
}

impl ClientSettings {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            api_version: config.shopify_api_version.clone(),
            timeout_secs: config.shopify_request_timeout_secs,
            user_agent: config.shopify_user_agent.clone(),
        }
    }
}

/// Body of a response that passed the status check.
pub(crate) struct RawResponse {
    pub link: Option<String>,
    pub body: String,
}

/// Admin API client bound to one store and one access token.
///
/// The token is sent as `X-Shopify-Access-Token` on every request and only
/// ever logged as its [`token_preview`].
pub struct ShopifyAdminClient {
    client: Client,
    shop_domain: String,
    token: String,
    base_url: String,
}

/// Outcome of [`ShopifyAdminClient::test_connection`].
#[derive(Debug, Clone)]
pub enum ConnectionTest {
    Connected(ShopifyShop),
    Failed(ConnectionFailure),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionFailure {
    pub status: Option<u16>,
    pub message: String,
    pub hint: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl From<&ShopifyError> for ConnectionFailure {
    fn from(err: &ShopifyError) -> Self {
        let status = err.status();
        Self {
            status,
            message: err.to_string(),
            hint: status_hint(status),
            details: err.details().cloned(),
        }
    }
}

impl ShopifyAdminClient {
    /// Builds a client for `https://{domain}/admin/api/{version}`.
    ///
    /// `domain` may be a bare handle or a full URL; it is normalized first.
    ///
    /// # Errors
    ///
    /// - [`ShopifyError::InvalidShopDomain`] if the domain cannot be normalized.
    /// - [`ShopifyError::InvalidAccessToken`] if the token is blank.
    /// - [`ShopifyError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(domain: &str, token: &str, settings: &ClientSettings) -> Result<Self, ShopifyError> {
        let domain = normalize_shop_domain(domain)?;
        let base_url = format!("https://{domain}/admin/api/{}", settings.api_version);
        Self::with_base_url(&domain, token, settings, &base_url)
    }

    /// Builds a client against an arbitrary base URL (for wiremock tests).
    ///
    /// # Errors
    ///
    /// - [`ShopifyError::InvalidAccessToken`] if the token is blank.
    /// - [`ShopifyError::InvalidUrl`] if `base_url` is not an absolute URL.
    /// - [`ShopifyError::Http`] if the `reqwest::Client` cannot be built.
    pub fn with_base_url(
        domain: &str,
        token: &str,
        settings: &ClientSettings,
        base_url: &str,
    ) -> Result<Self, ShopifyError> {
        let token = clean_token(token);
        if token.is_empty() {
            return Err(ShopifyError::InvalidAccessToken(
                "access token is required".to_string(),
            ));
        }

        let base_url = base_url.trim_end_matches('/');
        Url::parse(base_url)
            .map_err(|e| ShopifyError::InvalidUrl(format!("\"{base_url}\": {e}")))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(settings.user_agent.as_str())
            .build()?;

        let client = Self {
            client,
            shop_domain: domain.to_string(),
            token,
            base_url: base_url.to_string(),
        };
        tracing::debug!(
            shop = %client.shop_domain,
            base_url = %client.base_url,
            token = %token_preview(&client.token),
            "shopify client created"
        );
        Ok(client)
    }

    #[must_use]
    pub fn shop_domain(&self) -> &str {
        &self.shop_domain
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetches `/shop.json`.
    ///
    /// # Errors
    ///
    /// - [`ShopifyError::Api`] on any non-2xx response.
    /// - [`ShopifyError::UnexpectedResponse`] if the body has no `shop`.
    /// - [`ShopifyError::Http`] / [`ShopifyError::Deserialize`] on transport or JSON failure.
    pub async fn get_shop(&self) -> Result<ShopifyShop, ShopifyError> {
        let url = self.url("/shop.json", &[])?;
        let raw = self.execute(self.client.get(url), "GET", "/shop.json").await?;
        let envelope: ShopEnvelope = parse(&raw.body, "GET /shop.json")?;
        envelope.shop.ok_or(ShopifyError::UnexpectedResponse {
            context: "GET /shop.json".to_string(),
            key: "shop",
        })
    }

    /// Calls [`Self::get_shop`] and folds any failure into a status hint.
    pub async fn test_connection(&self) -> ConnectionTest {
        match self.get_shop().await {
            Ok(shop) => {
                tracing::info!(shop = %self.shop_domain, shop_name = %shop.name, "connection ok");
                ConnectionTest::Connected(shop)
            }
            Err(err) => {
                tracing::warn!(shop = %self.shop_domain, error = %err, "connection test failed");
                ConnectionTest::Failed(ConnectionFailure::from(&err))
            }
        }
    }

    pub(crate) fn url(&self, path: &str, query: &[(&str, String)]) -> Result<Url, ShopifyError> {
        let raw = format!("{}{path}", self.base_url);
        let mut url =
            Url::parse(&raw).map_err(|e| ShopifyError::InvalidUrl(format!("\"{raw}\": {e}")))?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    /// Sends `request` with auth headers and turns non-2xx into [`ShopifyError::Api`].
    pub(crate) async fn execute(
        &self,
        request: RequestBuilder,
        method: &str,
        path: &str,
    ) -> Result<RawResponse, ShopifyError> {
        let started = Instant::now();
        let response = request
            .header(ACCESS_TOKEN_HEADER, &self.token)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .inspect_err(|e| {
                tracing::warn!(
                    shop = %self.shop_domain,
                    method,
                    path,
                    token = %token_preview(&self.token),
                    error = %e,
                    "shopify request failed"
                );
            })?;

        let status = response.status();
        let link = response
            .headers()
            .get(reqwest::header::LINK)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let body = response.text().await?;

        tracing::debug!(
            shop = %self.shop_domain,
            method,
            path,
            status = status.as_u16(),
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "shopify request"
        );

        if !status.is_success() {
            let err = api_error(status.as_u16(), &body);
            tracing::warn!(
                shop = %self.shop_domain,
                method,
                path,
                status = status.as_u16(),
                error = %err,
                "shopify returned an error"
            );
            return Err(err);
        }

        Ok(RawResponse { link, body })
    }
}

pub(crate) fn parse<T: DeserializeOwned>(body: &str, context: &str) -> Result<T, ShopifyError> {
    serde_json::from_str(body).map_err(|source| ShopifyError::Deserialize {
        context: context.to_string(),
        source,
    })
}

/// Builds an [`ShopifyError::Api`] from a failed response body.
///
/// The message comes from `errors` (string, array joined with `, `, or
/// object serialized), then `error`, then `message`. Blank values are
/// skipped. A non-JSON body is used as is; otherwise the status is named.
pub(crate) fn api_error(status: u16, body: &str) -> ShopifyError {
    let details: Option<Value> = serde_json::from_str(body).ok();
    let message = match &details {
        Some(value) => message_from_json(value),
        None => {
            let trimmed = body.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
    }
    .unwrap_or_else(|| format!("Shopify API error: {status}"));

    ShopifyError::Api {
        status,
        message,
        details: details.filter(Value::is_object),
    }
}

fn text_of(value: &Value) -> Option<String> {
    let text = match value {
        Value::Null => return None,
        Value::String(s) => s.trim().to_string(),
        Value::Array(items) => items
            .iter()
            .filter_map(text_of)
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(map) if map.is_empty() => return None,
        other => other.to_string(),
    };
    (!text.is_empty()).then_some(text)
}

fn message_from_json(value: &Value) -> Option<String> {
    ["errors", "error", "message"]
        .iter()
        .filter_map(|key| value.get(*key))
        .find_map(text_of)
}

#[cfg(test)]
#[path = "../client_test.rs"]
mod tests;
