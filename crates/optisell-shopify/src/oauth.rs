//! OAuth install flow helpers: state, authorize URL, callback HMAC and the
//! code-for-token exchange.

use hmac::{Hmac, Mac};
use rand::RngCore;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::error::ShopifyError;

type HmacSha256 = Hmac<Sha256>;

const STATE_BYTES: usize = 32;

/// Token returned by `POST /admin/oauth/access_token`.
#[derive(Debug, Clone, Deserialize)]
pub struct AccessGrant {
    pub access_token: String,
    #[serde(default)]
    pub scope: Option<String>,
}

#[derive(Serialize)]
struct ExchangeBody<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    code: &'a str,
}

#[derive(Deserialize)]
struct ExchangeResponse {
    access_token: Option<String>,
    scope: Option<String>,
}

/// 32 random bytes, hex encoded.
#[must_use]
pub fn generate_state() -> String {
    let mut bytes = [0u8; STATE_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Shopify's authorize URL for `domain`, requesting per-user grants.
///
/// # Errors
///
/// Returns [`ShopifyError::InvalidUrl`] if `domain` does not form a valid host.
pub fn authorize_url(
    domain: &str,
    client_id: &str,
    scopes: &str,
    redirect_uri: &str,
    state: &str,
) -> Result<String, ShopifyError> {
    let raw = format!("https://{domain}/admin/oauth/authorize");
    let mut url =
        Url::parse(&raw).map_err(|e| ShopifyError::InvalidUrl(format!("\"{raw}\": {e}")))?;
    url.query_pairs_mut()
        .append_pair("client_id", client_id)
        .append_pair("scope", scopes)
        .append_pair("redirect_uri", redirect_uri)
        .append_pair("state", state)
        .append_pair("grant_options[]", "per-user");
    Ok(url.to_string())
}

#[must_use]
pub fn token_url(domain: &str) -> String {
    format!("https://{domain}/admin/oauth/access_token")
}

/// Checks the `hmac` query parameter Shopify attaches to the callback.
///
/// The message is every other `key=value` pair (minus `signature`) sorted by
/// key and joined with `&`, signed with the app secret.
#[must_use]
pub fn verify_callback_hmac(pairs: &[(String, String)], client_secret: &str) -> bool {
    let Some(provided) = pairs
        .iter()
        .find(|(k, _)| k == "hmac")
        .map(|(_, v)| v.to_ascii_lowercase())
    else {
        return false;
    };

    let mut signed: Vec<&(String, String)> = pairs
        .iter()
        .filter(|(k, _)| k != "hmac" && k != "signature")
        .collect();
    signed.sort_by(|a, b| a.0.cmp(&b.0));

    let message = signed
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    let Ok(mut mac) = HmacSha256::new_from_slice(client_secret.as_bytes()) else {
        return false;
    };
    mac.update(message.as_bytes());
    let computed = hex::encode(mac.finalize().into_bytes());

    computed.as_bytes().ct_eq(provided.as_bytes()).into()
}

/// Exchanges an authorization `code` for an offline access token.
///
/// # Errors
///
/// - [`ShopifyError::OAuth`] when Shopify rejects the exchange or omits
///   `access_token`.
/// - [`ShopifyError::Http`] on transport failure.
pub async fn exchange_code(
    http: &Client,
    token_url: &str,
    client_id: &str,
    client_secret: &str,
    code: &str,
) -> Result<AccessGrant, ShopifyError> {
    let response = http
        .post(token_url)
        .json(&ExchangeBody {
            client_id,
            client_secret,
            code,
        })
        .send()
        .await?;

    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        let message = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| {
                ["error_description", "error", "errors"]
                    .iter()
                    .find_map(|k| v.get(*k).and_then(serde_json::Value::as_str).map(str::to_owned))
            })
            .or_else(|| (!body.trim().is_empty()).then(|| body.trim().to_string()))
            .unwrap_or_else(|| format!("token exchange failed with status {}", status.as_u16()));
        tracing::warn!(status = status.as_u16(), error = %message, "oauth token exchange rejected");
        return Err(ShopifyError::OAuth(message));
    }

    let parsed: ExchangeResponse =
        serde_json::from_str(&body).map_err(|source| ShopifyError::Deserialize {
            context: "POST /admin/oauth/access_token".to_string(),
            source,
        })?;

    match parsed.access_token.filter(|t| !t.is_empty()) {
        Some(access_token) => Ok(AccessGrant {
            access_token,
            scope: parsed.scope,
        }),
        None => Err(ShopifyError::OAuth(
            "Shopify did not return an access_token".to_string(),
        )),
    }
}
