use thiserror::Error;

#[derive(Debug, Error)]
pub enum ShopifyError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// Shopify answered with a non-2xx status.
    #[error("Shopify API error {status}: {message}")]
    Api {
        status: u16,
        message: String,
        details: Option<serde_json::Value>,
    },

    #[error("unexpected response from {context}: missing \"{key}\"")]
    UnexpectedResponse { context: String, key: &'static str },

    #[error("pagination limit reached for {shop}: exceeded {max_pages} pages")]
    PaginationLimit { shop: String, max_pages: usize },

    #[error(transparent)]
    InvalidShopDomain(#[from] optisell_core::DomainError),

    #[error("invalid access token: {0}")]
    InvalidAccessToken(String),

    #[error("invalid request URL {0}")]
    InvalidUrl(String),

    #[error("invalid Shopify id \"{0}\"")]
    InvalidId(String),

    #[error("OAuth error: {0}")]
    OAuth(String),
}

impl ShopifyError {
    /// HTTP status from Shopify, when the failure came from a response.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            ShopifyError::Api { status, .. } => Some(*status),
            ShopifyError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    #[must_use]
    pub fn details(&self) -> Option<&serde_json::Value> {
        match self {
            ShopifyError::Api { details, .. } => details.as_ref(),
            _ => None,
        }
    }
}

/// User-facing guidance for a failed Shopify call, keyed on HTTP status.
#[must_use]
pub fn status_hint(status: Option<u16>) -> String {
    match status {
        None => "Unknown error. Check that the store name is correct and that the server can \
                 reach Shopify."
            .to_string(),
        Some(401) => "Invalid or expired token. Check the Admin API access token: it must start \
                      with \"shpat_\", be copied in full, and the app must still be installed \
                      on the store."
            .to_string(),
        Some(403) => "Missing permissions for this action. Check the app scopes in Shopify \
                      (read_products, write_products, read_inventory, write_inventory)."
            .to_string(),
        Some(404) => "Resource not found in Shopify. Check that the store name is correct."
            .to_string(),
        Some(422) => "Invalid data. Check that every field is valid and that the SKU is unique."
            .to_string(),
        Some(429) => "Too many requests. Wait a few seconds and try again.".to_string(),
        Some(s) if (500..600).contains(&s) => {
            "Shopify server error. Try again later.".to_string()
        }
        Some(s) => format!(
            "Error while calling the Shopify API (status {s}). Check the token and the store name."
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hint_covers_auth_failures() {
        assert!(status_hint(Some(401)).contains("shpat_"));
        assert!(status_hint(Some(403)).contains("write_products"));
    }

    #[test]
    fn hint_groups_server_errors() {
        assert_eq!(status_hint(Some(502)), status_hint(Some(503)));
        assert!(status_hint(Some(500)).contains("Shopify server error"));
    }

    #[test]
    fn hint_without_status_mentions_network() {
        assert!(status_hint(None).contains("reach Shopify"));
    }

    #[test]
    fn hint_falls_back_to_status_code() {
        assert!(status_hint(Some(418)).contains("418"));
    }

    #[test]
    fn api_error_exposes_status() {
        let err = ShopifyError::Api {
            status: 422,
            message: "sku taken".to_string(),
            details: None,
        };
        assert_eq!(err.status(), Some(422));
        assert_eq!(err.to_string(), "Shopify API error 422: sku taken");
    }
}
