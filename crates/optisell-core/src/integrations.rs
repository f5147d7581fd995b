//! Stored Shopify store connections.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shop::token_preview;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    #[default]
    Shopify,
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Platform::Shopify => write!(f, "Shopify"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntegrationStatus {
    #[default]
    Disconnected,
    Connected,
    Error,
}

/// How the access token was obtained.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntegrationSource {
    #[default]
    Manual,
    Oauth,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Integration {
    pub id: String,
    #[serde(default)]
    pub platform: Platform,
    pub integration_name: String,
    /// Canonical `{handle}.myshopify.com` domain.
    pub store_domain: String,
    pub admin_access_token: String,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub source: IntegrationSource,
    #[serde(default)]
    pub status: IntegrationStatus,
    #[serde(default)]
    pub shop_name: Option<String>,
    #[serde(default)]
    pub last_tested_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated input for a new integration. `store_domain` must already be
/// normalized and `admin_access_token` cleaned.
#[derive(Debug, Clone)]
pub struct NewIntegration {
    pub integration_name: Option<String>,
    pub store_domain: String,
    pub admin_access_token: String,
    pub scope: Option<String>,
    pub source: IntegrationSource,
}

impl Integration {
    #[must_use]
    pub fn create(input: NewIntegration, now: DateTime<Utc>) -> Self {
        let integration_name = input
            .integration_name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| format!("Shopify - {}", input.store_domain));

        Self {
            id: Uuid::new_v4().to_string(),
            platform: Platform::Shopify,
            integration_name,
            store_domain: input.store_domain,
            admin_access_token: input.admin_access_token,
            scope: input.scope,
            source: input.source,
            status: IntegrationStatus::Disconnected,
            shop_name: None,
            last_tested_at: None,
            last_error: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[must_use]
    pub fn has_token(&self) -> bool {
        !self.admin_access_token.trim().is_empty()
    }

    /// Applies a patch and bumps `updated_at`.
    ///
    /// Changing the domain or token invalidates the last connection test.
    pub fn apply(&mut self, patch: IntegrationPatch, now: DateTime<Utc>) {
        let mut credentials_changed = false;

        if let Some(name) = patch.integration_name {
            self.integration_name = name;
        }
        if let Some(domain) = patch.store_domain {
            credentials_changed |= domain != self.store_domain;
            self.store_domain = domain;
        }
        if let Some(token) = patch.admin_access_token {
            credentials_changed |= token != self.admin_access_token;
            self.admin_access_token = token;
        }
        if let Some(scope) = patch.scope {
            self.scope = scope;
        }
        if let Some(source) = patch.source {
            self.source = source;
        }

        if credentials_changed {
            self.status = IntegrationStatus::Disconnected;
            self.last_error = None;
            self.shop_name = None;
        }

        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(shop_name) = patch.shop_name {
            self.shop_name = shop_name;
        }
        if let Some(tested_at) = patch.last_tested_at {
            self.last_tested_at = Some(tested_at);
        }
        if let Some(last_error) = patch.last_error {
            self.last_error = last_error;
        }

        self.updated_at = now;
    }

    #[must_use]
    pub fn view(&self) -> IntegrationView {
        IntegrationView {
            id: self.id.clone(),
            platform: self.platform,
            integration_name: self.integration_name.clone(),
            store_domain: self.store_domain.clone(),
            has_token: self.has_token(),
            token_preview: self
                .has_token()
                .then(|| token_preview(&self.admin_access_token)),
            scope: self.scope.clone(),
            source: self.source,
            status: self.status,
            shop_name: self.shop_name.clone(),
            last_tested_at: self.last_tested_at,
            last_error: self.last_error.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

// Option<Option<T>>: outer None = leave as is, Some(None) = clear.
#[allow(clippy::option_option)]
#[derive(Debug, Clone, Default)]
pub struct IntegrationPatch {
    pub integration_name: Option<String>,
    pub store_domain: Option<String>,
    pub admin_access_token: Option<String>,
    pub scope: Option<Option<String>>,
    pub source: Option<IntegrationSource>,
    pub status: Option<IntegrationStatus>,
    pub shop_name: Option<Option<String>>,
    pub last_tested_at: Option<DateTime<Utc>>,
    pub last_error: Option<Option<String>>,
}

/// API-facing projection of an [`Integration`]; never carries the token.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrationView {
    pub id: String,
    pub platform: Platform,
    pub integration_name: String,
    pub store_domain: String,
    pub has_token: bool,
    pub token_preview: Option<String>,
    pub scope: Option<String>,
    pub source: IntegrationSource,
    pub status: IntegrationStatus,
    pub shop_name: Option<String>,
    pub last_tested_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
