//! Shop-domain and access-token rules shared by every Shopify-facing path.
//!
//! Users type store identifiers in several shapes (`optisell-3`,
//! `optisell-3.myshopify.com`, `https://optisell-3.myshopify.com/admin`).
//! Everything is reduced to the canonical `{handle}.myshopify.com` form
//! before it is stored or used to build a URL.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

pub const MYSHOPIFY_SUFFIX: &str = ".myshopify.com";

const TOKEN_PREVIEW_CHARS: usize = 15;

static SHOP_DOMAIN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9][a-z0-9-]*\.myshopify\.com$").expect("shop domain regex is valid")
});

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("store domain is required")]
    Empty,

    #[error("\"{input}\" is not a valid Shopify store domain (expected <store>.myshopify.com)")]
    Invalid { input: String },
}

/// Reduces user input to the canonical `{handle}.myshopify.com` domain.
///
/// # Errors
///
/// Returns [`DomainError::Empty`] for blank input and
/// [`DomainError::Invalid`] when the result is not a `myshopify.com` host.
pub fn normalize_shop_domain(input: &str) -> Result<String, DomainError> {
    let lowered = input.trim().to_lowercase();
    if lowered.is_empty() {
        return Err(DomainError::Empty);
    }

    let without_scheme = lowered
        .strip_prefix("https://")
        .or_else(|| lowered.strip_prefix("http://"))
        .unwrap_or(&lowered);

    let host = without_scheme
        .split(['/', '?', '#'])
        .next()
        .unwrap_or_default()
        .trim_end_matches('.');

    let domain = if host.ends_with(MYSHOPIFY_SUFFIX) {
        host.to_string()
    } else {
        format!("{host}{MYSHOPIFY_SUFFIX}")
    };

    if SHOP_DOMAIN_RE.is_match(&domain) {
        Ok(domain)
    } else {
        Err(DomainError::Invalid {
            input: input.trim().to_string(),
        })
    }
}

/// Returns the store handle, e.g. `optisell-3` for `optisell-3.myshopify.com`.
#[must_use]
pub fn store_name(domain: &str) -> &str {
    domain.strip_suffix(MYSHOPIFY_SUFFIX).unwrap_or(domain)
}

/// The family a Shopify token belongs to, inferred from its prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// `shpat_`: private or custom app Admin API token.
    AdminPrivate,
    /// `shpca_`: custom app Admin API token.
    AdminCustom,
    /// `shpss_`: Storefront API token.
    Storefront,
    /// `shpcn_`: custom app Storefront API token.
    CustomStorefront,
    Unknown,
}

impl TokenKind {
    /// Only Admin API tokens can call `/admin/api/...`.
    #[must_use]
    pub fn is_admin(self) -> bool {
        matches!(self, TokenKind::AdminPrivate | TokenKind::AdminCustom)
    }

    #[must_use]
    pub fn describe(self) -> &'static str {
        match self {
            TokenKind::AdminPrivate => "Admin API access token (shpat_)",
            TokenKind::AdminCustom => "custom app Admin API access token (shpca_)",
            TokenKind::Storefront => {
                "Storefront API access token (shpss_), which does not work with the Admin API"
            }
            TokenKind::CustomStorefront => {
                "custom app Storefront API access token (shpcn_), which does not work with the Admin API"
            }
            TokenKind::Unknown => "unrecognized token",
        }
    }
}

/// Trims the token and removes any whitespace pasted into the middle of it.
#[must_use]
pub fn clean_token(raw: &str) -> String {
    raw.chars().filter(|c| !c.is_whitespace()).collect()
}

#[must_use]
pub fn classify_token(token: &str) -> TokenKind {
    if token.starts_with("shpat_") {
        TokenKind::AdminPrivate
    } else if token.starts_with("shpca_") {
        TokenKind::AdminCustom
    } else if token.starts_with("shpss_") {
        TokenKind::Storefront
    } else if token.starts_with("shpcn_") {
        TokenKind::CustomStorefront
    } else {
        TokenKind::Unknown
    }
}

/// Loggable form of a token: the first 15 characters followed by `...`.
#[must_use]
pub fn token_preview(token: &str) -> String {
    let head: String = token.chars().take(TOKEN_PREVIEW_CHARS).collect();
    format!("{head}...")
}
