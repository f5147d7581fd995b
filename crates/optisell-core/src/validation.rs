//! Request-level validation. Every check runs so callers can report all
//! problems at once.

use serde::Deserialize;
use thiserror::Error;

use crate::integrations::{IntegrationPatch, IntegrationSource, NewIntegration};
use crate::products::ProductDraft;
use crate::shop::{
    classify_token, clean_token, normalize_shop_domain, DomainError, MYSHOPIFY_SUFFIX,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", .0.join("; "))]
pub struct ValidationErrors(pub Vec<String>);

impl ValidationErrors {
    #[must_use]
    pub fn messages(&self) -> &[String] {
        &self.0
    }

    fn into_result<T>(self, value: T) -> Result<T, Self> {
        if self.0.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

/// Integration fields as they arrive in a create or update request body.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrationInput {
    pub integration_name: Option<String>,
    pub store_domain: Option<String>,
    pub admin_access_token: Option<String>,
}

/// What a product payload is about to be used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductCheck {
    /// New local record: `name` required.
    Create,
    /// Partial update: only fields present are checked.
    Update,
    /// Sent to Shopify: `name` and `sku` required.
    Push,
}

fn check_domain(raw: &str, errors: &mut Vec<String>) -> Option<String> {
    match normalize_shop_domain(raw) {
        Ok(domain) => Some(domain),
        Err(DomainError::Invalid { .. }) => {
            errors.push(format!(
                "storeDomain must be a {MYSHOPIFY_SUFFIX} domain (got \"{}\")",
                raw.trim()
            ));
            None
        }
        Err(DomainError::Empty) => {
            errors.push("storeDomain is required".to_string());
            None
        }
    }
}

fn check_token(raw: &str, errors: &mut Vec<String>) -> Option<String> {
    let token = clean_token(raw);
    if token.is_empty() {
        errors.push("adminAccessToken is required".to_string());
        return None;
    }
    let kind = classify_token(&token);
    if kind.is_admin() {
        Some(token)
    } else {
        errors.push(format!(
            "adminAccessToken must start with shpat_ or shpca_ (got {})",
            kind.describe()
        ));
        None
    }
}

fn clean_name(raw: Option<String>) -> Option<String> {
    raw.map(|n| n.trim().to_string()).filter(|n| !n.is_empty())
}

/// # Errors
///
/// Returns every problem found in `input`.
pub fn validate_new_integration(input: IntegrationInput) -> Result<NewIntegration, ValidationErrors> {
    let mut errors = Vec::new();

    let domain = match input.store_domain.as_deref() {
        Some(raw) => check_domain(raw, &mut errors),
        None => {
            errors.push("storeDomain is required".to_string());
            None
        }
    };
    let token = match input.admin_access_token.as_deref() {
        Some(raw) => check_token(raw, &mut errors),
        None => {
            errors.push("adminAccessToken is required".to_string());
            None
        }
    };

    match (domain, token) {
        (Some(store_domain), Some(admin_access_token)) if errors.is_empty() => Ok(NewIntegration {
            integration_name: clean_name(input.integration_name),
            store_domain,
            admin_access_token,
            scope: None,
            source: IntegrationSource::Manual,
        }),
        _ => Err(ValidationErrors(errors)),
    }
}

/// Applies the create rules to the fields present in `input`.
///
/// # Errors
///
/// Returns every problem found in the present fields.
pub fn validate_integration_update(
    input: IntegrationInput,
) -> Result<IntegrationPatch, ValidationErrors> {
    let mut errors = Vec::new();

    let store_domain = input
        .store_domain
        .as_deref()
        .and_then(|raw| check_domain(raw, &mut errors));
    let admin_access_token = input
        .admin_access_token
        .as_deref()
        .and_then(|raw| check_token(raw, &mut errors));
    // A blank name leaves the current label in place.
    let integration_name = input.integration_name.map(|n| n.trim().to_string());

    let patch = IntegrationPatch {
        integration_name: integration_name.filter(|n| !n.is_empty()),
        store_domain,
        admin_access_token,
        ..IntegrationPatch::default()
    };
    ValidationErrors(errors).into_result(patch)
}

fn check_decimal(field: &str, value: Option<&str>, errors: &mut Vec<String>) {
    let Some(raw) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return;
    };
    match raw.replace(',', ".").parse::<f64>() {
        Ok(n) if n.is_finite() && n >= 0.0 => {}
        _ => errors.push(format!("{field} must be a non-negative number (got \"{raw}\")")),
    }
}

fn is_blank(value: Option<&str>) -> bool {
    value.is_none_or(|v| v.trim().is_empty())
}

/// # Errors
///
/// Returns every problem found in `draft` for the given use.
pub fn validate_product_input(draft: &ProductDraft, check: ProductCheck) -> Result<(), ValidationErrors> {
    let mut errors = Vec::new();

    let name = draft.name.as_deref();
    match check {
        ProductCheck::Create | ProductCheck::Push if is_blank(name) => {
            errors.push("name is required".to_string());
        }
        ProductCheck::Update if name.is_some() && is_blank(name) => {
            errors.push("name cannot be blank".to_string());
        }
        _ => {}
    }
    if check == ProductCheck::Push && is_blank(draft.sku.as_deref()) {
        errors.push("sku is required to sync with Shopify".to_string());
    }

    check_decimal("price", draft.price.as_deref(), &mut errors);
    check_decimal("comparePrice", draft.compare_price.as_deref(), &mut errors);
    check_decimal("weight", draft.weight.as_deref(), &mut errors);

    if draft.stock.is_some_and(|s| s < 0) {
        errors.push("stock cannot be negative".to_string());
    }

    ValidationErrors(errors).into_result(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(domain: Option<&str>, token: Option<&str>) -> IntegrationInput {
        IntegrationInput {
            integration_name: None,
            store_domain: domain.map(ToOwned::to_owned),
            admin_access_token: token.map(ToOwned::to_owned),
        }
    }

    #[test]
    fn new_integration_normalizes_domain_and_token() {
        let new = validate_new_integration(input(
            Some("https://Optisell-3.myshopify.com/"),
            Some(" shpat_abc 123 "),
        ))
        .expect("valid input");
        assert_eq!(new.store_domain, "optisell-3.myshopify.com");
        assert_eq!(new.admin_access_token, "shpat_abc123");
        assert_eq!(new.source, IntegrationSource::Manual);
    }

    #[test]
    fn bare_handle_is_expanded() {
        let new = validate_new_integration(input(Some("optisell-3"), Some("shpca_x"))).unwrap();
        assert_eq!(new.store_domain, "optisell-3.myshopify.com");
    }

    #[test]
    fn new_integration_collects_all_errors() {
        let err = validate_new_integration(input(None, Some("shpss_storefront"))).unwrap_err();
        assert_eq!(err.messages().len(), 2);
        assert!(err.messages()[0].contains("storeDomain"));
        assert!(err.messages()[1].contains("shpss_"));
    }

    #[test]
    fn foreign_domain_is_rejected() {
        let err =
            validate_new_integration(input(Some("shop.example.com"), Some("shpat_x"))).unwrap_err();
        assert!(err.to_string().contains(".myshopify.com"));
    }

    #[test]
    fn blank_token_is_required() {
        let err = validate_new_integration(input(Some("shop"), Some("   "))).unwrap_err();
        assert_eq!(err.messages(), ["adminAccessToken is required".to_string()]);
    }

    #[test]
    fn update_checks_only_present_fields() {
        let patch = validate_integration_update(IntegrationInput {
            integration_name: Some("Main".to_string()),
            ..IntegrationInput::default()
        })
        .unwrap();
        assert_eq!(patch.integration_name.as_deref(), Some("Main"));
        assert!(patch.store_domain.is_none());
        assert!(patch.admin_access_token.is_none());
    }

    #[test]
    fn update_rejects_bad_token() {
        let err = validate_integration_update(input(None, Some("abc"))).unwrap_err();
        assert_eq!(err.messages().len(), 1);
    }

    #[test]
    fn push_requires_name_and_sku() {
        let err = validate_product_input(&ProductDraft::default(), ProductCheck::Push).unwrap_err();
        assert_eq!(err.messages().len(), 2);
    }

    #[test]
    fn create_requires_only_name() {
        let draft = ProductDraft {
            name: Some("Mug".to_string()),
            ..ProductDraft::default()
        };
        assert!(validate_product_input(&draft, ProductCheck::Create).is_ok());
    }

    #[test]
    fn update_allows_missing_name_but_not_blank() {
        assert!(validate_product_input(&ProductDraft::default(), ProductCheck::Update).is_ok());
        let draft = ProductDraft {
            name: Some("  ".to_string()),
            ..ProductDraft::default()
        };
        assert!(validate_product_input(&draft, ProductCheck::Update).is_err());
    }

    #[test]
    fn prices_and_weight_must_be_non_negative_numbers() {
        let draft = ProductDraft {
            name: Some("Mug".to_string()),
            price: Some("abc".to_string()),
            compare_price: Some("-1".to_string()),
            weight: Some("0,5".to_string()),
            ..ProductDraft::default()
        };
        let err = validate_product_input(&draft, ProductCheck::Create).unwrap_err();
        assert_eq!(err.messages().len(), 2);
        assert!(err.messages()[0].starts_with("price"));
        assert!(err.messages()[1].starts_with("comparePrice"));
    }
}
