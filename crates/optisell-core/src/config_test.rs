use std::collections::HashMap;
use std::env::VarError;

use super::*;

fn lookup_from_map<'a>(
    map: &'a HashMap<&'a str, &'a str>,
) -> impl Fn(&str) -> Result<String, VarError> + 'a {
    move |key| {
        map.get(key)
            .map(|v| (*v).to_string())
            .ok_or(VarError::NotPresent)
    }
}

#[test]
fn parse_environment_development() {
    assert_eq!(parse_environment("development"), Environment::Development);
}

#[test]
fn parse_environment_production() {
    assert_eq!(parse_environment("production"), Environment::Production);
}

#[test]
fn parse_environment_unknown_defaults_to_development() {
    assert_eq!(parse_environment("staging"), Environment::Development);
}

#[test]
fn build_app_config_defaults_with_empty_env() {
    let map: HashMap<&str, &str> = HashMap::new();
    let cfg = build_app_config(lookup_from_map(&map)).expect("defaults should be valid");
    assert_eq!(cfg.env, Environment::Development);
    assert_eq!(cfg.bind_addr.to_string(), "0.0.0.0:4000");
    assert_eq!(cfg.log_level, "info");
    assert_eq!(cfg.data_dir.to_string_lossy(), "./data");
    assert_eq!(cfg.frontend_url, "http://localhost:5173");
    assert!(cfg.api_keys.is_empty());
    assert!(cfg.shopify.client_id.is_none());
    assert!(cfg.shopify.client_secret.is_none());
    assert_eq!(
        cfg.shopify.redirect_uri,
        "http://localhost:4000/api/shopify/callback"
    );
    assert_eq!(cfg.shopify.scopes, DEFAULT_SHOPIFY_SCOPES);
    assert_eq!(cfg.shopify_api_version, "2024-10");
    assert_eq!(cfg.shopify_request_timeout_secs, 30);
    assert_eq!(cfg.shopify_user_agent, "optisell-integrator/0.1");
    assert_eq!(cfg.import_max_pages, 40);
}

#[test]
fn build_app_config_fails_with_invalid_bind_addr() {
    let mut map = HashMap::new();
    map.insert("OPTISELL_BIND_ADDR", "not-a-socket-addr");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "OPTISELL_BIND_ADDR"),
        "expected InvalidEnvVar(OPTISELL_BIND_ADDR), got: {result:?}"
    );
}

#[test]
fn build_app_config_fails_with_invalid_timeout() {
    let mut map = HashMap::new();
    map.insert("OPTISELL_SHOPIFY_TIMEOUT_SECS", "soon");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "OPTISELL_SHOPIFY_TIMEOUT_SECS"),
        "expected InvalidEnvVar(OPTISELL_SHOPIFY_TIMEOUT_SECS), got: {result:?}"
    );
}

#[test]
fn build_app_config_rejects_zero_import_pages() {
    let mut map = HashMap::new();
    map.insert("OPTISELL_IMPORT_MAX_PAGES", "0");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "OPTISELL_IMPORT_MAX_PAGES"),
        "expected InvalidEnvVar(OPTISELL_IMPORT_MAX_PAGES), got: {result:?}"
    );
}

#[test]
fn build_app_config_splits_api_keys() {
    let mut map = HashMap::new();
    map.insert("OPTISELL_API_KEYS", " key-a, ,key-b ");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.api_keys, vec!["key-a".to_string(), "key-b".to_string()]);
}

#[test]
fn build_app_config_blank_client_id_is_none() {
    let mut map = HashMap::new();
    map.insert("SHOPIFY_CLIENT_ID", "   ");
    map.insert("SHOPIFY_CLIENT_SECRET", "secret");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert!(cfg.shopify.client_id.is_none());
    assert_eq!(cfg.shopify.client_secret.as_deref(), Some("secret"));
}

#[test]
fn build_app_config_trims_frontend_trailing_slash() {
    let mut map = HashMap::new();
    map.insert("OPTISELL_FRONTEND_URL", "https://app.example.com/");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.frontend_url, "https://app.example.com");
}

#[test]
fn debug_output_redacts_secrets() {
    let mut map = HashMap::new();
    map.insert("SHOPIFY_CLIENT_SECRET", "super-secret-value");
    map.insert("OPTISELL_API_KEYS", "bearer-key");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    let rendered = format!("{cfg:?}");
    assert!(!rendered.contains("super-secret-value"));
    assert!(!rendered.contains("bearer-key"));
    assert!(rendered.contains("[redacted]"));
}
