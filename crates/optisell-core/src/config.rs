use crate::app_config::{AppConfig, Environment, ShopifyAppCredentials};
use crate::ConfigError;

pub const DEFAULT_SHOPIFY_API_VERSION: &str = "2024-10";
pub const DEFAULT_SHOPIFY_SCOPES: &str =
    "read_products,write_products,read_inventory,write_inventory";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so tests can feed a `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let env = parse_environment(&or_default("OPTISELL_ENV", "development"));
    let bind_addr = parse_addr("OPTISELL_BIND_ADDR", "0.0.0.0:4000")?;
    let log_level = or_default("OPTISELL_LOG_LEVEL", "info");
    let data_dir = PathBuf::from(or_default("OPTISELL_DATA_DIR", "./data"));
    let frontend_url = or_default("OPTISELL_FRONTEND_URL", "http://localhost:5173")
        .trim_end_matches('/')
        .to_string();

    let api_keys = or_default("OPTISELL_API_KEYS", "")
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
        .collect();

    let shopify = ShopifyAppCredentials {
        client_id: optional("SHOPIFY_CLIENT_ID"),
        client_secret: optional("SHOPIFY_CLIENT_SECRET"),
        redirect_uri: or_default(
            "SHOPIFY_REDIRECT_URI",
            "http://localhost:4000/api/shopify/callback",
        ),
        scopes: or_default("SHOPIFY_SCOPES", DEFAULT_SHOPIFY_SCOPES),
    };

    let shopify_api_version = or_default("SHOPIFY_API_VERSION", DEFAULT_SHOPIFY_API_VERSION);
    let shopify_request_timeout_secs = parse_u64("OPTISELL_SHOPIFY_TIMEOUT_SECS", "30")?;
    let shopify_user_agent = or_default("OPTISELL_SHOPIFY_USER_AGENT", "optisell-integrator/0.1");
    let import_max_pages = parse_usize("OPTISELL_IMPORT_MAX_PAGES", "40")?;
    if import_max_pages == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "OPTISELL_IMPORT_MAX_PAGES".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        data_dir,
        frontend_url,
        api_keys,
        shopify,
        shopify_api_version,
        shopify_request_timeout_secs,
        shopify_user_agent,
        import_max_pages,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
