pub mod app_config;
pub mod config;
pub mod integrations;
pub mod products;
pub mod shop;
pub mod validation;

use thiserror::Error;

pub use app_config::{AppConfig, Environment, ShopifyAppCredentials};
pub use config::{load_app_config, load_app_config_from_env};
pub use integrations::{
    Integration, IntegrationPatch, IntegrationSource, IntegrationStatus, IntegrationView,
    NewIntegration, Platform,
};
pub use products::{
    ImportedProduct, LocalProduct, ProductDraft, ProductImage, SHOPIFY_INTEGRATION,
};
pub use shop::{
    classify_token, clean_token, normalize_shop_domain, store_name, token_preview, DomainError,
    TokenKind,
};
pub use validation::{
    validate_integration_update, validate_new_integration, validate_product_input,
    IntegrationInput, ProductCheck, ValidationErrors,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
