use super::*;

use chrono::Utc;
use optisell_core::{Integration, IntegrationSource, NewIntegration, TokenKind};
use optisell_shopify::{ConnectionFailure, ShopifyShop};

fn sample_integration(token: &str) -> Integration {
    Integration::create(
        NewIntegration {
            integration_name: None,
            store_domain: "optisell-3.myshopify.com".to_string(),
            admin_access_token: token.to_string(),
            scope: None,
            source: IntegrationSource::Manual,
        },
        Utc::now(),
    )
}

#[test]
fn parses_check_token_command() {
    let cli = Cli::try_parse_from(["optisell-cli", "check-token", "optisell-3", "shpat_abc"])
        .expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Commands::CheckToken { ref store, ref token }
            if store == "optisell-3" && token == "shpat_abc"
    ));
}

#[test]
fn parses_integrations_command() {
    let cli = Cli::try_parse_from(["optisell-cli", "integrations"]).expect("expected valid cli args");
    assert!(matches!(cli.command, Commands::Integrations));
}

#[test]
fn parses_import_command() {
    let cli = Cli::try_parse_from(["optisell-cli", "import", "int-1"]).expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Commands::Import { ref integration_id } if integration_id == "int-1"
    ));
}

#[test]
fn sync_defaults_to_direct() {
    let cli = Cli::try_parse_from(["optisell-cli", "sync", "p-1", "--integration", "int-1"])
        .expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Commands::Sync { intelligent: false, .. }
    ));
}

#[test]
fn sync_accepts_intelligent_flag() {
    let cli = Cli::try_parse_from([
        "optisell-cli",
        "sync",
        "p-1",
        "--integration",
        "int-1",
        "--intelligent",
    ])
    .expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Commands::Sync { ref product_id, ref integration, intelligent: true }
            if product_id == "p-1" && integration == "int-1"
    ));
}

#[test]
fn sync_requires_integration() {
    assert!(Cli::try_parse_from(["optisell-cli", "sync", "p-1"]).is_err());
}

#[test]
fn missing_command_is_an_error() {
    assert!(Cli::try_parse_from(["optisell-cli"]).is_err());
}

#[test]
fn storefront_token_gets_a_warning() {
    let line = token::describe_token(TokenKind::Storefront);
    assert!(line.starts_with("warning:"));
    assert!(line.contains("shpss_"));

    let line = token::describe_token(TokenKind::AdminPrivate);
    assert!(line.starts_with("token type:"));
}

#[test]
fn shop_lines_fall_back_to_myshopify_domain() {
    let shop: ShopifyShop = serde_json::from_value(serde_json::json!({
        "id": 7,
        "name": "OptiSell Demo",
        "myshopify_domain": "optisell-3.myshopify.com",
        "currency": "RON"
    }))
    .expect("shop json");

    let lines = token::shop_lines(&shop);
    assert!(lines.iter().any(|l| l.ends_with("optisell-3.myshopify.com")));
    assert!(lines.iter().any(|l| l.starts_with("email") && l.ends_with('-')));
}

#[test]
fn failure_lines_include_status_and_hint() {
    let failure = ConnectionFailure {
        status: Some(401),
        message: "Invalid API key or access token".to_string(),
        hint: "use an Admin API token".to_string(),
        details: None,
    };
    let lines = token::failure_lines(&failure);
    assert_eq!(lines[0], "connection failed (401): Invalid API key or access token");
    assert_eq!(lines[1], "hint: use an Admin API token");
}

#[test]
fn integration_row_shows_preview_only() {
    let row = catalog::integration_row(&sample_integration("shpat_0123456789abcdef"));
    assert!(row.contains("shpat_012345678..."));
    assert!(!row.contains("shpat_0123456789abcdef"));
    assert!(row.contains("disconnected"));

    let row = catalog::integration_row(&sample_integration(""));
    assert!(row.ends_with("(no token)"));
}
