//! `check-token`: diagnose an Admin API token before storing it.

use anyhow::bail;
use optisell_core::{classify_token, clean_token, AppConfig, TokenKind};
use optisell_shopify::{
    ClientSettings, ConnectionFailure, ConnectionTest, ShopifyAdminClient, ShopifyShop,
};

/// Prefix diagnosis printed before the token is tried.
pub(crate) fn describe_token(kind: TokenKind) -> String {
    if kind.is_admin() {
        format!("token type: {}", kind.describe())
    } else {
        format!(
            "warning: token looks like a {}; create an Admin API access token under \
             Settings > Apps and sales channels > Develop apps",
            kind.describe()
        )
    }
}

fn field(value: Option<&str>) -> &str {
    value.filter(|v| !v.is_empty()).unwrap_or("-")
}

pub(crate) fn shop_lines(shop: &ShopifyShop) -> Vec<String> {
    vec![
        format!("{:<10}{}", "id", shop.id),
        format!("{:<10}{}", "name", shop.name),
        format!("{:<10}{}", "email", field(shop.email.as_deref())),
        format!(
            "{:<10}{}",
            "domain",
            field(shop.domain.as_deref().or(shop.myshopify_domain.as_deref()))
        ),
        format!("{:<10}{}", "currency", field(shop.currency.as_deref())),
        format!("{:<10}{}", "timezone", field(shop.iana_timezone.as_deref())),
    ]
}

pub(crate) fn failure_lines(failure: &ConnectionFailure) -> Vec<String> {
    let status = failure
        .status
        .map_or_else(|| "no response".to_string(), |s| s.to_string());
    vec![
        format!("connection failed ({status}): {}", failure.message),
        format!("hint: {}", failure.hint),
    ]
}

/// Calls `/shop.json` with the token and prints what came back.
///
/// # Errors
///
/// Returns an error when the client cannot be built or the call fails, so
/// the process exits non-zero.
pub(crate) async fn run_check_token(
    config: &AppConfig,
    store: &str,
    token: &str,
) -> anyhow::Result<()> {
    let token = clean_token(token);
    println!("{}", describe_token(classify_token(&token)));

    let client = ShopifyAdminClient::new(store, &token, &ClientSettings::from_config(config))?;
    println!("checking {} ...", client.shop_domain());

    match client.test_connection().await {
        ConnectionTest::Connected(shop) => {
            println!("connected");
            for line in shop_lines(&shop) {
                println!("  {line}");
            }
            Ok(())
        }
        ConnectionTest::Failed(failure) => {
            for line in failure_lines(&failure) {
                eprintln!("{line}");
            }
            bail!("token check failed for {}", client.shop_domain())
        }
    }
}
