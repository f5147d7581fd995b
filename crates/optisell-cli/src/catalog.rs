//! Integration listing, catalogue import and product push.
//!
//! These run against the same JSON data directory as the server, so the
//! server does not need to be running.

use anyhow::{anyhow, bail, Context};
use optisell_core::{validate_product_input, AppConfig, Integration, ProductCheck};
use optisell_shopify::{
    import_product, sync_product, ClientSettings, ShopifyAdminClient, SyncMode, MAX_PAGE_LIMIT,
};
use optisell_store::JsonStore;

async fn load_integration(store: &JsonStore, id: &str) -> anyhow::Result<Integration> {
    let integration = store
        .get_integration(id)
        .await?
        .ok_or_else(|| anyhow!("integration {id} not found; run `optisell-cli integrations`"))?;
    if !integration.has_token() {
        bail!(
            "integration {id} ({}) has no Admin API access token",
            integration.store_domain
        );
    }
    Ok(integration)
}

fn client_for(config: &AppConfig, integration: &Integration) -> anyhow::Result<ShopifyAdminClient> {
    ShopifyAdminClient::new(
        &integration.store_domain,
        &integration.admin_access_token,
        &ClientSettings::from_config(config),
    )
    .with_context(|| format!("building client for {}", integration.store_domain))
}

pub(crate) fn integration_row(integration: &Integration) -> String {
    let view = integration.view();
    format!(
        "{:<38}{:<34}{:<14}{}",
        view.id,
        view.store_domain,
        format!("{:?}", view.status).to_lowercase(),
        view.token_preview.as_deref().unwrap_or("(no token)")
    )
}

/// Prints stored integrations. Tokens are shown as previews only.
///
/// # Errors
///
/// Returns an error if the store cannot be read.
pub(crate) async fn run_list_integrations(store: &JsonStore) -> anyhow::Result<()> {
    let integrations = store.list_integrations().await?;
    if integrations.is_empty() {
        println!("no integrations stored; add one from the web UI or the API");
        return Ok(());
    }

    println!("{:<38}{:<34}{:<14}TOKEN", "ID", "DOMAIN", "STATUS");
    for integration in &integrations {
        println!("{}", integration_row(integration));
    }
    Ok(())
}

/// Pulls every product page of the integration's store and merges it into
/// the local catalogue.
///
/// # Errors
///
/// Returns an error if the integration is unusable, a Shopify call fails or
/// the store cannot be written.
pub(crate) async fn run_import(
    store: &JsonStore,
    config: &AppConfig,
    integration_id: &str,
) -> anyhow::Result<()> {
    let integration = load_integration(store, integration_id).await?;
    let client = client_for(config, &integration)?;

    tracing::info!(shop = %integration.store_domain, "starting import");
    let remote = client
        .fetch_all_products(MAX_PAGE_LIMIT, config.import_max_pages)
        .await?;
    let summary = store
        .merge_imported(remote.iter().map(import_product).collect())
        .await?;

    println!(
        "imported {} products from {}: {} created, {} updated",
        summary.total, integration.store_domain, summary.created, summary.updated
    );
    Ok(())
}

/// Pushes one stored product and records the returned Shopify ids on it.
///
/// # Errors
///
/// Returns an error if the product or integration is missing, the product
/// fails validation, or Shopify rejects the push.
pub(crate) async fn run_sync(
    store: &JsonStore,
    config: &AppConfig,
    product_id: &str,
    integration_id: &str,
    intelligent: bool,
) -> anyhow::Result<()> {
    let product = store
        .get_product(product_id)
        .await?
        .ok_or_else(|| anyhow!("product {product_id} not found"))?;
    let draft = product.to_draft();
    validate_product_input(&draft, ProductCheck::Push)
        .with_context(|| format!("product {product_id} cannot be pushed"))?;

    let integration = load_integration(store, integration_id).await?;
    let client = client_for(config, &integration)?;
    let mode = if intelligent {
        SyncMode::Intelligent
    } else {
        SyncMode::Direct
    };

    let outcome = sync_product(&client, &draft, mode).await?;
    store
        .record_shopify_link(
            product_id,
            outcome.shopify_product_id.clone(),
            outcome.shopify_variant_id.clone(),
        )
        .await?;

    println!(
        "{:?} shopify product {} (variant {}) for {}",
        outcome.action,
        outcome.shopify_product_id,
        outcome.shopify_variant_id.as_deref().unwrap_or("-"),
        product.sku
    );
    Ok(())
}
