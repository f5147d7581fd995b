//! Create-or-update orchestration for pushing local products.

use optisell_core::ProductDraft;
use serde::Serialize;

use crate::client::ShopifyAdminClient;
use crate::error::ShopifyError;
use crate::mapping::{create_payload, has_variant_changes, parse_shopify_id, update_payload};
use crate::types::ShopifyProduct;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// Update when the draft carries a Shopify id, otherwise create.
    Direct,
    /// Like `Direct`, but first looks for an existing product by SKU.
    Intelligent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncAction {
    Created,
    Updated,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncOutcome {
    pub action: SyncAction,
    pub shopify_product_id: String,
    pub shopify_variant_id: Option<String>,
    pub product: ShopifyProduct,
}

impl SyncOutcome {
    fn new(action: SyncAction, product: ShopifyProduct) -> Self {
        Self {
            action,
            shopify_product_id: product.id.to_string(),
            shopify_variant_id: product.variants.first().map(|v| v.id.to_string()),
            product,
        }
    }
}

/// One entry of a [`sync_many`] run, keyed by the caller's product id.
#[derive(Debug)]
pub struct SyncResult {
    pub id: String,
    pub outcome: Result<SyncOutcome, ShopifyError>,
}

fn linked_id(draft: &ProductDraft) -> Option<&str> {
    draft
        .shopify_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
}

/// Pushes `draft` to Shopify.
///
/// A linked update without a variant id looks the first variant up so
/// price, SKU and stock changes still land.
///
/// # Errors
///
/// Returns [`ShopifyError::InvalidId`] for a non-numeric linked id and
/// propagates every client error unchanged.
pub async fn sync_product(
    client: &ShopifyAdminClient,
    draft: &ProductDraft,
    mode: SyncMode,
) -> Result<SyncOutcome, ShopifyError> {
    if let Some(raw_id) = linked_id(draft) {
        let id = parse_shopify_id(raw_id)?;
        let payload = if draft.shopify_variant_id.is_none() && has_variant_changes(draft) {
            let current = client.get_product(id).await?;
            let mut linked = draft.clone();
            linked.shopify_variant_id = current.variants.first().map(|v| v.id.to_string());
            update_payload(id, &linked)?
        } else {
            update_payload(id, draft)?
        };
        let product = client.update_product(id, &payload).await?;
        return Ok(SyncOutcome::new(SyncAction::Updated, product));
    }

    if mode == SyncMode::Intelligent {
        if let Some(sku) = draft.sku.as_deref() {
            if let Some(found) = client.find_product_by_sku(sku).await? {
                tracing::info!(
                    shop = %client.shop_domain(),
                    sku,
                    product_id = found.product.id,
                    "sku matched existing product"
                );
                let mut linked = draft.clone();
                linked.shopify_id = Some(found.product.id.to_string());
                if linked.shopify_variant_id.is_none() {
                    linked.shopify_variant_id = Some(found.variant.id.to_string());
                }
                let payload = update_payload(found.product.id, &linked)?;
                let product = client.update_product(found.product.id, &payload).await?;
                return Ok(SyncOutcome::new(SyncAction::Updated, product));
            }
        }
    }

    let product = client.create_product(&create_payload(draft)).await?;
    Ok(SyncOutcome::new(SyncAction::Created, product))
}

/// Syncs each draft in order. A failure is recorded and the run continues.
pub async fn sync_many(
    client: &ShopifyAdminClient,
    drafts: Vec<(String, ProductDraft)>,
    mode: SyncMode,
) -> Vec<SyncResult> {
    let mut results = Vec::with_capacity(drafts.len());
    for (id, draft) in drafts {
        let outcome = sync_product(client, &draft, mode).await;
        if let Err(e) = &outcome {
            tracing::warn!(product_id = %id, error = %e, "product sync failed");
        }
        results.push(SyncResult { id, outcome });
    }
    results
}
