use chrono::Utc;
use optisell_core::{ImportedProduct, LocalProduct, ProductDraft};
use serde::Serialize;

use crate::{JsonStore, StoreError, PRODUCTS_FILE};

/// Result of merging a Shopify import into the local catalogue.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub created: usize,
    pub updated: usize,
    pub total: usize,
}

/// Finds the local record for `imported`. Any record can match by
/// `shopifyId`; the SKU fallback only considers the first `existing`
/// records that this import has not already matched.
fn find_match(
    products: &[LocalProduct],
    existing: usize,
    claimed: &[bool],
    imported: &ImportedProduct,
) -> Option<usize> {
    products
        .iter()
        .position(|p| p.shopify_id.as_deref() == Some(imported.shopify_id.as_str()))
        .or_else(|| {
            let sku = imported.sku.trim();
            if sku.is_empty() {
                return None;
            }
            products[..existing]
                .iter()
                .zip(claimed)
                .position(|(p, claimed)| !claimed && p.sku == sku)
        })
}

impl JsonStore {
    /// Lists products, optionally narrowed by a case-insensitive search over
    /// name, sku, ean and asin.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the collection cannot be read.
    pub async fn list_products(&self, query: Option<&str>) -> Result<Vec<LocalProduct>, StoreError> {
        let _guard = self.lock.lock().await;
        let mut all: Vec<LocalProduct> = self.read_collection(PRODUCTS_FILE).await?;
        if let Some(q) = query {
            all.retain(|p| p.matches_query(q));
        }
        Ok(all)
    }

    /// # Errors
    ///
    /// Returns [`StoreError`] if the collection cannot be read.
    pub async fn get_product(&self, id: &str) -> Result<Option<LocalProduct>, StoreError> {
        let _guard = self.lock.lock().await;
        let all: Vec<LocalProduct> = self.read_collection(PRODUCTS_FILE).await?;
        Ok(all.into_iter().find(|p| p.id == id))
    }

    /// # Errors
    ///
    /// Returns [`StoreError`] if the collection cannot be read or written.
    pub async fn insert_product(&self, draft: ProductDraft) -> Result<LocalProduct, StoreError> {
        let _guard = self.lock.lock().await;
        let mut all: Vec<LocalProduct> = self.read_collection(PRODUCTS_FILE).await?;
        let product = LocalProduct::from_draft(draft, Utc::now());
        all.push(product.clone());
        self.write_collection(PRODUCTS_FILE, &all).await?;
        tracing::info!(product_id = %product.id, sku = %product.sku, "product created");
        Ok(product)
    }

    /// # Errors
    ///
    /// Returns [`StoreError`] if the collection cannot be read or written.
    pub async fn update_product(
        &self,
        id: &str,
        draft: ProductDraft,
    ) -> Result<Option<LocalProduct>, StoreError> {
        let _guard = self.lock.lock().await;
        let mut all: Vec<LocalProduct> = self.read_collection(PRODUCTS_FILE).await?;
        let Some(existing) = all.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        existing.apply_draft(draft, Utc::now());
        let updated = existing.clone();
        self.write_collection(PRODUCTS_FILE, &all).await?;
        Ok(Some(updated))
    }

    /// # Errors
    ///
    /// Returns [`StoreError`] if the collection cannot be read or written.
    pub async fn delete_product(&self, id: &str) -> Result<bool, StoreError> {
        let _guard = self.lock.lock().await;
        let mut all: Vec<LocalProduct> = self.read_collection(PRODUCTS_FILE).await?;
        let before = all.len();
        all.retain(|p| p.id != id);
        if all.len() == before {
            return Ok(false);
        }
        self.write_collection(PRODUCTS_FILE, &all).await?;
        tracing::info!(product_id = %id, "product deleted");
        Ok(true)
    }

    /// Stores a copy of product `id` without its Shopify link.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the collection cannot be read or written.
    pub async fn duplicate_product(&self, id: &str) -> Result<Option<LocalProduct>, StoreError> {
        let _guard = self.lock.lock().await;
        let mut all: Vec<LocalProduct> = self.read_collection(PRODUCTS_FILE).await?;
        let Some(source) = all.iter().find(|p| p.id == id) else {
            return Ok(None);
        };
        let copy = source.duplicate(Utc::now());
        all.push(copy.clone());
        self.write_collection(PRODUCTS_FILE, &all).await?;
        Ok(Some(copy))
    }

    /// Records the Shopify ids a product was pushed to.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the collection cannot be read or written.
    pub async fn record_shopify_link(
        &self,
        id: &str,
        shopify_product_id: String,
        shopify_variant_id: Option<String>,
    ) -> Result<Option<LocalProduct>, StoreError> {
        let _guard = self.lock.lock().await;
        let mut all: Vec<LocalProduct> = self.read_collection(PRODUCTS_FILE).await?;
        let Some(existing) = all.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        existing.link_shopify(shopify_product_id, shopify_variant_id, Utc::now());
        let updated = existing.clone();
        self.write_collection(PRODUCTS_FILE, &all).await?;
        Ok(Some(updated))
    }

    /// Merges imported products: match by `shopifyId`, then by non-empty
    /// `sku`; unmatched products are inserted. Remote products sharing a
    /// SKU never collapse into one local record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the collection cannot be read or written.
    pub async fn merge_imported(
        &self,
        imported: Vec<ImportedProduct>,
    ) -> Result<ImportSummary, StoreError> {
        let _guard = self.lock.lock().await;
        let mut all: Vec<LocalProduct> = self.read_collection(PRODUCTS_FILE).await?;
        let now = Utc::now();
        let mut summary = ImportSummary {
            total: imported.len(),
            ..ImportSummary::default()
        };

        let existing = all.len();
        let mut claimed = vec![false; existing];
        for product in imported {
            if let Some(index) = find_match(&all, existing, &claimed, &product) {
                if index < existing {
                    claimed[index] = true;
                }
                all[index].overlay_imported(product, now);
                summary.updated += 1;
            } else {
                all.push(LocalProduct::from_imported(product, now));
                summary.created += 1;
            }
        }

        self.write_collection(PRODUCTS_FILE, &all).await?;
        tracing::info!(
            created = summary.created,
            updated = summary.updated,
            "import merged"
        );
        Ok(summary)
    }
}
