//! Multi-page product fetch for [`ShopifyAdminClient`].

use crate::error::ShopifyError;
use crate::types::ShopifyProduct;

use super::{ProductListParams, ShopifyAdminClient};

impl ShopifyAdminClient {
    /// Follows `rel="next"` cursors from the first page until none is left.
    ///
    /// Pages are fetched one after another. A failure on any page discards
    /// what was collected so far, so callers never merge a partial catalogue.
    ///
    /// # Errors
    ///
    /// Propagates any [`Self::list_products`] error and returns
    /// [`ShopifyError::PaginationLimit`] once more than `max_pages` pages
    /// would be needed.
    pub async fn fetch_all_products(
        &self,
        limit: u32,
        max_pages: usize,
    ) -> Result<Vec<ShopifyProduct>, ShopifyError> {
        let mut all_products: Vec<ShopifyProduct> = Vec::new();
        let mut cursor: Option<String> = None;
        let mut page_count = 0usize;

        loop {
            page_count += 1;
            if page_count > max_pages {
                return Err(ShopifyError::PaginationLimit {
                    shop: self.shop_domain.clone(),
                    max_pages,
                });
            }

            let page = self
                .list_products(&ProductListParams {
                    limit: Some(limit),
                    page_info: cursor.take(),
                    ..ProductListParams::default()
                })
                .await?;

            all_products.extend(page.products);

            cursor = page.next_page_info;
            if cursor.is_none() {
                break;
            }
        }

        tracing::info!(
            shop = %self.shop_domain,
            pages = page_count,
            products = all_products.len(),
            "fetched all products"
        );
        Ok(all_products)
    }
}
