//! Product endpoints.

use serde::Deserialize;

use crate::error::ShopifyError;
use crate::pagination::{extract_next_cursor, extract_previous_cursor};
use crate::types::{
    ProductBody, ProductEnvelope, ProductInput, ProductsEnvelope, ShopifyProduct, ShopifyVariant,
};

use super::{parse, ShopifyAdminClient};

pub const DEFAULT_PAGE_LIMIT: u32 = 50;
pub const MAX_PAGE_LIMIT: u32 = 250;

/// Query for `GET /products.json`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductListParams {
    pub limit: Option<u32>,
    pub page_info: Option<String>,
    /// Comma-separated product ids.
    pub ids: Option<String>,
    pub status: Option<String>,
}

impl ProductListParams {
    #[must_use]
    pub fn effective_limit(&self) -> u32 {
        self.limit
            .unwrap_or(DEFAULT_PAGE_LIMIT)
            .clamp(1, MAX_PAGE_LIMIT)
    }

    // Shopify rejects filters alongside `page_info`; the cursor already
    // encodes them.
    fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = vec![("limit", self.effective_limit().to_string())];
        if let Some(cursor) = self.page_info.as_deref().filter(|c| !c.is_empty()) {
            query.push(("page_info", cursor.to_string()));
            return query;
        }
        if let Some(ids) = self.ids.as_deref().filter(|v| !v.trim().is_empty()) {
            query.push(("ids", ids.trim().to_string()));
        }
        if let Some(status) = self.status.as_deref().filter(|v| !v.trim().is_empty()) {
            query.push(("status", status.trim().to_string()));
        }
        query
    }
}

#[derive(Debug, Clone)]
pub struct ProductPage {
    pub products: Vec<ShopifyProduct>,
    pub next_page_info: Option<String>,
    pub previous_page_info: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SkuMatch {
    pub product: ShopifyProduct,
    pub variant: ShopifyVariant,
}

fn product_path(id: u64) -> String {
    format!("/products/{id}.json")
}

fn missing_product(context: &str) -> ShopifyError {
    ShopifyError::UnexpectedResponse {
        context: context.to_string(),
        key: "product",
    }
}

impl ShopifyAdminClient {
    /// Fetches one page of `GET /products.json`.
    ///
    /// # Errors
    ///
    /// - [`ShopifyError::Api`] on any non-2xx response.
    /// - [`ShopifyError::UnexpectedResponse`] if the body has no `products`.
    /// - [`ShopifyError::Http`] / [`ShopifyError::Deserialize`] on transport or JSON failure.
    pub async fn list_products(
        &self,
        params: &ProductListParams,
    ) -> Result<ProductPage, ShopifyError> {
        let url = self.url("/products.json", &params.to_query())?;
        let raw = self
            .execute(self.client.get(url), "GET", "/products.json")
            .await?;
        let envelope: ProductsEnvelope = parse(&raw.body, "GET /products.json")?;
        let products = envelope
            .products
            .ok_or(ShopifyError::UnexpectedResponse {
                context: "GET /products.json".to_string(),
                key: "products",
            })?;

        Ok(ProductPage {
            products,
            next_page_info: extract_next_cursor(raw.link.as_deref()),
            previous_page_info: extract_previous_cursor(raw.link.as_deref()),
        })
    }

    /// # Errors
    ///
    /// [`ShopifyError::Api`] with status 404 when the product does not exist,
    /// plus the transport errors of [`Self::list_products`].
    pub async fn get_product(&self, id: u64) -> Result<ShopifyProduct, ShopifyError> {
        let path = product_path(id);
        let url = self.url(&path, &[])?;
        let raw = self.execute(self.client.get(url), "GET", &path).await?;
        let context = format!("GET {path}");
        let envelope: ProductEnvelope = parse(&raw.body, &context)?;
        envelope.product.ok_or_else(|| missing_product(&context))
    }

    /// `POST /products.json` with `{"product": input}`.
    ///
    /// # Errors
    ///
    /// [`ShopifyError::Api`] (422 for invalid data such as a duplicate SKU),
    /// plus the transport errors of [`Self::list_products`].
    pub async fn create_product(
        &self,
        input: &ProductInput,
    ) -> Result<ShopifyProduct, ShopifyError> {
        let url = self.url("/products.json", &[])?;
        let request = self.client.post(url).json(&ProductBody { product: input });
        let raw = self.execute(request, "POST", "/products.json").await?;
        let envelope: ProductEnvelope = parse(&raw.body, "POST /products.json")?;
        let product = envelope
            .product
            .ok_or_else(|| missing_product("POST /products.json"))?;
        tracing::info!(shop = %self.shop_domain, product_id = product.id, "product created");
        Ok(product)
    }

    /// `PUT /products/{id}.json` with `{"product": input}`.
    ///
    /// # Errors
    ///
    /// Same as [`Self::create_product`]; 404 when the product is gone.
    pub async fn update_product(
        &self,
        id: u64,
        input: &ProductInput,
    ) -> Result<ShopifyProduct, ShopifyError> {
        let path = product_path(id);
        let url = self.url(&path, &[])?;
        let request = self.client.put(url).json(&ProductBody { product: input });
        let raw = self.execute(request, "PUT", &path).await?;
        let context = format!("PUT {path}");
        let envelope: ProductEnvelope = parse(&raw.body, &context)?;
        let product = envelope.product.ok_or_else(|| missing_product(&context))?;
        tracing::info!(shop = %self.shop_domain, product_id = product.id, "product updated");
        Ok(product)
    }

    /// # Errors
    ///
    /// [`ShopifyError::Api`] with status 404 when the product does not exist.
    pub async fn delete_product(&self, id: u64) -> Result<(), ShopifyError> {
        let path = product_path(id);
        let url = self.url(&path, &[])?;
        self.execute(self.client.delete(url), "DELETE", &path)
            .await?;
        tracing::info!(shop = %self.shop_domain, product_id = id, "product deleted");
        Ok(())
    }

    /// Scans the first page of 250 products for a variant whose SKU matches
    /// exactly.
    ///
    /// # Errors
    ///
    /// Propagates [`Self::list_products`] failures.
    pub async fn find_product_by_sku(&self, sku: &str) -> Result<Option<SkuMatch>, ShopifyError> {
        let sku = sku.trim();
        if sku.is_empty() {
            return Ok(None);
        }

        let page = self
            .list_products(&ProductListParams {
                limit: Some(MAX_PAGE_LIMIT),
                ..ProductListParams::default()
            })
            .await?;

        let found = page.products.into_iter().find_map(|product| {
            let variant = product
                .variants
                .iter()
                .find(|v| v.sku.as_deref() == Some(sku))
                .cloned()?;
            Some(SkuMatch { product, variant })
        });
        tracing::debug!(shop = %self.shop_domain, sku, found = found.is_some(), "sku lookup");
        Ok(found)
    }
}
