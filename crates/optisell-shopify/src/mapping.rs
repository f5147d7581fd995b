//! Translation between local products and Shopify product JSON.

use optisell_core::{ImportedProduct, ProductDraft, ProductImage};

use crate::error::ShopifyError;
use crate::types::{ImageInput, MetafieldInput, ProductInput, ShopifyProduct, VariantInput};

pub const DEFAULT_TITLE: &str = "Untitled product";
pub const DEFAULT_VENDOR: &str = "OptiSell Integrator";
pub const DEFAULT_PRICE: &str = "0.00";
pub const METAFIELD_NAMESPACE: &str = "custom";

const SHORT_DESCRIPTION_CHARS: usize = 200;

fn present(value: Option<&String>) -> Option<&str> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty())
}

fn parse_weight(raw: Option<&String>) -> Option<f64> {
    present(raw)
        .and_then(|w| w.replace(',', ".").parse::<f64>().ok())
        .filter(|w| w.is_finite() && *w >= 0.0)
}

/// Parses a Shopify numeric id carried as a string.
///
/// # Errors
///
/// Returns [`ShopifyError::InvalidId`] for anything that is not a `u64`.
pub fn parse_shopify_id(raw: &str) -> Result<u64, ShopifyError> {
    raw.trim()
        .parse::<u64>()
        .map_err(|_| ShopifyError::InvalidId(raw.to_string()))
}

fn normalize_tags(raw: &str) -> Option<String> {
    let tags = raw
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(",");
    (!tags.is_empty()).then_some(tags)
}

/// Shopify expects `.` as the decimal separator; the UI also accepts `,`.
fn decimal(raw: Option<&String>) -> Option<String> {
    present(raw).map(|v| v.replace(',', "."))
}

fn status_for(active: bool) -> String {
    if active {
        "active".to_string()
    } else {
        "draft".to_string()
    }
}

fn description_for(draft: &ProductDraft) -> Option<&str> {
    present(draft.description.as_ref()).or_else(|| present(draft.short_description.as_ref()))
}

fn images_for(draft: &ProductDraft, title: &str) -> Option<Vec<ImageInput>> {
    let images: Vec<ImageInput> = draft
        .images
        .iter()
        .flatten()
        .filter(|img| !img.url.trim().is_empty())
        .zip(1u32..)
        .map(|(img, position)| ImageInput {
            src: img.url.trim().to_string(),
            alt: title.to_string(),
            position,
        })
        .collect();
    (!images.is_empty()).then_some(images)
}

fn metafields_for(draft: &ProductDraft) -> Option<Vec<MetafieldInput>> {
    let fields: Vec<MetafieldInput> = [("ean", draft.ean.as_ref()), ("asin", draft.asin.as_ref())]
        .into_iter()
        .filter_map(|(key, value)| {
            present(value).map(|v| MetafieldInput {
                namespace: METAFIELD_NAMESPACE.to_string(),
                key: key.to_string(),
                value: v.to_string(),
                kind: "single_line_text_field".to_string(),
            })
        })
        .collect();
    (!fields.is_empty()).then_some(fields)
}

/// Variant fields present in `draft`, nothing defaulted.
fn variant_fields(draft: &ProductDraft) -> VariantInput {
    let weight = parse_weight(draft.weight.as_ref());
    VariantInput {
        id: None,
        price: decimal(draft.price.as_ref()),
        sku: present(draft.sku.as_ref()).map(ToOwned::to_owned),
        inventory_management: None,
        inventory_policy: None,
        inventory_quantity: draft.stock,
        compare_at_price: decimal(draft.compare_price.as_ref()),
        weight,
        weight_unit: weight.map(|_| "kg".to_string()),
    }
}

/// Whether an update would change anything on the variant.
#[must_use]
pub fn has_variant_changes(draft: &ProductDraft) -> bool {
    variant_fields(draft) != VariantInput::default()
}

/// Payload for `POST /products.json`: one tracked variant, images with a
/// source URL, and `custom` metafields for EAN / ASIN. Missing fields get
/// Shopify-acceptable defaults.
#[must_use]
pub fn create_payload(draft: &ProductDraft) -> ProductInput {
    let title = present(draft.name.as_ref()).unwrap_or(DEFAULT_TITLE).to_string();
    let fields = variant_fields(draft);
    ProductInput {
        id: None,
        body_html: Some(description_for(draft).unwrap_or_default().to_string()),
        vendor: Some(
            present(draft.brand.as_ref())
                .unwrap_or(DEFAULT_VENDOR)
                .to_string(),
        ),
        status: Some(status_for(draft.active != Some(false))),
        product_type: present(draft.category.as_ref()).map(ToOwned::to_owned),
        tags: present(draft.tags.as_ref()).and_then(normalize_tags),
        variants: Some(vec![VariantInput {
            price: Some(fields.price.clone().unwrap_or_else(|| DEFAULT_PRICE.to_string())),
            sku: Some(fields.sku.clone().unwrap_or_default()),
            inventory_quantity: Some(fields.inventory_quantity.unwrap_or(0)),
            inventory_management: Some("shopify".to_string()),
            inventory_policy: Some("deny".to_string()),
            ..fields
        }]),
        images: images_for(draft, &title),
        metafields: metafields_for(draft),
        title: Some(title),
    }
}

/// Payload for `PUT /products/{id}.json` carrying only the fields present
/// in `draft`, so a partial update leaves the rest of the product alone.
///
/// The variant is only sent when its id is known and something on it
/// changes; images and metafields are never resent.
///
/// # Errors
///
/// Returns [`ShopifyError::InvalidId`] if `shopifyVariantId` is not numeric.
pub fn update_payload(shopify_id: u64, draft: &ProductDraft) -> Result<ProductInput, ShopifyError> {
    let mut input = ProductInput {
        id: Some(shopify_id),
        title: present(draft.name.as_ref()).map(ToOwned::to_owned),
        body_html: description_for(draft).map(ToOwned::to_owned),
        vendor: present(draft.brand.as_ref()).map(ToOwned::to_owned),
        status: draft.active.map(status_for),
        product_type: present(draft.category.as_ref()).map(ToOwned::to_owned),
        tags: present(draft.tags.as_ref()).and_then(normalize_tags),
        ..ProductInput::default()
    };

    if let Some(variant_id) = present(draft.shopify_variant_id.as_ref()) {
        let id = parse_shopify_id(variant_id)?;
        if has_variant_changes(draft) {
            input.variants = Some(vec![VariantInput {
                id: Some(id),
                ..variant_fields(draft)
            }]);
        }
    }
    Ok(input)
}

/// Reduces a Shopify product to local fields. The first variant and the
/// first image stand for the whole product.
#[must_use]
pub fn import_product(product: &ShopifyProduct) -> ImportedProduct {
    let variant = product.variants.first();
    let body_html = product.body_html.clone().unwrap_or_default();
    let text = |v: Option<&String>| v.cloned().unwrap_or_default();

    ImportedProduct {
        shopify_id: product.id.to_string(),
        shopify_variant_id: variant.map(|v| v.id.to_string()),
        name: product.title.clone(),
        short_description: body_html.chars().take(SHORT_DESCRIPTION_CHARS).collect(),
        description: body_html,
        sku: text(variant.and_then(|v| v.sku.as_ref())),
        ean: text(variant.and_then(|v| v.barcode.as_ref())),
        price: present(variant.and_then(|v| v.price.as_ref()))
            .unwrap_or(DEFAULT_PRICE)
            .to_string(),
        compare_price: present(variant.and_then(|v| v.compare_at_price.as_ref()))
            .map(ToOwned::to_owned),
        stock: variant.and_then(|v| v.inventory_quantity).unwrap_or(0),
        brand: text(product.vendor.as_ref()),
        category: text(product.product_type.as_ref()),
        tags: text(product.tags.as_ref()),
        weight: variant
            .and_then(|v| v.weight)
            .filter(|w| *w > 0.0)
            .map(|w| w.to_string())
            .unwrap_or_default(),
        active: product.status.as_deref() == Some("active"),
        image: product
            .images
            .first()
            .map(|img| img.src.clone())
            .filter(|src| !src.is_empty()),
        images: product
            .images
            .iter()
            .filter(|img| !img.src.is_empty())
            .map(|img| ProductImage {
                url: img.src.clone(),
                alt: img.alt.clone(),
            })
            .collect(),
    }
}

#[cfg(test)]
#[path = "mapping_test.rs"]
mod tests;
