//! Local product records and the loose input shape the UI submits.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Name added to `integrations` once a product is linked to a Shopify store.
pub const SHOPIFY_INTEGRATION: &str = "Shopify";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawImage")]
pub struct ProductImage {
    pub url: String,
    pub alt: Option<String>,
}

// The UI has sent images as `url`, `preview` (local upload) or `src`
// (Shopify shape) across versions.
#[derive(Deserialize)]
struct RawImage {
    url: Option<String>,
    preview: Option<String>,
    src: Option<String>,
    alt: Option<String>,
}

impl From<RawImage> for ProductImage {
    fn from(raw: RawImage) -> Self {
        let url = [raw.url, raw.preview, raw.src]
            .into_iter()
            .flatten()
            .find(|u| !u.trim().is_empty())
            .unwrap_or_default();
        Self { url, alt: raw.alt }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalProduct {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub sku: String,
    #[serde(default)]
    pub ean: String,
    #[serde(default)]
    pub asin: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub tags: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub compare_price: String,
    #[serde(default)]
    pub cost: String,
    #[serde(default)]
    pub stock: i64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub short_description: String,
    #[serde(default)]
    pub images: Vec<ProductImage>,
    #[serde(default)]
    pub weight: String,
    #[serde(default)]
    pub length: String,
    #[serde(default)]
    pub width: String,
    #[serde(default)]
    pub height: String,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub shopify_id: Option<String>,
    #[serde(default)]
    pub shopify_variant_id: Option<String>,
    #[serde(default)]
    pub integrations: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_active() -> bool {
    true
}

/// Product fields as submitted by the UI or CLI.
///
/// Every field is optional so the same shape serves create, partial update
/// and push-to-Shopify. Ids and stock accept either JSON numbers or strings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDraft {
    pub name: Option<String>,
    pub sku: Option<String>,
    pub ean: Option<String>,
    pub asin: Option<String>,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub tags: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub price: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub compare_price: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub cost: Option<String>,
    #[serde(default, deserialize_with = "loose_integer")]
    pub stock: Option<i64>,
    pub description: Option<String>,
    pub short_description: Option<String>,
    pub images: Option<Vec<ProductImage>>,
    #[serde(default, deserialize_with = "loose_string")]
    pub weight: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub length: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub width: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub height: Option<String>,
    pub active: Option<bool>,
    #[serde(
        default,
        alias = "shopifyProductId",
        deserialize_with = "loose_string"
    )]
    pub shopify_id: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub shopify_variant_id: Option<String>,
}

/// A Shopify product reduced to local fields, ready to merge into the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportedProduct {
    pub shopify_id: String,
    pub shopify_variant_id: Option<String>,
    pub name: String,
    pub description: String,
    pub short_description: String,
    pub sku: String,
    pub ean: String,
    pub price: String,
    pub compare_price: Option<String>,
    pub stock: i64,
    pub brand: String,
    pub category: String,
    pub tags: String,
    pub weight: String,
    pub active: bool,
    pub image: Option<String>,
    pub images: Vec<ProductImage>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Loose {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

fn loose_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Loose>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        Loose::Text(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Loose::Int(n) => Some(n.to_string()),
        Loose::Float(f) => Some(f.to_string()),
        Loose::Bool(_) => None,
    }))
}

fn loose_integer<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Loose>::deserialize(deserializer)?;
    match value {
        None | Some(Loose::Bool(_)) => Ok(None),
        Some(Loose::Int(n)) => Ok(Some(n)),
        #[allow(clippy::cast_possible_truncation)]
        Some(Loose::Float(f)) => Ok(Some(f.trunc() as i64)),
        Some(Loose::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(Loose::Text(s)) => s
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("invalid stock value \"{s}\""))),
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

impl LocalProduct {
    #[must_use]
    pub fn from_draft(draft: ProductDraft, now: DateTime<Utc>) -> Self {
        let mut product = Self {
            id: Uuid::new_v4().to_string(),
            name: String::new(),
            sku: String::new(),
            ean: String::new(),
            asin: String::new(),
            category: String::new(),
            brand: String::new(),
            tags: String::new(),
            price: String::new(),
            compare_price: String::new(),
            cost: String::new(),
            stock: 0,
            description: String::new(),
            short_description: String::new(),
            images: Vec::new(),
            weight: String::new(),
            length: String::new(),
            width: String::new(),
            height: String::new(),
            active: true,
            shopify_id: None,
            shopify_variant_id: None,
            integrations: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        product.apply_draft(draft, now);
        product
    }

    /// Overlays every field present in `draft` and bumps `updated_at`.
    pub fn apply_draft(&mut self, draft: ProductDraft, now: DateTime<Utc>) {
        let text_fields = [
            (draft.name, &mut self.name),
            (draft.sku, &mut self.sku),
            (draft.ean, &mut self.ean),
            (draft.asin, &mut self.asin),
            (draft.category, &mut self.category),
            (draft.brand, &mut self.brand),
            (draft.tags, &mut self.tags),
            (draft.price, &mut self.price),
            (draft.compare_price, &mut self.compare_price),
            (draft.cost, &mut self.cost),
            (draft.description, &mut self.description),
            (draft.short_description, &mut self.short_description),
            (draft.weight, &mut self.weight),
            (draft.length, &mut self.length),
            (draft.width, &mut self.width),
            (draft.height, &mut self.height),
        ];
        for (value, slot) in text_fields {
            if let Some(value) = value {
                *slot = value.trim().to_string();
            }
        }

        if let Some(stock) = draft.stock {
            self.stock = stock;
        }
        if let Some(images) = draft.images {
            self.images = images.into_iter().filter(|i| !i.url.is_empty()).collect();
        }
        if let Some(active) = draft.active {
            self.active = active;
        }
        if let Some(id) = draft.shopify_id {
            self.shopify_id = Some(id);
        }
        if let Some(id) = draft.shopify_variant_id {
            self.shopify_variant_id = Some(id);
        }
        self.updated_at = now;
    }

    /// Copy with a fresh id, ` (Copy)` / `-COPY` markers and no Shopify link.
    #[must_use]
    pub fn duplicate(&self, now: DateTime<Utc>) -> Self {
        let mut copy = self.clone();
        copy.id = Uuid::new_v4().to_string();
        copy.name = format!("{} (Copy)", self.name);
        if !self.sku.is_empty() {
            copy.sku = format!("{}-COPY", self.sku);
        }
        copy.shopify_id = None;
        copy.shopify_variant_id = None;
        copy.integrations.retain(|i| i != SHOPIFY_INTEGRATION);
        copy.created_at = now;
        copy.updated_at = now;
        copy
    }

    pub fn link_shopify(
        &mut self,
        product_id: String,
        variant_id: Option<String>,
        now: DateTime<Utc>,
    ) {
        self.shopify_id = Some(product_id);
        if variant_id.is_some() {
            self.shopify_variant_id = variant_id;
        }
        if !self.integrations.iter().any(|i| i == SHOPIFY_INTEGRATION) {
            self.integrations.push(SHOPIFY_INTEGRATION.to_string());
        }
        self.updated_at = now;
    }

    #[must_use]
    pub fn from_imported(imported: ImportedProduct, now: DateTime<Utc>) -> Self {
        let mut product = Self::from_draft(ProductDraft::default(), now);
        product.overlay_imported(imported, now);
        product
    }

    /// Overlays the non-empty imported fields and refreshes the Shopify link.
    pub fn overlay_imported(&mut self, imported: ImportedProduct, now: DateTime<Utc>) {
        let text_fields = [
            (imported.name, &mut self.name),
            (imported.description, &mut self.description),
            (imported.short_description, &mut self.short_description),
            (imported.sku, &mut self.sku),
            (imported.ean, &mut self.ean),
            (imported.price, &mut self.price),
            (imported.brand, &mut self.brand),
            (imported.category, &mut self.category),
            (imported.tags, &mut self.tags),
            (imported.weight, &mut self.weight),
        ];
        for (value, slot) in text_fields {
            if let Some(value) = non_empty(&value) {
                *slot = value;
            }
        }
        if let Some(compare) = imported.compare_price.as_deref().and_then(non_empty) {
            self.compare_price = compare;
        }
        if !imported.images.is_empty() {
            self.images = imported.images;
        }
        self.stock = imported.stock;
        self.active = imported.active;
        self.link_shopify(imported.shopify_id, imported.shopify_variant_id, now);
    }

    /// The stored record as a push payload.
    #[must_use]
    pub fn to_draft(&self) -> ProductDraft {
        ProductDraft {
            name: non_empty(&self.name),
            sku: non_empty(&self.sku),
            ean: non_empty(&self.ean),
            asin: non_empty(&self.asin),
            category: non_empty(&self.category),
            brand: non_empty(&self.brand),
            tags: non_empty(&self.tags),
            price: non_empty(&self.price),
            compare_price: non_empty(&self.compare_price),
            cost: non_empty(&self.cost),
            stock: Some(self.stock),
            description: non_empty(&self.description),
            short_description: non_empty(&self.short_description),
            images: Some(self.images.clone()),
            weight: non_empty(&self.weight),
            length: non_empty(&self.length),
            width: non_empty(&self.width),
            height: non_empty(&self.height),
            active: Some(self.active),
            shopify_id: self.shopify_id.clone(),
            shopify_variant_id: self.shopify_variant_id.clone(),
        }
    }

    /// Case-insensitive match over name, sku, ean and asin.
    #[must_use]
    pub fn matches_query(&self, query: &str) -> bool {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        [&self.name, &self.sku, &self.ean, &self.asin]
            .iter()
            .any(|field| field.to_lowercase().contains(&needle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(json: serde_json::Value) -> ProductDraft {
        serde_json::from_value(json).expect("draft should deserialize")
    }

    #[test]
    fn image_accepts_preview_and_src() {
        let d = draft(serde_json::json!({
            "images": [
                {"preview": "blob:local-1"},
                {"src": "https://cdn.shopify.com/a.jpg", "alt": "A"},
                {"url": "", "preview": "blob:local-2"}
            ]
        }));
        let images = d.images.unwrap();
        assert_eq!(images[0].url, "blob:local-1");
        assert_eq!(images[1].url, "https://cdn.shopify.com/a.jpg");
        assert_eq!(images[1].alt.as_deref(), Some("A"));
        assert_eq!(images[2].url, "blob:local-2");
    }

    #[test]
    fn numeric_and_string_fields_are_accepted() {
        let d = draft(serde_json::json!({
            "price": 49.9,
            "stock": "12",
            "shopifyProductId": 8_123_456_789_u64,
            "weight": ""
        }));
        assert_eq!(d.price.as_deref(), Some("49.9"));
        assert_eq!(d.stock, Some(12));
        assert_eq!(d.shopify_id.as_deref(), Some("8123456789"));
        assert!(d.weight.is_none());
    }

    #[test]
    fn non_numeric_stock_is_rejected() {
        let result: Result<ProductDraft, _> =
            serde_json::from_value(serde_json::json!({"stock": "many"}));
        assert!(result.is_err());
    }

    #[test]
    fn from_draft_defaults_active_to_true() {
        let product = LocalProduct::from_draft(
            draft(serde_json::json!({"name": "Mug", "sku": "MUG-1"})),
            Utc::now(),
        );
        assert!(product.active);
        assert_eq!(product.name, "Mug");
        assert!(product.shopify_id.is_none());
    }

    #[test]
    fn apply_draft_only_touches_present_fields() {
        let mut product = LocalProduct::from_draft(
            draft(serde_json::json!({"name": "Mug", "sku": "MUG-1", "price": "10"})),
            Utc::now(),
        );
        product.apply_draft(draft(serde_json::json!({"price": "12.50"})), Utc::now());
        assert_eq!(product.name, "Mug");
        assert_eq!(product.price, "12.50");
    }

    #[test]
    fn duplicate_marks_copy_and_clears_link() {
        let now = Utc::now();
        let mut product =
            LocalProduct::from_draft(draft(serde_json::json!({"name": "Mug", "sku": "MUG-1"})), now);
        product.link_shopify("111".to_string(), Some("222".to_string()), now);

        let copy = product.duplicate(now);
        assert_ne!(copy.id, product.id);
        assert_eq!(copy.name, "Mug (Copy)");
        assert_eq!(copy.sku, "MUG-1-COPY");
        assert!(copy.shopify_id.is_none());
        assert!(copy.shopify_variant_id.is_none());
        assert!(copy.integrations.is_empty());
    }

    #[test]
    fn link_shopify_adds_integration_once() {
        let now = Utc::now();
        let mut product = LocalProduct::from_draft(ProductDraft::default(), now);
        product.link_shopify("1".to_string(), None, now);
        product.link_shopify("1".to_string(), Some("9".to_string()), now);
        assert_eq!(product.integrations, vec!["Shopify".to_string()]);
        assert_eq!(product.shopify_variant_id.as_deref(), Some("9"));
    }

    #[test]
    fn overlay_keeps_local_values_for_empty_imported_fields() {
        let now = Utc::now();
        let mut product = LocalProduct::from_draft(
            draft(serde_json::json!({"name": "Mug", "sku": "MUG-1", "asin": "B00X", "brand": "Acme"})),
            now,
        );
        product.overlay_imported(
            ImportedProduct {
                shopify_id: "77".to_string(),
                shopify_variant_id: Some("78".to_string()),
                name: "Mug v2".to_string(),
                description: String::new(),
                short_description: String::new(),
                sku: "MUG-1".to_string(),
                ean: String::new(),
                price: "15.00".to_string(),
                compare_price: None,
                stock: 4,
                brand: String::new(),
                category: String::new(),
                tags: String::new(),
                weight: String::new(),
                active: false,
                image: None,
                images: Vec::new(),
            },
            now,
        );
        assert_eq!(product.name, "Mug v2");
        assert_eq!(product.brand, "Acme");
        assert_eq!(product.asin, "B00X");
        assert_eq!(product.stock, 4);
        assert!(!product.active);
        assert_eq!(product.shopify_id.as_deref(), Some("77"));
    }

    #[test]
    fn query_matches_sku_case_insensitively() {
        let product = LocalProduct::from_draft(
            draft(serde_json::json!({"name": "Mug", "sku": "MUG-1"})),
            Utc::now(),
        );
        assert!(product.matches_query("mug-1"));
        assert!(product.matches_query(""));
        assert!(!product.matches_query("plate"));
    }

    #[test]
    fn to_draft_round_trips_link() {
        let now = Utc::now();
        let mut product = LocalProduct::from_draft(
            draft(serde_json::json!({"name": "Mug", "sku": "MUG-1"})),
            now,
        );
        product.link_shopify("5".to_string(), Some("6".to_string()), now);
        let d = product.to_draft();
        assert_eq!(d.shopify_id.as_deref(), Some("5"));
        assert_eq!(d.shopify_variant_id.as_deref(), Some("6"));
        assert!(d.ean.is_none());
    }
}
