use serde_json::json;

use super::*;

fn draft(value: serde_json::Value) -> ProductDraft {
    serde_json::from_value(value).expect("draft should deserialize")
}

fn shopify_product(value: serde_json::Value) -> ShopifyProduct {
    serde_json::from_value(value).expect("product should deserialize")
}

#[test]
fn create_payload_applies_defaults() {
    let input = create_payload(&ProductDraft::default());
    assert_eq!(input.title.as_deref(), Some(DEFAULT_TITLE));
    assert_eq!(input.vendor.as_deref(), Some(DEFAULT_VENDOR));
    assert_eq!(input.status.as_deref(), Some("active"));
    assert_eq!(input.body_html.as_deref(), Some(""));
    assert!(input.images.is_none());
    assert!(input.metafields.is_none());

    let variants = input.variants.expect("create always sends one variant");
    assert_eq!(variants.len(), 1);
    assert_eq!(variants[0].price.as_deref(), Some(DEFAULT_PRICE));
    assert_eq!(variants[0].inventory_quantity, Some(0));
    assert_eq!(variants[0].inventory_management.as_deref(), Some("shopify"));
    assert_eq!(variants[0].inventory_policy.as_deref(), Some("deny"));
}

#[test]
fn create_payload_maps_full_product() {
    let input = create_payload(&draft(json!({
        "name": "Ceramic mug",
        "sku": "MUG-1",
        "ean": "5941234567890",
        "asin": "B00TEST",
        "brand": "Acme",
        "category": "Kitchen",
        "tags": " mugs , ceramic,, gifts ",
        "price": "49.90",
        "comparePrice": "59.90",
        "stock": 12,
        "weight": "0,35",
        "shortDescription": "Short",
        "active": false,
        "images": [
            {"url": "https://cdn.example.com/a.jpg"},
            {"preview": ""},
            {"src": "https://cdn.example.com/b.jpg"}
        ]
    })));

    assert_eq!(input.title.as_deref(), Some("Ceramic mug"));
    assert_eq!(input.body_html.as_deref(), Some("Short"));
    assert_eq!(input.vendor.as_deref(), Some("Acme"));
    assert_eq!(input.status.as_deref(), Some("draft"));
    assert_eq!(input.product_type.as_deref(), Some("Kitchen"));
    assert_eq!(input.tags.as_deref(), Some("mugs,ceramic,gifts"));

    let variant = &input.variants.as_ref().unwrap()[0];
    assert_eq!(variant.sku.as_deref(), Some("MUG-1"));
    assert_eq!(variant.price.as_deref(), Some("49.90"));
    assert_eq!(variant.compare_at_price.as_deref(), Some("59.90"));
    assert_eq!(variant.inventory_quantity, Some(12));
    assert_eq!(variant.weight, Some(0.35));
    assert_eq!(variant.weight_unit.as_deref(), Some("kg"));

    let images = input.images.as_ref().unwrap();
    assert_eq!(images.len(), 2);
    assert_eq!(images[0].position, 1);
    assert_eq!(images[1].position, 2);
    assert_eq!(images[1].src, "https://cdn.example.com/b.jpg");
    assert_eq!(images[0].alt, "Ceramic mug");

    let metafields = input.metafields.as_ref().unwrap();
    assert_eq!(metafields.len(), 2);
    assert_eq!(metafields[0].namespace, "custom");
    assert_eq!(metafields[0].key, "ean");
    assert_eq!(metafields[1].value, "B00TEST");
}

#[test]
fn description_wins_over_short_description() {
    let input = create_payload(&draft(json!({
        "description": "<p>Long</p>",
        "shortDescription": "Short"
    })));
    assert_eq!(input.body_html.as_deref(), Some("<p>Long</p>"));
}

#[test]
fn create_payload_serializes_without_absent_fields() {
    let value = serde_json::to_value(create_payload(&draft(json!({"name": "Mug"})))).unwrap();
    let product = value.as_object().unwrap();
    assert!(!product.contains_key("id"));
    assert!(!product.contains_key("product_type"));
    assert!(!product.contains_key("images"));
    let variant = &value["variants"][0];
    assert!(variant.get("compare_at_price").is_none());
    assert!(variant.get("weight").is_none());
}

#[test]
fn invalid_weight_is_dropped() {
    let input = create_payload(&draft(json!({"weight": "heavy"})));
    let variant = &input.variants.unwrap()[0];
    assert!(variant.weight.is_none());
    assert!(variant.weight_unit.is_none());
}

#[test]
fn update_payload_without_variant_id_skips_variants() {
    let input = update_payload(42, &draft(json!({"name": "Mug", "price": "10"}))).unwrap();
    assert_eq!(input.id, Some(42));
    assert!(input.variants.is_none());
    assert!(input.images.is_none());
    assert!(input.metafields.is_none());
}

#[test]
fn update_payload_with_variant_id_sends_variant() {
    let input = update_payload(
        42,
        &draft(json!({
            "name": "Mug",
            "sku": "MUG-1",
            "price": "10",
            "stock": 3,
            "shopifyVariantId": 4242
        })),
    )
    .unwrap();

    let variant = &input.variants.unwrap()[0];
    assert_eq!(variant.id, Some(4242));
    assert_eq!(variant.sku.as_deref(), Some("MUG-1"));
    assert_eq!(variant.price.as_deref(), Some("10"));
    assert_eq!(variant.inventory_quantity, Some(3));
    assert!(variant.inventory_management.is_none());
}

#[test]
fn update_payload_sends_only_present_fields() {
    let input = update_payload(
        42,
        &draft(json!({"price": "9.99", "shopifyVariantId": "420"})),
    )
    .unwrap();
    assert!(input.title.is_none());
    assert!(input.vendor.is_none());
    assert!(input.body_html.is_none());
    assert!(input.status.is_none());

    let value = serde_json::to_value(&input).unwrap();
    let product = value.as_object().unwrap();
    let mut keys: Vec<&str> = product.keys().map(String::as_str).collect();
    keys.sort_unstable();
    assert_eq!(keys, ["id", "variants"]);
    assert_eq!(value["variants"][0], json!({"id": 420, "price": "9.99"}));
}

#[test]
fn update_payload_keeps_explicit_inactive_status() {
    let input = update_payload(42, &draft(json!({"active": false}))).unwrap();
    assert_eq!(input.status.as_deref(), Some("draft"));
    assert!(input.title.is_none());
}

#[test]
fn update_payload_skips_variant_without_variant_changes() {
    let input = update_payload(42, &draft(json!({"name": "Mug", "shopifyVariantId": "420"}))).unwrap();
    assert_eq!(input.title.as_deref(), Some("Mug"));
    assert!(input.variants.is_none());
}

#[test]
fn decimal_comma_prices_are_normalized() {
    let input = create_payload(&draft(json!({"price": "12,50", "comparePrice": "15,00"})));
    let variant = &input.variants.unwrap()[0];
    assert_eq!(variant.price.as_deref(), Some("12.50"));
    assert_eq!(variant.compare_at_price.as_deref(), Some("15.00"));

    let input = update_payload(42, &draft(json!({"price": "7,5", "shopifyVariantId": "420"}))).unwrap();
    assert_eq!(input.variants.unwrap()[0].price.as_deref(), Some("7.5"));
}

#[test]
fn update_payload_rejects_non_numeric_variant_id() {
    let result = update_payload(42, &draft(json!({"shopifyVariantId": "gid://x"})));
    assert!(matches!(result, Err(ShopifyError::InvalidId(_))));
}

#[test]
fn import_product_uses_first_variant_and_image() {
    let long_body = "x".repeat(250);
    let product = shopify_product(json!({
        "id": 8_001,
        "title": "Mug",
        "body_html": long_body,
        "vendor": "Acme",
        "product_type": "Kitchen",
        "tags": "mugs, gifts",
        "status": "active",
        "variants": [
            {"id": 9_001, "sku": "MUG-1", "barcode": "594", "price": "49.90",
             "compare_at_price": "59.90", "inventory_quantity": 7, "weight": 0.35},
            {"id": 9_002, "sku": "MUG-2", "price": "1.00"}
        ],
        "images": [
            {"id": 1, "src": "https://cdn.shopify.com/a.jpg", "alt": "front"},
            {"id": 2, "src": "https://cdn.shopify.com/b.jpg", "alt": null}
        ]
    }));

    let imported = import_product(&product);
    assert_eq!(imported.shopify_id, "8001");
    assert_eq!(imported.shopify_variant_id.as_deref(), Some("9001"));
    assert_eq!(imported.sku, "MUG-1");
    assert_eq!(imported.ean, "594");
    assert_eq!(imported.price, "49.90");
    assert_eq!(imported.compare_price.as_deref(), Some("59.90"));
    assert_eq!(imported.stock, 7);
    assert_eq!(imported.weight, "0.35");
    assert_eq!(imported.brand, "Acme");
    assert_eq!(imported.category, "Kitchen");
    assert_eq!(imported.tags, "mugs, gifts");
    assert!(imported.active);
    assert_eq!(imported.short_description.chars().count(), 200);
    assert_eq!(imported.description.len(), 250);
    assert_eq!(imported.image.as_deref(), Some("https://cdn.shopify.com/a.jpg"));
    assert_eq!(imported.images.len(), 2);
    assert_eq!(imported.images[0].alt.as_deref(), Some("front"));
}

#[test]
fn import_product_without_variants_uses_defaults() {
    let product = shopify_product(json!({
        "id": 1,
        "title": "Bare",
        "status": "draft",
        "body_html": null
    }));
    let imported = import_product(&product);
    assert_eq!(imported.price, "0.00");
    assert_eq!(imported.stock, 0);
    assert!(imported.shopify_variant_id.is_none());
    assert!(!imported.active);
    assert!(imported.image.is_none());
    assert_eq!(imported.weight, "");
}

#[test]
fn parse_shopify_id_accepts_digits_only() {
    assert_eq!(parse_shopify_id(" 123 ").unwrap(), 123);
    assert!(parse_shopify_id("abc").is_err());
}
