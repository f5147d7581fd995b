//! Shopify Admin REST API access for OptiSell: a per-store client, product
//! mapping, push orchestration and OAuth install helpers.

pub mod client;
pub mod error;
pub mod mapping;
pub mod oauth;
pub mod pagination;
pub mod sync;
pub mod types;

pub use client::{
    ClientSettings, ConnectionFailure, ConnectionTest, ProductListParams, ProductPage,
    ShopifyAdminClient, SkuMatch, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT,
};
pub use error::{status_hint, ShopifyError};
pub use mapping::{create_payload, import_product, parse_shopify_id, update_payload};
pub use oauth::AccessGrant;
pub use sync::{sync_many, sync_product, SyncAction, SyncMode, SyncOutcome, SyncResult};
pub use types::{ProductInput, ShopifyImage, ShopifyProduct, ShopifyShop, ShopifyVariant};
