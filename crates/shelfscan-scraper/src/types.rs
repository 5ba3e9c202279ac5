//! Wire types for the product-search and product-detail endpoints.
//!
//! ## Observed shape
//!
//! ### Listing (`GET /v3/product-search`)
//! ```text
//! { "meta": { "pagination": { "offset": 0, "limit": 60, "totalCount": 1432 } },
//!   "data": [ { "sku": "0000000000451612", "name": "...", "brandName": "...",
//!               "urlSlugText": "...", "sellingSize": "16 oz",
//!               "price": { "amountRelevantDisplay": "$2.49" },
//!               "countryExtensions": { "usSnapEligible": true } } ] }
//! ```
//! A body without `data` is treated as malformed even when the status is 200;
//! the API returns an error envelope that way under load.
//!
//! ### Detail (`GET /v1/products/{sku}`)
//! The record is wrapped in `data`. `categories[]` entries carry a `key`
//! on most records and only an `id` (sometimes numeric) on older ones.
//! `assets` and `warnings` are arrays that may be empty, absent, or `null`.

use serde::Deserialize;
use serde_json::Value;

/// First-request envelope: only the reported total is needed.
#[derive(Debug, Deserialize)]
pub struct CountResponse {
    pub meta: SearchMeta,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchMeta {
    pub pagination: Pagination,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total_count: u64,
}

/// One listing page. `data` is required; its absence is a malformed page.
#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    pub data: Vec<RawProduct>,
}

/// A single entry of a listing page.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawProduct {
    pub sku: String,
    pub name: String,
    #[serde(default)]
    pub brand_name: Option<String>,
    #[serde(default)]
    pub url_slug_text: Option<String>,
    /// e.g. `"16 oz"`.
    #[serde(default)]
    pub selling_size: Option<String>,
    #[serde(default)]
    pub price: Option<RawPrice>,
    #[serde(default)]
    pub country_extensions: Option<CountryExtensions>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPrice {
    #[serde(default)]
    pub amount_relevant_display: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountryExtensions {
    #[serde(default)]
    pub us_snap_eligible: Option<bool>,
}

/// Detail endpoint envelope.
#[derive(Debug, Deserialize)]
pub struct DetailResponse {
    pub data: RawDetail,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDetail {
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub categories: Option<Vec<RawCategory>>,
    #[serde(default)]
    pub country_origin: Option<String>,
    #[serde(default)]
    pub assets: Option<Vec<RawAsset>>,
    #[serde(default)]
    pub warnings: Option<Vec<RawWarning>>,
}

/// A taxonomy node. `key` and `id` may be strings or numbers.
#[derive(Debug, Deserialize)]
pub struct RawCategory {
    #[serde(default)]
    pub key: Option<Value>,
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RawAsset {
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RawWarning {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}
