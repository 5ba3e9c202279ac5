pub mod catalog;
pub mod client;
pub mod discovery;
pub mod error;
pub mod normalize;
pub mod pagination;
pub mod pipeline;
pub(crate) mod rate_limit;
pub mod storefront;
pub mod types;

pub use catalog::{CatalogClient, CatalogFetch};
pub use client::{HttpClient, RawResponse};
pub use discovery::{
    discover_and_fetch_by_category, CatalogSource, DiscoveryFrontier, DiscoveryOutcome,
};
pub use error::{FailureKind, ScraperError};
pub use normalize::{extract_category_keys, normalize_detail, normalize_summary, try_parse_key_list};
pub use pagination::PagePlan;
pub use pipeline::{merge_records, run_catalog, CatalogRun};
pub use storefront::{extract_next_data, parse_product_page, parse_search_page, StorefrontClient};
