//! Client for the JSON product-search and product-detail API.
//!
//! Three fetch paths share one [`HttpClient`]:
//!
//! - [`CatalogClient::fetch_all_pages`] walks the unfiltered listing with a
//!   two-pass retry and reports the pages it had to drop.
//! - [`CatalogClient::fetch_by_category`] walks one category, single pass,
//!   stopping at the first failure.
//! - [`CatalogClient::fetch_detail`] hydrates one SKU and never fails.

mod category;
mod detail;
mod fetch_all;

pub use fetch_all::CatalogFetch;

use shelfscan_core::{CatalogSettings, RetryPolicy};

use crate::client::{join_url, HttpClient};
use crate::error::ScraperError;
use crate::types::SearchResponse;

/// Storefront origin the API expects in `Origin` / `Referer`.
const SITE_ORIGIN: &str = "https://www.aldi.us";

const SEARCH_PATH: &str = "v3/product-search";
const DETAIL_PATH: &str = "v1/products";

/// Query parameters sent with every listing request.
const STATIC_SEARCH_PARAMS: [(&str, &str); 4] = [
    ("currency", "USD"),
    ("serviceType", "pickup"),
    ("sort", "relevance"),
    ("testVariant", "A"),
];

const SEARCH_HEADERS: [(&str, &str); 3] = [
    ("Accept", "application/json, text/plain, */*"),
    ("Accept-Language", "en-US,en;q=0.9"),
    ("Origin", SITE_ORIGIN),
];

const DETAIL_HEADERS: [(&str, &str); 3] = [
    ("Accept", "application/json, text/plain, */*"),
    ("Referer", SITE_ORIGIN),
    ("Origin", SITE_ORIGIN),
];

/// Sequential client for one service point of the catalog API.
pub struct CatalogClient {
    http: HttpClient,
    settings: CatalogSettings,
    policy: RetryPolicy,
    user_agent: String,
}

impl CatalogClient {
    /// Builds a client for `settings`, retrying per `policy`.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the HTTP client cannot be built.
    pub fn new(
        settings: &CatalogSettings,
        policy: RetryPolicy,
        user_agent: &str,
    ) -> Result<Self, ScraperError> {
        let http = HttpClient::with_policy(settings.request_timeout_secs, user_agent, &policy)?;
        Ok(Self {
            http,
            settings: settings.clone(),
            policy,
            user_agent: user_agent.to_owned(),
        })
    }

    #[must_use]
    pub fn settings(&self) -> &CatalogSettings {
        &self.settings
    }

    /// A new HTTP client with the same configuration, sharing no
    /// connection state with `self.http`.
    fn fresh_http(&self) -> Result<HttpClient, ScraperError> {
        HttpClient::with_policy(
            self.settings.request_timeout_secs,
            &self.user_agent,
            &self.policy,
        )
    }

    fn search_url(&self) -> Result<String, ScraperError> {
        join_url(&self.settings.base_url, SEARCH_PATH)
    }

    fn detail_url(&self, sku: &str) -> Result<String, ScraperError> {
        join_url(&self.settings.base_url, &format!("{DETAIL_PATH}/{sku}"))
    }

    /// Listing query for one page, optionally filtered to a category.
    fn search_params(
        &self,
        limit: u32,
        offset: u64,
        category_key: Option<&str>,
    ) -> Vec<(&'static str, String)> {
        let mut params: Vec<(&'static str, String)> = STATIC_SEARCH_PARAMS
            .iter()
            .map(|(name, value)| (*name, (*value).to_owned()))
            .collect();
        params.push(("limit", limit.to_string()));
        params.push(("offset", offset.to_string()));
        params.push(("servicePoint", self.settings.service_point.clone()));
        if let Some(key) = category_key {
            params.push(("categoryKey", key.to_owned()));
        }
        params
    }

    /// Requests one listing page through `http` and decodes it.
    ///
    /// A body without a `data` array is a [`ScraperError::Deserialize`].
    async fn request_page(
        &self,
        http: &HttpClient,
        url: &str,
        limit: u32,
        offset: u64,
        category_key: Option<&str>,
    ) -> Result<SearchResponse, ScraperError> {
        let params = self.search_params(limit, offset, category_key);
        http.get(url, &params, &SEARCH_HEADERS)
            .await?
            .json::<SearchResponse>(&format!("listing page at offset {offset}"))
    }
}
