//! Client for the HTML storefront: search pages, product pages, and the
//! server-rendered page state.
//!
//! Unlike the catalog API there is no retry layer above the HTTP client
//! here. Any blocked status, other error status, or transport failure ends
//! the current operation with whatever was collected.

mod jsonld;
mod next_data;
mod page;
pub mod rules;
mod search;
mod text;

pub use next_data::extract_next_data;
pub use page::parse_product_page;
pub use search::parse_search_page;

use std::time::Duration;

use serde_json::Value;
use shelfscan_core::{PageProduct, RetryPolicy, SearchHit, StorefrontSettings};

use crate::client::{join_url, HttpClient, RawResponse};
use crate::error::ScraperError;

/// Search terms swept by [`StorefrontClient::fetch_store_products`].
pub const STORE_SWEEP_TERMS: [&str; 13] = [
    "milk", "bread", "eggs", "chicken", "beef", "bananas", "apples", "lettuce", "tomatoes",
    "cereal", "pasta", "rice", "soup",
];

/// Per-term cap for the store sweep.
pub const STORE_SWEEP_MAX_PER_TERM: usize = 100;

const HTML_HEADERS: [(&str, &str); 2] = [
    (
        "Accept",
        "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
    ),
    ("Accept-Language", "en-US,en;q=0.9"),
];

/// Sequential client for one storefront.
pub struct StorefrontClient {
    http: HttpClient,
    settings: StorefrontSettings,
}

impl StorefrontClient {
    /// Builds a client for `settings`. Requests use the HTML timeout.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the HTTP client cannot be built.
    pub fn new(
        settings: &StorefrontSettings,
        policy: &RetryPolicy,
        user_agent: &str,
    ) -> Result<Self, ScraperError> {
        let http = HttpClient::with_policy(settings.html_timeout_secs, user_agent, policy)?;
        Ok(Self {
            http,
            settings: settings.clone(),
        })
    }

    #[must_use]
    pub fn settings(&self) -> &StorefrontSettings {
        &self.settings
    }

    fn inter_request_delay(&self) -> Duration {
        Duration::from_millis(self.settings.inter_request_delay_ms)
    }

    /// Searches `query` at the configured store, page by page.
    ///
    /// Stops on a blocked status, any other error, an empty page, or once
    /// `max_products` hits are collected (the result is truncated to it).
    /// Hits are not deduplicated across pages.
    pub async fn search_products(&self, query: &str, max_products: usize) -> Vec<SearchHit> {
        let url = match join_url(&self.settings.base_url, "search") {
            Ok(url) => url,
            Err(e) => {
                tracing::error!(error = %e, "invalid storefront URL");
                return Vec::new();
            }
        };

        let mut hits: Vec<SearchHit> = Vec::new();
        let mut page = 1u32;

        while hits.len() < max_products {
            let params = [
                ("q", query.to_owned()),
                ("page", page.to_string()),
                ("store", self.settings.store_id.to_string()),
            ];
            let body = match self
                .http
                .get(&url, &params, &HTML_HEADERS)
                .await
                .and_then(RawResponse::into_body)
            {
                Ok(body) => body,
                Err(e) => {
                    tracing::warn!(
                        query,
                        page,
                        kind = ?e.kind(),
                        error = %e,
                        "search page failed, stopping"
                    );
                    break;
                }
            };

            let page_hits =
                parse_search_page(&body, &self.settings.base_url, self.settings.store_id);
            if page_hits.is_empty() {
                tracing::info!(query, page, "no more search results");
                break;
            }
            hits.extend(page_hits);
            tracing::info!(query, page, total = hits.len(), "search page parsed");

            if hits.len() >= max_products {
                hits.truncate(max_products);
                break;
            }

            page += 1;
            tokio::time::sleep(self.inter_request_delay()).await;
        }

        hits
    }

    /// Sweeps [`STORE_SWEEP_TERMS`] and returns every distinct item found,
    /// first occurrence kept. Waits twice the inter-request delay between
    /// terms.
    pub async fn fetch_store_products(&self) -> Vec<SearchHit> {
        let mut seen = std::collections::HashSet::new();
        let mut products = Vec::new();

        for (i, term) in STORE_SWEEP_TERMS.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(self.inter_request_delay() * 2).await;
            }
            tracing::info!(term, store_id = self.settings.store_id, "sweeping store");
            let hits = self.search_products(term, STORE_SWEEP_MAX_PER_TERM).await;
            products.extend(hits.into_iter().filter(|h| seen.insert(h.item_id.clone())));
        }

        tracing::info!(count = products.len(), "store sweep complete");
        products
    }

    /// Fetches the raw HTML of the product page for `item_id`, optionally
    /// scoped to a store. Returns the request URL and the body.
    async fn fetch_product_html(
        &self,
        item_id: &str,
        store_id: Option<u32>,
    ) -> Result<(String, String), ScraperError> {
        let url = join_url(&self.settings.base_url, &format!("ip/{item_id}"))?;
        let mut params = Vec::new();
        if let Some(store) = store_id {
            params.push(("store", store.to_string()));
            params.push(("fulfillmentIntent", "In-store".to_owned()));
        }
        let response = self.http.get(&url, &params, &HTML_HEADERS).await?;
        if response.status != 200 {
            return Err(if response.is_blocked() {
                ScraperError::Blocked {
                    url: response.url,
                    status: response.status,
                }
            } else {
                ScraperError::UnexpectedStatus {
                    status: response.status,
                    url: response.url,
                }
            });
        }
        Ok((url, response.body))
    }

    /// Fetches and parses the product page for `item_id`.
    ///
    /// Returns `None` (logged) on any non-200 status or transport failure.
    pub async fn fetch_product_page(
        &self,
        item_id: &str,
        store_id: Option<u32>,
    ) -> Option<PageProduct> {
        match self.fetch_product_html(item_id, store_id).await {
            Ok((url, html)) => Some(parse_product_page(&html, item_id, &url)),
            Err(e) => {
                tracing::warn!(item_id, kind = ?e.kind(), error = %e, "product page fetch failed");
                None
            }
        }
    }

    /// Fetches the product page for `item_id` and returns its decoded
    /// `__NEXT_DATA__`, or `None` (logged) when the page or blob is missing.
    pub async fn fetch_next_data(&self, item_id: &str, store_id: Option<u32>) -> Option<Value> {
        match self.fetch_product_html(item_id, store_id).await {
            Ok((_, html)) => {
                let data = extract_next_data(&html);
                if data.is_none() {
                    tracing::warn!(item_id, "__NEXT_DATA__ not found in page");
                }
                data
            }
            Err(e) => {
                tracing::warn!(item_id, kind = ?e.kind(), error = %e, "product page fetch failed");
                None
            }
        }
    }
}
