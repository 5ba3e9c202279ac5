//! Full-catalog fetch with a two-pass retry.

use shelfscan_core::ProductSummary;

use crate::client::HttpClient;
use crate::error::ScraperError;
use crate::normalize::normalize_summary;
use crate::pagination::PagePlan;
use crate::rate_limit::retry_pass;
use crate::types::CountResponse;

use super::{CatalogClient, SEARCH_HEADERS};

/// Result of [`CatalogClient::fetch_all_pages`].
#[derive(Debug, Clone)]
pub struct CatalogFetch {
    /// First-pass pages in page order, then recovered pages in the order
    /// they succeeded.
    pub products: Vec<ProductSummary>,
    /// 0-based pages whose products are missing from `products`.
    pub dropped_pages: Vec<u32>,
    pub plan: PagePlan,
}

impl CatalogClient {
    /// Fetches every listing page up to the configured product cap.
    ///
    /// The first pass requests each page once and queues failures without
    /// waiting. The second pass retries each queued page on a fresh HTTP
    /// client, backing off per [`shelfscan_core::RetryPolicy`]. Pages that
    /// fail every retry are dropped and listed in
    /// [`CatalogFetch::dropped_pages`].
    ///
    /// # Errors
    ///
    /// Only the initial count request can fail the call: without a total
    /// there is no page plan.
    pub async fn fetch_all_pages(&self) -> Result<CatalogFetch, ScraperError> {
        let url = self.search_url()?;
        let page_size = self.settings.page_size;

        let count: CountResponse = self
            .http
            .get(&url, &self.search_params(page_size, 0, None), &SEARCH_HEADERS)
            .await?
            .json("product count")?;

        let plan = PagePlan::new(
            count.meta.pagination.total_count,
            page_size,
            self.settings.max_products,
        );
        tracing::info!(
            reported_total = plan.reported_total,
            effective_total = plan.effective_total,
            pages = plan.page_count,
            "fetching catalog listing"
        );

        let mut products = Vec::new();
        let mut failed_pages = Vec::new();

        for page in 0..plan.page_count {
            let offset = plan.offset(page);
            match self
                .request_page(&self.http, &url, page_size, offset, None)
                .await
            {
                Ok(response) => products.extend(response.data.into_iter().map(normalize_summary)),
                Err(e) => {
                    tracing::warn!(
                        page,
                        offset,
                        kind = ?e.kind(),
                        error = %e,
                        "listing page failed, queued for retry"
                    );
                    failed_pages.push(page);
                }
            }
        }

        let mut dropped_pages = Vec::new();
        if !failed_pages.is_empty() {
            tracing::info!(count = failed_pages.len(), "retrying failed listing pages");
            match self.fresh_http() {
                Ok(retry_http) => {
                    for page in failed_pages {
                        match self.retry_page(&retry_http, &url, &plan, page).await {
                            Some(recovered) => products.extend(recovered),
                            None => dropped_pages.push(page),
                        }
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "could not build retry client");
                    dropped_pages = failed_pages;
                }
            }
        }

        if !dropped_pages.is_empty() {
            tracing::warn!(?dropped_pages, "listing pages dropped after retries");
        }

        Ok(CatalogFetch {
            products,
            dropped_pages,
            plan,
        })
    }

    /// Retries one page per [`retry_pass`]. Returns `None` once every
    /// attempt has failed.
    async fn retry_page(
        &self,
        http: &HttpClient,
        url: &str,
        plan: &PagePlan,
        page: u32,
    ) -> Option<Vec<ProductSummary>> {
        let offset = plan.offset(page);
        let result = retry_pass(&self.policy, move || {
            self.request_page(http, url, plan.page_size, offset, None)
        })
        .await;

        match result {
            Ok(response) => Some(response.data.into_iter().map(normalize_summary).collect()),
            Err(err) => {
                tracing::error!(
                    page,
                    offset,
                    attempts = self.policy.page_attempts,
                    kind = ?err.kind(),
                    error = %err,
                    "listing page failed every retry, dropping"
                );
                None
            }
        }
    }
}
