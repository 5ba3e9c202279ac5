//! Category-filtered listing: single pass, stop at the first failure.

use serde_json::Value;
use shelfscan_core::ProductSummary;

use crate::normalize::normalize_summary;
use crate::pagination::PagePlan;

use super::{CatalogClient, SEARCH_HEADERS};

impl CatalogClient {
    /// Fetches the products listed under `category_key`.
    ///
    /// There is no retry pass. A blocked status, malformed body, or
    /// transport error on any page ends the walk and the products gathered
    /// so far are returned. A failed count request yields an empty result.
    /// Failures are logged, never returned.
    pub async fn fetch_by_category(&self, category_key: &str) -> Vec<ProductSummary> {
        let limit = self.settings.category_page_size;

        let url = match self.search_url() {
            Ok(url) => url,
            Err(e) => {
                tracing::error!(category_key, error = %e, "invalid catalog URL");
                return Vec::new();
            }
        };

        let count = match self
            .http
            .get(
                &url,
                &self.search_params(limit, 0, Some(category_key)),
                &SEARCH_HEADERS,
            )
            .await
            .and_then(|r| r.json::<Value>("category count"))
        {
            Ok(body) => body,
            Err(e) => {
                tracing::error!(
                    category_key,
                    kind = ?e.kind(),
                    error = %e,
                    "category count request failed"
                );
                return Vec::new();
            }
        };

        let reported_total = count
            .pointer("/meta/pagination/totalCount")
            .and_then(Value::as_u64)
            .unwrap_or(0);
        let plan = PagePlan::new(reported_total, limit, self.settings.max_products);
        tracing::debug!(
            category_key,
            reported_total,
            pages = plan.page_count,
            "fetching category"
        );

        let mut products = Vec::new();
        for page in 0..plan.page_count {
            let offset = plan.offset(page);
            match self
                .request_page(&self.http, &url, limit, offset, Some(category_key))
                .await
            {
                Ok(response) => products.extend(response.data.into_iter().map(normalize_summary)),
                Err(e) => {
                    tracing::warn!(
                        category_key,
                        page,
                        offset,
                        kind = ?e.kind(),
                        error = %e,
                        "category page failed, skipping remaining pages"
                    );
                    break;
                }
            }
        }

        products
    }
}
