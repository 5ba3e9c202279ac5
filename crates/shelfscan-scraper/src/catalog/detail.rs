//! Per-SKU detail hydration.

use shelfscan_core::ProductDetail;

use crate::error::FailureKind;
use crate::normalize::normalize_detail;
use crate::rate_limit::retry_detail;
use crate::types::DetailResponse;

use super::{CatalogClient, DETAIL_HEADERS};

impl CatalogClient {
    /// Fetches the detail record for `id`.
    ///
    /// Every failure is retried per [`retry_detail`]: up to
    /// `detail_attempts` tries with a doubling delay. When the attempts run
    /// out the result is [`ProductDetail::placeholder`]: a blocked final
    /// attempt logs a warning, anything else logs an error.
    pub async fn fetch_detail(&self, id: &str) -> ProductDetail {
        let url = match self.detail_url(id) {
            Ok(url) => url,
            Err(e) => {
                tracing::error!(id, error = %e, "invalid detail URL");
                return ProductDetail::placeholder(id);
            }
        };
        let params = [
            ("servicePoint", self.settings.service_point.clone()),
            ("serviceType", "pickup".to_owned()),
        ];
        let (url, params) = (url.as_str(), &params);
        let result = retry_detail(&self.policy, || async move {
            self.http
                .get(url, params, &DETAIL_HEADERS)
                .await?
                .json::<DetailResponse>(&format!("detail {id}"))
        })
        .await;

        match result {
            Ok(envelope) => normalize_detail(id, envelope.data),
            Err(err) => {
                let attempts = self.policy.detail_attempts;
                if err.kind() == FailureKind::Blocked {
                    tracing::warn!(id, attempts, "detail blocked on every attempt");
                } else {
                    tracing::error!(id, attempts, error = %err, "detail fetch failed");
                }
                ProductDetail::placeholder(id)
            }
        }
    }
}
