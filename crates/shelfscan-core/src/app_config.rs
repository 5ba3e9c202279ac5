use std::path::PathBuf;
use std::time::Duration;

/// Top-level configuration assembled from the environment once per process.
///
/// Components never read the environment themselves; the CLI builds an
/// `AppConfig` and hands the relevant settings value to each client at
/// construction time.
#[derive(Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub output_dir: PathBuf,
    pub user_agent: String,
    pub catalog: CatalogSettings,
    pub storefront: StorefrontSettings,
    pub retry: RetryPolicy,
}

/// Settings for the JSON product-search API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogSettings {
    /// Origin of the API, e.g. `https://api.aldi.us`.
    pub base_url: String,
    /// Store / service-point identifier sent with every request.
    pub service_point: String,
    /// Page size for the full-catalog fetch. The API only accepts
    /// 12, 16, 24, 30, 32, 48 or 60.
    pub page_size: u32,
    /// Page size for category-filtered fetches.
    pub category_page_size: u32,
    /// Hard cap on products requested per listing; the API errors past 1000.
    pub max_products: u32,
    pub max_discovery_iterations: usize,
    pub request_timeout_secs: u64,
}

/// Settings for the HTML storefront.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorefrontSettings {
    pub base_url: String,
    pub store_id: u32,
    pub html_timeout_secs: u64,
    pub inter_request_delay_ms: u64,
}

/// Backoff knobs for every retry layer in the scraper.
///
/// Tests set every base to zero so retry paths run without sleeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Additional attempts the HTTP client makes on 429/5xx and connect
    /// failures before giving up.
    pub transport_max_retries: u32,
    /// Client-level delay before the n-th retry is `base * 2^(n-1)`.
    pub transport_backoff_base_secs: u64,
    /// Attempts per failed page in the catalog retry pass.
    pub page_attempts: u32,
    /// Blocked-status delay in the retry pass is `unit * attempt`.
    pub blocked_backoff_secs: u64,
    /// Malformed/transport delay in the retry pass is `2^attempt * base`.
    pub error_backoff_base_secs: u64,
    /// Attempts per detail fetch.
    pub detail_attempts: u32,
    /// Detail delay is `2^attempt * base`, attempt counted from zero.
    pub detail_backoff_base_secs: u64,
}

impl RetryPolicy {
    /// Delay after a blocked response on 1-based `attempt` of the retry pass:
    /// 60s, 120s, 180s with the default unit.
    #[must_use]
    pub fn blocked_delay(&self, attempt: u32) -> Duration {
        Duration::from_secs(self.blocked_backoff_secs.saturating_mul(u64::from(attempt)))
    }

    /// Delay after a malformed body or transport failure on 1-based
    /// `attempt` of the retry pass: 10s, 20s, 40s with the default base.
    #[must_use]
    pub fn error_delay(&self, attempt: u32) -> Duration {
        Duration::from_secs(
            self.error_backoff_base_secs
                .saturating_mul(1u64 << attempt.min(62)),
        )
    }

    /// Delay after a failed detail fetch on 0-based `attempt`: 2s, 4s, 8s
    /// with the default base.
    #[must_use]
    pub fn detail_delay(&self, attempt: u32) -> Duration {
        Duration::from_secs(
            self.detail_backoff_base_secs
                .saturating_mul(1u64 << attempt.min(62)),
        )
    }

    /// A policy that retries the normal number of times without sleeping.
    #[must_use]
    pub fn immediate() -> Self {
        Self {
            transport_backoff_base_secs: 0,
            blocked_backoff_secs: 0,
            error_backoff_base_secs: 0,
            detail_backoff_base_secs: 0,
            ..Self::default()
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            transport_max_retries: 3,
            transport_backoff_base_secs: 2,
            page_attempts: 3,
            blocked_backoff_secs: 60,
            error_backoff_base_secs: 5,
            detail_attempts: 3,
            detail_backoff_base_secs: 2,
        }
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("log_level", &self.log_level)
            .field("output_dir", &self.output_dir)
            .field("user_agent", &self.user_agent)
            .field("catalog.base_url", &self.catalog.base_url)
            .field("catalog.service_point", &self.catalog.service_point)
            .field("catalog.page_size", &self.catalog.page_size)
            .field("catalog.max_products", &self.catalog.max_products)
            .field("storefront.base_url", &self.storefront.base_url)
            .field("storefront.store_id", &self.storefront.store_id)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}
