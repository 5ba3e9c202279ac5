use std::path::PathBuf;

use crate::app_config::{AppConfig, CatalogSettings, RetryPolicy, StorefrontSettings};
use crate::ConfigError;

const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36";

/// Page sizes the product-search API accepts.
const VALID_PAGE_SIZES: [u32; 7] = [12, 16, 24, 30, 32, 48, 60];

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Every variable has a default, so an empty environment yields the
/// production configuration for store 440-018 / 1426.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let log_level = or_default("SHELFSCAN_LOG_LEVEL", "info");
    let output_dir = PathBuf::from(or_default("SHELFSCAN_OUTPUT_DIR", "public"));
    let user_agent = or_default("SHELFSCAN_USER_AGENT", DEFAULT_USER_AGENT);

    let page_size = parse_page_size("SHELFSCAN_PAGE_SIZE", &or_default("SHELFSCAN_PAGE_SIZE", "60"))?;
    let category_page_size = parse_page_size(
        "SHELFSCAN_CATEGORY_PAGE_SIZE",
        &or_default("SHELFSCAN_CATEGORY_PAGE_SIZE", "12"),
    )?;

    let catalog = CatalogSettings {
        base_url: or_default("SHELFSCAN_CATALOG_BASE_URL", "https://api.aldi.us"),
        service_point: or_default("SHELFSCAN_SERVICE_POINT", "440-018"),
        page_size,
        category_page_size,
        max_products: parse_u32("SHELFSCAN_MAX_PRODUCTS", "1000")?,
        max_discovery_iterations: parse_usize("SHELFSCAN_MAX_DISCOVERY_ITERATIONS", "10")?,
        request_timeout_secs: parse_u64("SHELFSCAN_REQUEST_TIMEOUT_SECS", "30")?,
    };

    let storefront = StorefrontSettings {
        base_url: or_default("SHELFSCAN_STOREFRONT_BASE_URL", "https://www.walmart.com"),
        store_id: parse_u32("SHELFSCAN_STORE_ID", "1426")?,
        html_timeout_secs: parse_u64("SHELFSCAN_HTML_TIMEOUT_SECS", "15")?,
        inter_request_delay_ms: parse_u64("SHELFSCAN_INTER_REQUEST_DELAY_MS", "1000")?,
    };

    let defaults = RetryPolicy::default();
    let retry = RetryPolicy {
        transport_max_retries: parse_u32("SHELFSCAN_TRANSPORT_MAX_RETRIES", "3")?,
        transport_backoff_base_secs: parse_u64("SHELFSCAN_TRANSPORT_BACKOFF_BASE_SECS", "2")?,
        blocked_backoff_secs: parse_u64("SHELFSCAN_BLOCKED_BACKOFF_SECS", "60")?,
        error_backoff_base_secs: parse_u64("SHELFSCAN_ERROR_BACKOFF_BASE_SECS", "5")?,
        detail_backoff_base_secs: parse_u64("SHELFSCAN_DETAIL_BACKOFF_BASE_SECS", "2")?,
        ..defaults
    };

    Ok(AppConfig {
        log_level,
        output_dir,
        user_agent,
        catalog,
        storefront,
        retry,
    })
}

/// Parse a page size and reject values the product-search API refuses.
fn parse_page_size(var: &str, raw: &str) -> Result<u32, ConfigError> {
    let value = raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason: e.to_string(),
    })?;
    if VALID_PAGE_SIZES.contains(&value) {
        Ok(value)
    } else {
        Err(ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: format!("{value} is not one of {VALID_PAGE_SIZES:?}"),
        })
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
