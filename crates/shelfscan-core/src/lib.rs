pub mod app_config;
pub mod config;
pub mod products;

pub use app_config::{AppConfig, CatalogSettings, RetryPolicy, StorefrontSettings};
pub use config::{load_app_config, load_app_config_from_env};
pub use products::{
    is_valid_category_key, CatalogRecord, PageProduct, ProductDetail, ProductSummary, SearchHit,
    Specification,
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
