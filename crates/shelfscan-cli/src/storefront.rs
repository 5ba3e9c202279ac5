//! Storefront command handlers.
//!
//! Storefront failures never abort a command: a failed page fetch prints a
//! message and returns `Ok`, matching the scraper's log-and-continue policy.

use shelfscan_core::AppConfig;
use shelfscan_scraper::StorefrontClient;

use crate::output;

pub(crate) fn build_storefront_client(config: &AppConfig) -> anyhow::Result<StorefrontClient> {
    StorefrontClient::new(&config.storefront, &config.retry, &config.user_agent)
        .map_err(|e| anyhow::anyhow!("failed to build storefront client: {e}"))
}

/// Sweeps the configured store and writes the hits as CSV and JSON.
///
/// # Errors
///
/// Returns an error if the client cannot be built or the output cannot be
/// written.
pub(crate) async fn run_store_command(config: &AppConfig) -> anyhow::Result<()> {
    let client = build_storefront_client(config)?;
    let store_id = config.storefront.store_id;

    let products = client.fetch_store_products().await;
    if products.is_empty() {
        println!("store {store_id}: no products found");
        return Ok(());
    }

    let csv_path = output::store_path(&config.output_dir, store_id, "csv");
    let json_path = output::store_path(&config.output_dir, store_id, "json");
    output::write_csv(&csv_path, &products)?;
    output::write_json(&json_path, &products)?;

    println!(
        "store {store_id}: {} products written to {} and {}",
        products.len(),
        csv_path.display(),
        json_path.display()
    );
    Ok(())
}

/// Searches the storefront and prints one line per hit.
///
/// # Errors
///
/// Returns an error if the client cannot be built.
pub(crate) async fn run_search_command(
    config: &AppConfig,
    query: &str,
    max: usize,
) -> anyhow::Result<()> {
    let client = build_storefront_client(config)?;
    let hits = client.search_products(query, max).await;

    for hit in &hits {
        println!(
            "{}\t{}\t{}",
            hit.item_id,
            hit.name.as_deref().unwrap_or("-"),
            hit.product_url
        );
    }
    println!("{} results for \"{query}\"", hits.len());
    Ok(())
}

/// Fetches and parses one product page and writes the record as JSON.
///
/// # Errors
///
/// Returns an error if the client cannot be built or the output cannot be
/// written.
pub(crate) async fn run_product_command(
    config: &AppConfig,
    item_id: &str,
    store: Option<u32>,
) -> anyhow::Result<()> {
    let client = build_storefront_client(config)?;

    let Some(product) = client.fetch_product_page(item_id, store).await else {
        println!("product {item_id}: page could not be fetched");
        return Ok(());
    };
    if product.is_empty() {
        tracing::warn!(item_id, "page fetched but no product data recognised");
    }

    let path = output::product_path(&config.output_dir, item_id);
    output::write_json(&path, &product)?;
    println!("product {item_id}: written to {}", path.display());
    Ok(())
}

/// Writes the decoded `__NEXT_DATA__` of a product page for inspection.
///
/// # Errors
///
/// Returns an error if the client cannot be built or the output cannot be
/// written.
pub(crate) async fn run_next_data_command(
    config: &AppConfig,
    item_id: &str,
    store: Option<u32>,
) -> anyhow::Result<()> {
    let client = build_storefront_client(config)?;

    let Some(data) = client.fetch_next_data(item_id, store).await else {
        println!("product {item_id}: no __NEXT_DATA__ found");
        return Ok(());
    };

    let path = output::next_data_path(&config.output_dir, item_id);
    output::write_json(&path, &data)?;
    println!("product {item_id}: page data written to {}", path.display());
    Ok(())
}
