//! Catalog API command handlers.

use shelfscan_core::AppConfig;
use shelfscan_scraper::{run_catalog, try_parse_key_list, CatalogClient};

use crate::output;

pub(crate) fn build_catalog_client(config: &AppConfig) -> anyhow::Result<CatalogClient> {
    CatalogClient::new(&config.catalog, config.retry, &config.user_agent)
        .map_err(|e| anyhow::anyhow!("failed to build catalog client: {e}"))
}

/// Parses the `--seed-categories` value.
///
/// # Errors
///
/// Returns an error when `raw` is not a list literal.
pub(crate) fn parse_seed_categories(raw: Option<&str>) -> anyhow::Result<Vec<String>> {
    match raw {
        None => Ok(Vec::new()),
        Some(raw) => try_parse_key_list(raw)
            .ok_or_else(|| anyhow::anyhow!("--seed-categories is not a key list: {raw}")),
    }
}

/// Runs the full catalog pipeline and writes the merged records.
///
/// # Errors
///
/// Returns an error if the seed list is malformed, the client cannot be
/// built, the listing count request fails, or the output cannot be written.
/// Dropped pages and the discovery ceiling are reported, not propagated.
pub(crate) async fn run_catalog_command(
    config: &AppConfig,
    seed_categories: Option<&str>,
) -> anyhow::Result<()> {
    let extra_seeds = parse_seed_categories(seed_categories)?;
    let client = build_catalog_client(config)?;

    let run = run_catalog(&client, &extra_seeds).await?;

    if !run.dropped_pages.is_empty() {
        eprintln!(
            "warning: {} listing pages dropped after retries: {:?}",
            run.dropped_pages.len(),
            run.dropped_pages
        );
    }
    if run.hit_discovery_ceiling {
        eprintln!(
            "warning: category discovery stopped at {} iterations with keys still queued",
            run.discovery_iterations
        );
    }

    let path = output::catalog_path(&config.output_dir);
    output::write_json(&path, &run.records)?;

    println!(
        "catalog: {} listed, {} discovered, {} written to {}",
        run.listing_count,
        run.discovered_count,
        run.records.len(),
        path.display()
    );
    Ok(())
}

/// Fetches one detail record and prints it as JSON.
///
/// # Errors
///
/// Returns an error if the client cannot be built. A failed fetch prints
/// the placeholder record.
pub(crate) async fn run_detail_command(config: &AppConfig, id: &str) -> anyhow::Result<()> {
    let client = build_catalog_client(config)?;
    let detail = client.fetch_detail(id).await;
    println!("{}", serde_json::to_string_pretty(&detail)?);
    Ok(())
}
