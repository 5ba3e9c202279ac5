//! The full catalog run: listing, hydration, discovery, merge.

use std::collections::{HashMap, HashSet};

use shelfscan_core::{CatalogRecord, ProductDetail, ProductSummary};

use crate::catalog::CatalogClient;
use crate::discovery::{discover_and_fetch_by_category, DiscoveryOutcome};
use crate::error::ScraperError;
use crate::normalize::extract_category_keys;

/// What one catalog run produced, plus what it had to give up.
#[derive(Debug, Clone)]
pub struct CatalogRun {
    /// One row per distinct SKU, listing products first.
    pub records: Vec<CatalogRecord>,
    pub listing_count: usize,
    pub discovered_count: usize,
    pub dropped_pages: Vec<u32>,
    pub discovery_iterations: usize,
    pub hit_discovery_ceiling: bool,
}

/// Runs the full catalog pipeline against `client`.
///
/// 1. Fetch every listing page.
/// 2. Hydrate each listed product.
/// 3. Seed discovery with the category keys of those details plus
///    `extra_seeds`, treating every listed SKU as already seen.
/// 4. Merge listing and discovered products with their details, first
///    occurrence of a SKU kept.
///
/// Details hydrated during discovery are reused, not fetched again.
///
/// # Errors
///
/// Only the listing's initial count request can fail the run.
pub async fn run_catalog(
    client: &CatalogClient,
    extra_seeds: &[String],
) -> Result<CatalogRun, ScraperError> {
    let listing = client.fetch_all_pages().await?;
    tracing::info!(count = listing.products.len(), "listing fetched, hydrating");

    let mut details = Vec::with_capacity(listing.products.len());
    for product in &listing.products {
        details.push(client.fetch_detail(&product.id).await);
    }

    let mut seed_keys = extract_category_keys(&details);
    seed_keys.extend(extra_seeds.iter().cloned());
    tracing::info!(categories = seed_keys.len(), "seed categories from listing details");

    let mut seen: HashSet<String> = listing.products.iter().map(|p| p.id.clone()).collect();
    let discovery = discover_and_fetch_by_category(
        client,
        seed_keys,
        &mut seen,
        client.settings().max_discovery_iterations,
    )
    .await;

    let listing_count = listing.products.len();
    let discovered_count = discovery.products.len();
    let discovery_iterations = discovery.iterations;
    let hit_discovery_ceiling = discovery.hit_ceiling;

    let records = merge_records(listing.products, details, discovery);
    tracing::info!(total = records.len(), "catalog run complete");

    Ok(CatalogRun {
        records,
        listing_count,
        discovered_count,
        dropped_pages: listing.dropped_pages,
        discovery_iterations,
        hit_discovery_ceiling,
    })
}

/// Left-joins listing and discovered products with their details, keeping
/// the first row per SKU.
#[must_use]
pub fn merge_records(
    listing: Vec<ProductSummary>,
    listing_details: Vec<ProductDetail>,
    discovery: DiscoveryOutcome,
) -> Vec<CatalogRecord> {
    let details: HashMap<String, ProductDetail> = listing_details
        .into_iter()
        .chain(discovery.details)
        .map(|d| (d.id.clone(), d))
        .rev()
        .collect();

    let mut seen = HashSet::new();
    listing
        .into_iter()
        .chain(discovery.products)
        .filter(|p| seen.insert(p.id.clone()))
        .map(|p| {
            let detail = details.get(&p.id);
            CatalogRecord::merge(p, detail)
        })
        .collect()
}
