//! Breadth-first category discovery.
//!
//! Starting from a seed set of category keys, each iteration fetches the
//! listing for every pending key, hydrates the products it has not seen
//! yet, and queues any category key those details mention that has not
//! been discovered before. The walk ends at a fixed point (an iteration
//! that discovers nothing) or at the iteration ceiling. Nothing proves the
//! category graph converges under the ceiling, so reaching it is logged at
//! `warn` and reported in [`DiscoveryOutcome::hit_ceiling`].

use std::collections::{BTreeSet, HashSet};
use std::future::Future;

use shelfscan_core::{is_valid_category_key, ProductDetail, ProductSummary};

use crate::catalog::CatalogClient;

/// The two catalog operations discovery needs.
pub trait CatalogSource {
    /// Products listed under `category_key`. Failures yield a shorter or
    /// empty list.
    fn fetch_by_category(&self, category_key: &str) -> impl Future<Output = Vec<ProductSummary>>;

    /// Detail for `id`. Failures yield [`ProductDetail::placeholder`].
    fn fetch_detail(&self, id: &str) -> impl Future<Output = ProductDetail>;
}

impl CatalogSource for CatalogClient {
    async fn fetch_by_category(&self, category_key: &str) -> Vec<ProductSummary> {
        CatalogClient::fetch_by_category(self, category_key).await
    }

    async fn fetch_detail(&self, id: &str) -> ProductDetail {
        CatalogClient::fetch_detail(self, id).await
    }
}

/// Category keys known to one discovery run.
///
/// `fetched` is always a subset of `discovered`, and `to_fetch` never
/// holds a fetched key at the start of an iteration. Blank keys are never
/// admitted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveryFrontier {
    discovered: BTreeSet<String>,
    fetched: BTreeSet<String>,
    to_fetch: BTreeSet<String>,
}

impl DiscoveryFrontier {
    /// Seeds `discovered` and `to_fetch` with the non-blank `keys`.
    pub fn new<I>(keys: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let discovered: BTreeSet<String> = keys
            .into_iter()
            .filter(|k| is_valid_category_key(k))
            .collect();
        Self {
            to_fetch: discovered.clone(),
            discovered,
            fetched: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn discovered(&self) -> &BTreeSet<String> {
        &self.discovered
    }

    #[must_use]
    pub fn fetched(&self) -> &BTreeSet<String> {
        &self.fetched
    }

    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.to_fetch.is_empty()
    }

    /// Empties `to_fetch` and returns its contents as the next batch.
    pub fn take_batch(&mut self) -> Vec<String> {
        std::mem::take(&mut self.to_fetch).into_iter().collect()
    }

    /// Marks `key` fetched. Returns `false` if it already was.
    pub fn mark_fetched(&mut self, key: &str) -> bool {
        self.fetched.insert(key.to_owned())
    }

    /// `true` when `key` may be queued: non-blank, neither discovered nor
    /// fetched.
    #[must_use]
    pub fn is_new(&self, key: &str) -> bool {
        is_valid_category_key(key) && !self.discovered.contains(key) && !self.fetched.contains(key)
    }

    /// Records `new_keys` as discovered and queues them for the next
    /// iteration. Returns `false` when nothing new was queued.
    pub fn advance(&mut self, new_keys: BTreeSet<String>) -> bool {
        for key in new_keys {
            if self.is_new(&key) {
                self.discovered.insert(key.clone());
                self.to_fetch.insert(key);
            }
        }
        self.has_pending()
    }
}

/// Result of [`discover_and_fetch_by_category`].
#[derive(Debug, Clone, Default)]
pub struct DiscoveryOutcome {
    /// Category-sourced products not in the caller's seen set, first
    /// occurrence kept.
    pub products: Vec<ProductSummary>,
    /// Details hydrated for `products`, in the same order.
    pub details: Vec<ProductDetail>,
    pub frontier: DiscoveryFrontier,
    pub iterations: usize,
    /// `true` when the walk stopped at `max_iterations` with keys still
    /// queued.
    pub hit_ceiling: bool,
}

/// Walks the category graph from `initial_keys`.
///
/// `seen_ids` is the run-wide set of product ids; it grows with every
/// product this call returns and is never shrunk. Products already in it
/// are neither returned nor hydrated.
pub async fn discover_and_fetch_by_category<S, I>(
    source: &S,
    initial_keys: I,
    seen_ids: &mut HashSet<String>,
    max_iterations: usize,
) -> DiscoveryOutcome
where
    S: CatalogSource,
    I: IntoIterator<Item = String>,
{
    let mut frontier = DiscoveryFrontier::new(initial_keys);
    let mut products = Vec::new();
    let mut details = Vec::new();
    let mut iterations = 0;

    tracing::info!(
        seed_categories = frontier.discovered().len(),
        "starting category discovery"
    );

    while frontier.has_pending() && iterations < max_iterations {
        iterations += 1;
        let batch = frontier.take_batch();
        tracing::info!(iteration = iterations, categories = batch.len(), "discovery iteration");

        let mut new_keys = BTreeSet::new();
        for category_key in batch {
            if !frontier.mark_fetched(&category_key) {
                continue;
            }

            let listed = source.fetch_by_category(&category_key).await;
            let fresh: Vec<ProductSummary> = listed
                .into_iter()
                .filter(|p| seen_ids.insert(p.id.clone()))
                .collect();
            tracing::debug!(
                category_key = %category_key,
                new_products = fresh.len(),
                "category fetched"
            );

            for product in fresh {
                let detail = source.fetch_detail(&product.id).await;
                new_keys.extend(
                    detail
                        .category_keys
                        .iter()
                        .filter(|k| frontier.is_new(k))
                        .cloned(),
                );
                products.push(product);
                details.push(detail);
            }
        }

        if new_keys.is_empty() {
            tracing::info!(iteration = iterations, "no new categories, discovery converged");
            break;
        }
        tracing::info!(
            iteration = iterations,
            new_categories = new_keys.len(),
            "discovered new categories"
        );
        frontier.advance(new_keys);
    }

    let hit_ceiling = frontier.has_pending();
    if hit_ceiling {
        tracing::warn!(
            max_iterations,
            pending = frontier.to_fetch.len(),
            "category discovery stopped at iteration ceiling before converging"
        );
    }

    DiscoveryOutcome {
        products,
        details,
        frontier,
        iterations,
        hit_ceiling,
    }
}

#[cfg(test)]
#[path = "discovery_test.rs"]
mod tests;
