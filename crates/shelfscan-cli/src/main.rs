mod catalog;
mod output;
mod storefront;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "shelfscan")]
#[command(about = "Grocery catalog and storefront scraper")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Fetch the full catalog, hydrate details, discover by category, and
    /// write the merged records as JSON
    Catalog {
        /// Extra category keys to seed discovery with, as a list literal
        /// such as `["12", "34"]`
        #[arg(long)]
        seed_categories: Option<String>,
    },
    /// Fetch one product's detail record and print it
    Detail {
        /// Catalog SKU
        id: String,
    },
    /// Sweep common search terms at the configured store and write CSV and JSON
    Store,
    /// Search the storefront and print the hits
    Search {
        query: String,

        /// Stop after this many hits
        #[arg(long, default_value_t = 50)]
        max: usize,
    },
    /// Fetch and parse one storefront product page
    Product {
        /// Storefront item id
        id: String,

        /// Scope the page to a store
        #[arg(long)]
        store: Option<u32>,
    },
    /// Dump the decoded `__NEXT_DATA__` blob of a product page
    NextData {
        /// Storefront item id
        id: String,

        /// Scope the page to a store
        #[arg(long)]
        store: Option<u32>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = shelfscan_core::load_app_config()?;

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Catalog { seed_categories } => {
            catalog::run_catalog_command(&config, seed_categories.as_deref()).await
        }
        Commands::Detail { id } => catalog::run_detail_command(&config, &id).await,
        Commands::Store => storefront::run_store_command(&config).await,
        Commands::Search { query, max } => {
            storefront::run_search_command(&config, &query, max).await
        }
        Commands::Product { id, store } => {
            storefront::run_product_command(&config, &id, store).await
        }
        Commands::NextData { id, store } => {
            storefront::run_next_data_command(&config, &id, store).await
        }
    }
}
