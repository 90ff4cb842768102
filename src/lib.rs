//! Recipe page ingestion with a resilient cache.
//!
//! Pages are fetched with bounded retry, the embedded JSON-LD (or page-state) recipe is
//! normalized into a [`NormalizedRecipe`], and results are cached under a key derived
//! from the source URL. The cache prefers Redis and falls back to memory.
//!
//! ```no_run
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = nyetcooking::AppConfig::load()?;
//! let service = nyetcooking::RecipeService::from_config(&config).await?;
//! let markdown = service.markdown_for_path("example.com/recipes/pie", false).await?;
//! println!("{markdown}");
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod extractors;
pub mod fetchers;
pub mod format;
pub mod markdown;
pub mod model;
pub mod path;
pub mod retry;
pub mod service;

pub use cache::CacheManager;
pub use client::{HttpRecipeSource, RecipeSource, RetryingClient};
pub use config::AppConfig;
pub use error::RecipeError;
pub use extractors::extract_recipe;
pub use markdown::recipe_to_markdown;
pub use model::{CacheEntry, NormalizedRecipe, Rating};
pub use retry::RetryPolicy;
pub use service::{HealthReport, RecipeService};

/// Fetch and normalize a single recipe with default settings, bypassing the cache
pub async fn fetch_recipe(url: &str) -> Result<NormalizedRecipe, RecipeError> {
    let config = AppConfig::default();
    let source = HttpRecipeSource::new(&config.fetch)?;
    RetryingClient::new(source, config.retry.policy())
        .fetch_recipe(url)
        .await
}
