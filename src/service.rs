use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::Serialize;
use std::time::Duration;
use tokio::time::Instant;

use crate::cache::CacheManager;
use crate::client::{HttpRecipeSource, RecipeSource, RetryingClient};
use crate::config::AppConfig;
use crate::error::RecipeError;
use crate::markdown::recipe_to_markdown;
use crate::model::NormalizedRecipe;
use crate::path::{has_scheme, resolve_segment, to_path, to_url, to_url_with_www};

/// Liveness payload for the health route
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    pub cache_backend: &'static str,
}

/// Request-facing facade: cache lookup, fetch with retry, cache fill
pub struct RecipeService<S> {
    cache: CacheManager,
    client: RetryingClient<S>,
    request_timeout: Duration,
}

impl RecipeService<HttpRecipeSource> {
    /// Build the HTTP-backed service and connect the cache
    pub async fn from_config(config: &AppConfig) -> Result<Self, RecipeError> {
        let source = HttpRecipeSource::new(&config.fetch)?;
        let client = RetryingClient::new(source, config.retry.policy());
        let cache = CacheManager::connect(&config.cache).await;
        Ok(Self::new(
            cache,
            client,
            Duration::from_secs(config.fetch.request_timeout),
        ))
    }
}

impl<S: RecipeSource> RecipeService<S> {
    pub fn new(cache: CacheManager, client: RetryingClient<S>, request_timeout: Duration) -> Self {
        Self {
            cache,
            client,
            request_timeout,
        }
    }

    pub fn cache(&self) -> &CacheManager {
        &self.cache
    }

    pub fn client(&self) -> &RetryingClient<S> {
        &self.client
    }

    /// Recipe for a route path segment such as `example.com/pie` or an NYT id
    pub async fn recipe_for_path(
        &self,
        segment: &str,
        refresh: bool,
    ) -> Result<NormalizedRecipe, RecipeError> {
        let key = to_path(&resolve_segment(segment))?;

        if let Some(recipe) = self.cached(&key, refresh).await {
            return Ok(recipe);
        }

        // both host candidates share one request budget
        let deadline = Instant::now() + self.request_timeout;
        let recipe = match self.fetch(&to_url(&key), deadline).await {
            Ok(recipe) => recipe,
            // keys never carry `www.`, so the alternate host is always a new candidate
            Err(err @ RecipeError::FetchError { .. }) => {
                let candidate = to_url_with_www(&key);
                warn!("{}; trying {}", err, candidate);
                self.fetch(&candidate, deadline).await?
            }
            Err(err) => return Err(err),
        };

        self.cache.set(&key, &recipe).await;
        Ok(recipe)
    }

    /// Recipe for a submitted URL, fetched exactly as given
    ///
    /// Returns the cache key alongside the recipe so callers can redirect to `/<key>`.
    pub async fn recipe_for_url(
        &self,
        url: &str,
        refresh: bool,
    ) -> Result<(String, NormalizedRecipe), RecipeError> {
        let key = to_path(url)?;

        if let Some(recipe) = self.cached(&key, refresh).await {
            return Ok((key, recipe));
        }

        let url = url.trim();
        let target = if has_scheme(url) {
            url.to_string()
        } else {
            format!("https://{url}")
        };

        let recipe = self
            .fetch(&target, Instant::now() + self.request_timeout)
            .await?;
        self.cache.set(&key, &recipe).await;
        Ok((key, recipe))
    }

    pub async fn markdown_for_path(&self, segment: &str, refresh: bool) -> Result<String, RecipeError> {
        let recipe = self.recipe_for_path(segment, refresh).await?;
        Ok(recipe_to_markdown(&recipe))
    }

    pub fn health(&self) -> HealthReport {
        HealthReport {
            status: "healthy",
            timestamp: Utc::now(),
            cache_backend: self.cache.backend_name(),
        }
    }

    async fn cached(&self, key: &str, refresh: bool) -> Option<NormalizedRecipe> {
        if refresh {
            debug!("Refresh requested for {}", key);
            self.cache.delete(key).await;
            return None;
        }
        self.cache.get_recipe(key).await
    }

    async fn fetch(&self, url: &str, deadline: Instant) -> Result<NormalizedRecipe, RecipeError> {
        match tokio::time::timeout_at(deadline, self.client.fetch_recipe(url)).await {
            Ok(result) => result,
            Err(_) => Err(RecipeError::fetch(
                url,
                "timeout",
                format!("no response within {:?}", self.request_timeout),
            )),
        }
    }
}
