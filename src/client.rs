use async_trait::async_trait;
use log::info;
use std::time::Duration;

use crate::config::FetchConfig;
use crate::error::RecipeError;
use crate::extractors::extract_recipe;
use crate::fetchers::RequestFetcher;
use crate::model::NormalizedRecipe;
use crate::retry::RetryPolicy;

/// Something that can turn a URL into a normalized recipe in a single attempt
#[async_trait]
pub trait RecipeSource: Send + Sync {
    async fn fetch_recipe(&self, url: &str) -> Result<NormalizedRecipe, RecipeError>;
}

/// Fetches the page over HTTP and runs the extractors on it
pub struct HttpRecipeSource {
    fetcher: RequestFetcher,
}

impl HttpRecipeSource {
    pub fn new(config: &FetchConfig) -> Result<Self, RecipeError> {
        let fetcher = RequestFetcher::new(
            Some(Duration::from_secs(config.timeout)),
            &config.user_agent,
        )?;
        Ok(Self { fetcher })
    }
}

#[async_trait]
impl RecipeSource for HttpRecipeSource {
    async fn fetch_recipe(&self, url: &str) -> Result<NormalizedRecipe, RecipeError> {
        let html = self.fetcher.fetch(url).await?;
        extract_recipe(url, &html)
    }
}

/// Wraps a [`RecipeSource`] with bounded retry on transient fetch failures
///
/// Parse failures and pages without structured data are data-shape problems and are
/// surfaced on the first attempt.
pub struct RetryingClient<S> {
    source: S,
    policy: RetryPolicy,
}

impl<S: RecipeSource> RetryingClient<S> {
    pub fn new(source: S, policy: RetryPolicy) -> Self {
        Self { source, policy }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }
}

#[async_trait]
impl<S: RecipeSource> RecipeSource for RetryingClient<S> {
    async fn fetch_recipe(&self, url: &str) -> Result<NormalizedRecipe, RecipeError> {
        let label = format!("Fetching {url}");
        let recipe = self
            .policy
            .run(
                &label,
                |_| self.source.fetch_recipe(url),
                RecipeError::is_transient,
            )
            .await?;
        info!("Extracted '{}' from {}", recipe.title, url);
        Ok(recipe)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tokio::time::Instant;

    struct ScriptedSource {
        outcomes: Mutex<VecDeque<Result<NormalizedRecipe, RecipeError>>>,
        calls: AtomicUsize,
    }

    impl ScriptedSource {
        fn new(outcomes: Vec<Result<NormalizedRecipe, RecipeError>>) -> Self {
            Self {
                outcomes: Mutex::new(outcomes.into()),
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RecipeSource for ScriptedSource {
        async fn fetch_recipe(&self, url: &str) -> Result<NormalizedRecipe, RecipeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.outcomes
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(RecipeError::fetch(url, "request", "script exhausted")))
        }
    }

    fn network_error(reason: &str) -> Result<NormalizedRecipe, RecipeError> {
        Err(RecipeError::fetch("https://example.com/r", "request", reason))
    }

    fn recipe() -> NormalizedRecipe {
        NormalizedRecipe {
            title: "Flaky Bread".to_string(),
            source_url: "https://example.com/r".to_string(),
            ..Default::default()
        }
    }

    fn policy() -> RetryPolicy {
        RetryPolicy::new(3, Duration::from_secs(1), 2.0)
    }

    #[tokio::test(start_paused = true)]
    async fn test_two_network_failures_then_success() {
        let source = ScriptedSource::new(vec![
            network_error("reset"),
            network_error("reset"),
            Ok(recipe()),
        ]);
        let client = RetryingClient::new(source, policy());
        let start = Instant::now();

        let result = client.fetch_recipe("https://example.com/r").await.unwrap();

        assert_eq!(result.title, "Flaky Bread");
        assert_eq!(client.source().calls(), 3);
        assert_eq!(start.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_parse_error_is_not_retried() {
        let source = ScriptedSource::new(vec![
            Err(RecipeError::parse("https://example.com/r", "json-ld", "bad")),
            Ok(recipe()),
        ]);
        let client = RetryingClient::new(source, policy());
        let start = Instant::now();

        let result = client.fetch_recipe("https://example.com/r").await;

        assert!(matches!(result, Err(RecipeError::ParseError { .. })));
        assert_eq!(client.source().calls(), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_structured_data_is_not_retried() {
        let source = ScriptedSource::new(vec![Err(RecipeError::NoStructuredData {
            url: "https://example.com/r".to_string(),
        })]);
        let client = RetryingClient::new(source, policy());

        let result = client.fetch_recipe("https://example.com/r").await;

        assert!(matches!(result, Err(RecipeError::NoStructuredData { .. })));
        assert_eq!(client.source().calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_not_found_status_is_not_retried() {
        let source = ScriptedSource::new(vec![Err(RecipeError::FetchError {
            url: "https://example.com/r".to_string(),
            stage: "status",
            status: Some(404),
            reason: "HTTP 404 Not Found".to_string(),
        })]);
        let client = RetryingClient::new(source, policy());

        let result = client.fetch_recipe("https://example.com/r").await;

        assert!(matches!(result, Err(RecipeError::FetchError { status: Some(404), .. })));
        assert_eq!(client.source().calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_returns_last_fetch_error() {
        let source = ScriptedSource::new(vec![
            network_error("first"),
            network_error("second"),
            network_error("third"),
            Ok(recipe()),
        ]);
        let client = RetryingClient::new(source, policy());

        let result = client.fetch_recipe("https://example.com/r").await;

        match result {
            Err(RecipeError::FetchError { reason, .. }) => assert_eq!(reason, "third"),
            other => panic!("expected fetch error, got {other:?}"),
        }
        assert_eq!(client.source().calls(), 3);
    }
}
