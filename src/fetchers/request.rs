use log::debug;
use reqwest::Client;
use std::time::Duration;

use crate::error::RecipeError;

pub struct RequestFetcher {
    client: Client,
}

impl RequestFetcher {
    pub fn new(timeout: Option<Duration>, user_agent: &str) -> Result<Self, RecipeError> {
        let timeout = timeout.unwrap_or(Duration::from_secs(30));
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| RecipeError::fetch("", "client", e))?;

        Ok(Self { client })
    }

    /// Fetch the page body; any non-success status is a `FetchError` carrying the code
    pub async fn fetch(&self, url: &str) -> Result<String, RecipeError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            let stage = if e.is_timeout() { "timeout" } else { "request" };
            RecipeError::fetch(url, stage, e)
        })?;

        let status = response.status();
        debug!("GET {} -> {}", url, status);
        if !status.is_success() {
            return Err(RecipeError::FetchError {
                url: url.to_string(),
                stage: "status",
                status: Some(status.as_u16()),
                reason: format!("HTTP {status}"),
            });
        }

        response
            .text()
            .await
            .map_err(|e| RecipeError::fetch(url, "body", e))
    }
}
