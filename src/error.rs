use thiserror::Error;

/// Errors surfaced by the ingestion pipeline
///
/// Every request-time variant carries the source URL and the stage that failed so the
/// router layer can render a useful message.
#[derive(Error, Debug)]
pub enum RecipeError {
    /// The input could not be turned into a URL with a host
    #[error("Invalid URL '{input}': {reason}")]
    InvalidUrl { input: String, reason: String },

    /// Network, timeout or HTTP status failure while fetching the page
    #[error("Failed to fetch {url} ({stage}): {reason}")]
    FetchError {
        url: String,
        stage: &'static str,
        status: Option<u16>,
        reason: String,
    },

    /// Neither a JSON-LD recipe nor the page-state fallback was found
    #[error("No structured recipe data found at {url}")]
    NoStructuredData { url: String },

    /// Structured data was found but could not be read
    #[error("Failed to parse recipe from {url} ({stage}): {reason}")]
    ParseError {
        url: String,
        stage: &'static str,
        reason: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(#[from] config::ConfigError),
}

impl RecipeError {
    pub(crate) fn fetch(url: &str, stage: &'static str, err: impl std::fmt::Display) -> Self {
        RecipeError::FetchError {
            url: url.to_string(),
            stage,
            status: None,
            reason: err.to_string(),
        }
    }

    pub(crate) fn parse(url: &str, stage: &'static str, err: impl std::fmt::Display) -> Self {
        RecipeError::ParseError {
            url: url.to_string(),
            stage,
            reason: err.to_string(),
        }
    }

    /// Whether retrying the same request could plausibly succeed.
    ///
    /// Connection, DNS, timeout and body-read failures carry no status and are transient,
    /// as are 408, 429 and 5xx responses. Everything else is a permanent failure.
    pub fn is_transient(&self) -> bool {
        match self {
            RecipeError::FetchError { status: None, .. } => true,
            RecipeError::FetchError {
                status: Some(code), ..
            } => *code == 408 || *code == 429 || *code >= 500,
            _ => false,
        }
    }

    /// Source URL attached to the error, if any
    pub fn url(&self) -> Option<&str> {
        match self {
            RecipeError::InvalidUrl { input, .. } => Some(input),
            RecipeError::FetchError { url, .. }
            | RecipeError::NoStructuredData { url }
            | RecipeError::ParseError { url, .. } => Some(url),
            RecipeError::ConfigError(_) => None,
        }
    }
}
