use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::time::Duration;

use crate::retry::RetryPolicy;

/// Main application configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    /// Networked cache store settings
    #[serde(default)]
    pub cache: CacheConfig,
    /// Outbound page fetch settings
    #[serde(default)]
    pub fetch: FetchConfig,
    /// Retry policy for outbound fetches
    #[serde(default)]
    pub retry: RetryConfig,
}

/// Configuration for the Redis store
///
/// Leaving `host` or `port` unset selects the in-process store with no connection attempt.
#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    /// Prefix prepended to every key written to Redis
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
    /// Timeout for a single connection attempt in milliseconds
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// Retry policy for the startup connection
    #[serde(default)]
    pub connect_retry: RetryConfig,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            host: None,
            port: None,
            key_prefix: default_key_prefix(),
            connect_timeout_ms: default_connect_timeout_ms(),
            connect_retry: RetryConfig::default(),
        }
    }
}

impl CacheConfig {
    /// Host and port, when both are configured
    pub fn endpoint(&self) -> Option<(&str, u16)> {
        match (self.host.as_deref(), self.port) {
            (Some(host), Some(port)) if !host.trim().is_empty() => Some((host.trim(), port)),
            _ => None,
        }
    }
}

/// Configuration for page fetching
#[derive(Debug, Deserialize, Clone)]
pub struct FetchConfig {
    /// Per-request HTTP timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    /// Overall budget for one pipeline request, retries included, in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            request_timeout: default_request_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

/// Bounded retry with exponential backoff
#[derive(Debug, Deserialize, Clone)]
pub struct RetryConfig {
    /// Total number of attempts, the first one included
    #[serde(default = "default_retry_attempts")]
    pub max_attempts: u32,
    /// Delay before the second attempt in milliseconds
    #[serde(default = "default_retry_delay_ms")]
    pub base_delay_ms: u64,
    /// Factor applied to the delay after every failed attempt
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_retry_attempts(),
            base_delay_ms: default_retry_delay_ms(),
            multiplier: default_multiplier(),
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_attempts,
            Duration::from_millis(self.base_delay_ms),
            self.multiplier,
        )
    }
}

// Default value functions
fn default_key_prefix() -> String {
    "recipe:".to_string()
}

fn default_connect_timeout_ms() -> u64 {
    2000
}

fn default_timeout() -> u64 {
    30
}

fn default_request_timeout() -> u64 {
    60
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string()
}

fn default_retry_attempts() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    1000
}

fn default_multiplier() -> f64 {
    2.0
}

impl AppConfig {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded with the following priority (highest to lowest):
    /// 1. REDIS_HOST / REDIS_PORT
    /// 2. Environment variables with NYETCOOKING__ prefix
    /// 3. nyetcooking.toml file in current directory
    /// 4. Default values
    ///
    /// Environment variable format: NYETCOOKING__CACHE__HOST
    pub fn load() -> Result<Self, ConfigError> {
        load_config()
    }
}

/// Load configuration from file and environment variables
///
/// See [`AppConfig::load`] for the source priority.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    let settings = Config::builder()
        // Optional config file (can be missing)
        .add_source(File::with_name("nyetcooking").required(false))
        .add_source(
            Environment::with_prefix("NYETCOOKING")
                .separator("__")
                .try_parsing(true),
        )
        .set_override_option("cache.host", env::var("REDIS_HOST").ok())?
        .set_override_option("cache.port", env::var("REDIS_PORT").ok())?
        .build()?;

    settings.try_deserialize()
}
