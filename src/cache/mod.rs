//! Recipe cache with a Redis store and an in-process fallback.
//!
//! ```text
//! CacheManager
//!   └── CacheBackend (enum, fixed at construction)
//!         ├── Redis(RedisStore)    <- chosen when Redis answers PING at startup
//!         └── Memory(MemoryStore)  <- no Redis configured, or Redis never came up
//! ```
//!
//! Once the manager has fallen back to memory it stays there until the process restarts.
//! Backend errors at request time are logged and treated as a miss or a no-op.

use async_trait::async_trait;
use std::collections::BTreeSet;
use thiserror::Error;

mod manager;
mod memory;
mod redis_store;

pub use manager::{CacheBackend, CacheManager};
pub use memory::MemoryStore;
pub use redis_store::RedisStore;

/// Internal cache failures; never surfaced to callers of [`CacheManager`]
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache backend error: {0}")]
    Backend(#[from] redis::RedisError),

    #[error("Corrupt cache entry '{key}': {reason}")]
    Corrupt { key: String, reason: String },

    #[error("Cache serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Raw key-value contract shared by both stores
///
/// Every operation is a single atomic store primitive; callers never build
/// read-modify-write sequences on top of it.
#[async_trait]
pub trait RecipeStore: Send + Sync {
    async fn get_raw(&self, key: &str) -> Result<Option<String>, CacheError>;
    async fn set_raw(&self, key: &str, value: String) -> Result<(), CacheError>;
    /// Removing an absent key is not an error
    async fn delete(&self, key: &str) -> Result<(), CacheError>;
    async fn keys(&self) -> Result<BTreeSet<String>, CacheError>;
}
