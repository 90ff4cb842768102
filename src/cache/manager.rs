use log::{debug, info, warn};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeSet;

use super::{CacheError, MemoryStore, RecipeStore, RedisStore};
use crate::config::CacheConfig;
use crate::extractors::schema::JsonLdRecipe;
use crate::model::{CacheEntry, NormalizedRecipe};
use crate::path::to_url;

/// Store selected when the manager was built
pub enum CacheBackend {
    Redis(RedisStore),
    Memory(MemoryStore),
}

impl CacheBackend {
    fn store(&self) -> &dyn RecipeStore {
        match self {
            CacheBackend::Redis(store) => store,
            CacheBackend::Memory(store) => store,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            CacheBackend::Redis(_) => "redis",
            CacheBackend::Memory(_) => "memory",
        }
    }
}

/// Payload written by earlier releases: the raw JSON-LD object plus the URL it came from
#[derive(Deserialize)]
struct LegacyEntry {
    recipe: Value,
    original_url: Option<String>,
}

enum Decoded {
    Current(CacheEntry),
    Migrated(CacheEntry),
}

/// Cache facade used by the service; never fails a request
pub struct CacheManager {
    backend: CacheBackend,
}

impl CacheManager {
    /// Pick a store once: Redis when configured and reachable, memory otherwise
    pub async fn connect(config: &CacheConfig) -> Self {
        let Some((host, port)) = config.endpoint() else {
            info!("No Redis configured, using in-process cache");
            return Self::in_memory();
        };

        match RedisStore::connect(host, port, config).await {
            Ok(store) => Self::from_backend(CacheBackend::Redis(store)),
            Err(e) => {
                warn!("Redis at {} unavailable, falling back to in-process cache: {}", host, e);
                Self::in_memory()
            }
        }
    }

    pub fn in_memory() -> Self {
        Self::from_backend(CacheBackend::Memory(MemoryStore::new()))
    }

    pub fn from_backend(backend: CacheBackend) -> Self {
        Self { backend }
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Look up an entry; backend errors and corrupt payloads read as a miss
    pub async fn get(&self, key: &str) -> Option<CacheEntry> {
        let raw = match self.backend.store().get_raw(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!("Cache miss for {}", key);
                return None;
            }
            Err(e) => {
                warn!("Cache read failed for {}: {}", key, e);
                return None;
            }
        };

        match decode_entry(key, &raw) {
            Ok(Decoded::Current(entry)) => {
                debug!("Cache hit for {}", key);
                Some(entry)
            }
            Ok(Decoded::Migrated(entry)) => {
                info!("Migrated legacy cache entry for {}", key);
                self.write(&entry).await;
                Some(entry)
            }
            Err(e) => {
                warn!("Dropping unreadable cache entry: {}", e);
                self.delete(key).await;
                None
            }
        }
    }

    pub async fn get_recipe(&self, key: &str) -> Option<NormalizedRecipe> {
        self.get(key).await.map(|entry| entry.recipe)
    }

    /// Replace the entry for `key` wholesale
    pub async fn set(&self, key: &str, recipe: &NormalizedRecipe) {
        self.write(&CacheEntry::new(key, recipe.clone())).await;
    }

    pub async fn delete(&self, key: &str) {
        if let Err(e) = self.backend.store().delete(key).await {
            warn!("Cache delete failed for {}: {}", key, e);
        }
    }

    pub async fn keys(&self) -> BTreeSet<String> {
        self.backend.store().keys().await.unwrap_or_else(|e| {
            warn!("Cache key listing failed: {}", e);
            BTreeSet::new()
        })
    }

    async fn write(&self, entry: &CacheEntry) {
        let result = match serde_json::to_string(entry) {
            Ok(raw) => self.backend.store().set_raw(&entry.key, raw).await,
            Err(e) => Err(CacheError::from(e)),
        };
        if let Err(e) = result {
            warn!("Cache write failed for {}: {}", entry.key, e);
        }
    }
}

fn decode_entry(key: &str, raw: &str) -> Result<Decoded, CacheError> {
    let corrupt = |reason: String| CacheError::Corrupt {
        key: key.to_string(),
        reason,
    };

    let value: Value = serde_json::from_str(raw).map_err(|e| corrupt(e.to_string()))?;

    let current_err = match serde_json::from_value::<CacheEntry>(value.clone()) {
        Ok(entry) => return Ok(Decoded::Current(entry)),
        Err(e) => e,
    };

    let legacy = match serde_json::from_value::<LegacyEntry>(value) {
        Ok(legacy) if looks_like_recipe(&legacy.recipe) => legacy,
        _ => return Err(corrupt(current_err.to_string())),
    };

    let url = legacy.original_url.unwrap_or_else(|| to_url(key));
    let recipe = JsonLdRecipe::try_from(&legacy.recipe)
        .map_err(|e| corrupt(format!("legacy recipe: {e}")))?
        .normalize(&url);

    Ok(Decoded::Migrated(CacheEntry::new(key, recipe)))
}

fn looks_like_recipe(value: &Value) -> bool {
    value.as_object().is_some_and(|obj| {
        ["name", "recipeIngredient", "recipeInstructions"]
            .iter()
            .any(|field| obj.contains_key(*field))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn manager_with_store() -> (CacheManager, MemoryStore) {
        let store = MemoryStore::new();
        let manager = CacheManager::from_backend(CacheBackend::Memory(store.clone()));
        (manager, store)
    }

    fn recipe() -> NormalizedRecipe {
        NormalizedRecipe {
            title: "Shakshuka".to_string(),
            ingredients: vec!["6 eggs".to_string(), "1 can tomatoes".to_string()],
            instructions: vec!["Simmer.".to_string(), "Crack eggs.".to_string()],
            duration_raw: Some("PT40M".to_string()),
            source_url: "https://example.com/shakshuka".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_set_get_delete() {
        let (manager, _) = manager_with_store();
        assert_eq!(manager.backend_name(), "memory");

        manager.set("example.com/shakshuka", &recipe()).await;
        let entry = manager.get("example.com/shakshuka").await.unwrap();
        assert_eq!(entry.key, "example.com/shakshuka");
        assert_eq!(entry.recipe, recipe());
        assert_eq!(
            manager.keys().await.into_iter().collect::<Vec<_>>(),
            vec!["example.com/shakshuka".to_string()]
        );

        manager.delete("example.com/shakshuka").await;
        assert!(manager.get_recipe("example.com/shakshuka").await.is_none());
        manager.delete("example.com/shakshuka").await;
    }

    #[tokio::test]
    async fn test_set_replaces_entry() {
        let (manager, _) = manager_with_store();
        manager.set("k", &recipe()).await;

        let mut updated = recipe();
        updated.title = "Green Shakshuka".to_string();
        manager.set("k", &updated).await;

        assert_eq!(manager.get_recipe("k").await.unwrap().title, "Green Shakshuka");
    }

    #[tokio::test]
    async fn test_corrupt_entry_is_removed() {
        let (manager, store) = manager_with_store();
        store
            .set_raw("example.com/broken", "{not json".to_string())
            .await
            .unwrap();

        assert!(manager.get("example.com/broken").await.is_none());
        assert_eq!(store.get_raw("example.com/broken").await.unwrap(), None);
        assert!(manager.get("example.com/broken").await.is_none());
    }

    #[tokio::test]
    async fn test_wrong_shape_is_corrupt() {
        let (manager, store) = manager_with_store();
        store
            .set_raw("k", json!({"recipe": {"unrelated": true}}).to_string())
            .await
            .unwrap();

        assert!(manager.get("k").await.is_none());
        assert!(store.keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_legacy_entry_is_migrated() {
        let (manager, store) = manager_with_store();
        let legacy = json!({
            "recipe": {
                "@type": "Recipe",
                "name": "Old Cake",
                "recipeIngredient": ["flour", "sugar"],
                "recipeInstructions": [{"@type": "HowToStep", "text": "Bake."}],
                "totalTime": "PT1H"
            },
            "original_url": "https://www.example.com/old-cake"
        });
        store.set_raw("example.com/old-cake", legacy.to_string()).await.unwrap();

        let entry = manager.get("example.com/old-cake").await.unwrap();
        assert_eq!(entry.recipe.title, "Old Cake");
        assert_eq!(entry.recipe.instructions, vec!["Bake."]);
        assert_eq!(entry.recipe.source_url, "https://www.example.com/old-cake");
        assert_eq!(entry.recipe.duration(), "1 hour");

        // rewritten in the current layout
        let raw = store.get_raw("example.com/old-cake").await.unwrap().unwrap();
        let rewritten: CacheEntry = serde_json::from_str(&raw).unwrap();
        assert_eq!(rewritten.recipe, entry.recipe);
    }

    #[tokio::test]
    async fn test_legacy_entry_without_url_uses_key() {
        let (manager, store) = manager_with_store();
        store
            .set_raw("example.com/soup", json!({"recipe": {"name": "Soup"}}).to_string())
            .await
            .unwrap();

        let recipe = manager.get_recipe("example.com/soup").await.unwrap();
        assert_eq!(recipe.source_url, "https://example.com/soup");
    }

    #[tokio::test]
    async fn test_no_endpoint_uses_memory() {
        let manager = CacheManager::connect(&CacheConfig::default()).await;
        assert_eq!(manager.backend_name(), "memory");
    }
}
