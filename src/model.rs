use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::format::format_duration;
use crate::path::extract_domain;

/// Canonical recipe record produced by extraction
///
/// `instructions` is always flat narrative text and `ingredients` keeps source order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct NormalizedRecipe {
    pub title: String,
    pub description: String,
    pub ingredients: Vec<String>,
    pub instructions: Vec<String>,
    pub image_url: Option<String>,
    /// Total time token exactly as published, e.g. `PT1H30M`
    pub duration_raw: Option<String>,
    pub source_url: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub recipe_yield: Option<String>,
    #[serde(default)]
    pub prep_time_raw: Option<String>,
    #[serde(default)]
    pub cook_time_raw: Option<String>,
    #[serde(default)]
    pub rating: Option<Rating>,
    /// Cook's notes published alongside the method
    #[serde(default)]
    pub tips: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub value: f64,
    pub count: Option<u64>,
}

impl NormalizedRecipe {
    /// Human-readable total time, empty when absent or unreadable
    pub fn duration(&self) -> String {
        format_duration(self.duration_raw.as_deref())
    }

    pub fn prep_time(&self) -> String {
        format_duration(self.prep_time_raw.as_deref())
    }

    pub fn cook_time(&self) -> String {
        format_duration(self.cook_time_raw.as_deref())
    }

    pub fn source_domain(&self) -> Option<String> {
        extract_domain(&self.source_url)
    }
}

/// A cached recipe, replaced wholesale on every write
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: String,
    pub recipe: NormalizedRecipe,
    pub stored_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(key: impl Into<String>, recipe: NormalizedRecipe) -> Self {
        Self {
            key: key.into(),
            recipe,
            stored_at: Utc::now(),
        }
    }
}
