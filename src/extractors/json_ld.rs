use super::schema::JsonLdRecipe;
use super::{Extractor, ParsingContext};
use crate::error::RecipeError;
use crate::model::NormalizedRecipe;
use log::debug;
use scraper::Selector;
use serde_json::Value;

pub struct JsonLdExtractor;

/// Containers that hold typed sub-objects, searched in this order
const CONTAINER_KEYS: [&str; 4] = ["@graph", "itemListElement", "mainEntity", "item"];

fn type_denotes_recipe(type_str: &str) -> bool {
    // "Recipe", "schema:Recipe", "https://schema.org/Recipe", "recipes"
    let local = type_str
        .trim()
        .rsplit(['/', ':', '#'])
        .next()
        .unwrap_or_default();
    local.eq_ignore_ascii_case("recipe") || local.eq_ignore_ascii_case("recipes")
}

pub(crate) fn is_recipe_type(value: &Value) -> bool {
    match value.get("@type") {
        Some(Value::String(type_str)) => type_denotes_recipe(type_str),
        Some(Value::Array(types)) => types
            .iter()
            .filter_map(Value::as_str)
            .any(type_denotes_recipe),
        _ => false,
    }
}

/// First recipe object in `value`, looking through arrays and aggregate containers
fn find_recipe(value: &Value) -> Option<&Value> {
    match value {
        Value::Array(items) => items
            .iter()
            .find(|item| is_recipe_type(item))
            .or_else(|| {
                // untyped objects that still carry instructions
                items.iter().find(|item| {
                    item.get("@type").is_none() && item.get("recipeInstructions").is_some()
                })
            })
            .or_else(|| items.iter().find_map(find_recipe)),
        Value::Object(map) => {
            if is_recipe_type(value) {
                return Some(value);
            }
            CONTAINER_KEYS
                .iter()
                .filter_map(|key| map.get(*key))
                .find_map(find_recipe)
        }
        _ => None,
    }
}

/// Strip the noise CMSes leave around JSON-LD payloads
fn sanitize_json(json_str: &str) -> String {
    let trimmed = json_str
        .trim()
        .trim_start_matches("//<![CDATA[")
        .trim_start_matches("<![CDATA[")
        .trim_end_matches("//]]>")
        .trim_end_matches("]]>")
        .replace("<!--", "")
        .replace("-->", "");

    // Drop trailing commas before a closing bracket, outside of strings
    let mut cleaned = String::with_capacity(trimmed.len());
    let mut in_string = false;
    let mut escaped = false;
    for c in trimmed.chars() {
        if in_string {
            cleaned.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => {
                in_string = true;
                cleaned.push(c);
            }
            ']' | '}' => {
                let kept = cleaned.trim_end().len();
                if cleaned[..kept].ends_with(',') {
                    cleaned.truncate(kept - 1);
                }
                cleaned.push(c);
            }
            _ => cleaned.push(c),
        }
    }

    cleaned.trim().to_string()
}

impl Extractor for JsonLdExtractor {
    fn name(&self) -> &'static str {
        "JsonLdExtractor"
    }

    fn parse(&self, context: &ParsingContext) -> Result<NormalizedRecipe, RecipeError> {
        debug!("JsonLdExtractor: Starting parse for URL: {}", context.url);
        let selector = Selector::parse("script[type='application/ld+json']").unwrap();

        let scripts: Vec<_> = context.document.select(&selector).collect();
        debug!(
            "JsonLdExtractor: Found {} JSON-LD script tags",
            scripts.len()
        );

        let mut failure = None;
        for (index, script) in scripts.iter().enumerate() {
            let cleaned_json = sanitize_json(&script.inner_html());
            let json_ld = match serde_json::from_str::<Value>(&cleaned_json) {
                Ok(json_ld) => json_ld,
                Err(e) => {
                    debug!("JsonLdExtractor: Failed to parse JSON-LD {}: {}", index, e);
                    failure.get_or_insert_with(|| RecipeError::parse(&context.url, "json-ld", e));
                    continue;
                }
            };

            let Some(recipe) = find_recipe(&json_ld) else {
                debug!("JsonLdExtractor: No recipe found in JSON-LD {}", index);
                continue;
            };

            match JsonLdRecipe::try_from(recipe) {
                Ok(recipe) => return Ok(recipe.normalize(&context.url)),
                Err(e) => {
                    debug!("JsonLdExtractor: Failed to read recipe in JSON-LD {}: {}", index, e);
                    failure
                        .get_or_insert_with(|| RecipeError::parse(&context.url, "json-ld recipe", e));
                }
            }
        }

        Err(failure.unwrap_or_else(|| RecipeError::NoStructuredData {
            url: context.url.clone(),
        }))
    }
}
