//! Fallback for pages that ship their recipe only inside the Next.js page-state island
//! (`<script id="__NEXT_DATA__">`), as NYT Cooking does for some recipes.

use super::schema::{clean_text, lenient, lenient_list, non_empty, JsonLdRecipe, NumberOrText};
use super::{Extractor, ParsingContext};
use crate::error::RecipeError;
use crate::model::{NormalizedRecipe, Rating};
use log::debug;
use scraper::{Html, Selector};
use serde::Deserialize;
use serde_json::Value;

pub struct NextDataExtractor;

/// Known locations of the recipe object across page-state versions, newest first
const RECIPE_PATHS: [&[&str]; 3] = [
    &["props", "pageProps", "recipe"],
    &["props", "pageProps", "content", "recipe"],
    &["props", "pageProps", "initialState", "recipe"],
];

fn lookup<'a>(root: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter()
        .try_fold(root, |node, key| node.get(*key))
        .filter(|node| node.is_object())
}

/// Page-state recipe; every field is read leniently so one oddly typed value never
/// costs the whole recipe
#[derive(Debug, Deserialize)]
struct NextDataRecipe {
    #[serde(alias = "name", default, deserialize_with = "lenient")]
    title: Option<String>,
    #[serde(
        alias = "topnote",
        alias = "topDescription",
        default,
        deserialize_with = "lenient"
    )]
    description: Option<String>,
    #[serde(default)]
    image: Value,
    #[serde(default, deserialize_with = "lenient_list")]
    ingredients: Vec<IngredientGroup>,
    #[serde(default, deserialize_with = "lenient_list")]
    steps: Vec<StepGroup>,
    #[serde(default, deserialize_with = "lenient_list")]
    tips: Vec<StepLine>,
    #[serde(
        rename = "recipeYield",
        alias = "yield",
        default,
        deserialize_with = "lenient"
    )]
    recipe_yield: Option<NumberOrText>,
    #[serde(rename = "totalTime", default, deserialize_with = "lenient")]
    total_time: Option<String>,
    #[serde(rename = "prepTime", default, deserialize_with = "lenient")]
    prep_time: Option<String>,
    #[serde(rename = "cookTime", default, deserialize_with = "lenient")]
    cook_time: Option<String>,
    #[serde(rename = "contentAttribution", default, deserialize_with = "lenient")]
    attribution: Option<Attribution>,
    #[serde(default, deserialize_with = "lenient")]
    ratings: Option<Ratings>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum IngredientGroup {
    Group {
        #[serde(deserialize_with = "lenient_list")]
        ingredients: Vec<IngredientLine>,
    },
    Line(IngredientLine),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum IngredientLine {
    Text(String),
    Object {
        #[serde(default, deserialize_with = "lenient")]
        quantity: Option<NumberOrText>,
        #[serde(default, deserialize_with = "lenient")]
        text: Option<String>,
        #[serde(default, deserialize_with = "lenient")]
        name: Option<String>,
    },
}

impl IngredientLine {
    fn into_text(self) -> Option<String> {
        match self {
            IngredientLine::Text(text) => non_empty(clean_text(&text)),
            IngredientLine::Object {
                quantity,
                text,
                name,
            } => {
                let text = text.or(name).map(|t| clean_text(&t)).unwrap_or_default();
                let quantity = quantity.and_then(NumberOrText::into_text).unwrap_or_default();
                non_empty(format!("{quantity} {text}").trim().to_string())
            }
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StepGroup {
    Group {
        #[serde(deserialize_with = "lenient_list")]
        steps: Vec<StepLine>,
    },
    Step(StepLine),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StepLine {
    Text(String),
    Object {
        #[serde(default, deserialize_with = "lenient")]
        description: Option<String>,
        #[serde(default, deserialize_with = "lenient")]
        text: Option<String>,
    },
}

impl StepLine {
    fn into_text(self) -> Option<String> {
        match self {
            StepLine::Text(text) => non_empty(strip_markup(&text)),
            StepLine::Object { description, text } => description
                .or(text)
                .and_then(|t| non_empty(strip_markup(&t))),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Attribution {
    #[serde(
        rename = "cardByline",
        alias = "byline",
        default,
        deserialize_with = "lenient"
    )]
    byline: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Ratings {
    #[serde(rename = "avgRating", default, deserialize_with = "lenient")]
    avg_rating: Option<NumberOrText>,
    #[serde(rename = "numRatings", default, deserialize_with = "lenient")]
    num_ratings: Option<NumberOrText>,
}

/// Text content of a fragment that may contain inline markup
fn strip_markup(text: &str) -> String {
    let fragment = Html::parse_fragment(text);
    clean_text(&fragment.root_element().text().collect::<String>())
}

/// First absolute image URL, preferring `url`, `contentUrl` and `src` keys
fn first_image_url(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if s.starts_with("http") => Some(s.clone()),
        Value::Array(items) => items.iter().find_map(first_image_url),
        Value::Object(map) => ["url", "contentUrl", "src"]
            .iter()
            .filter_map(|key| map.get(*key))
            .chain(map.values())
            .find_map(first_image_url),
        _ => None,
    }
}

impl NextDataRecipe {
    fn normalize(self, url: &str) -> NormalizedRecipe {
        NormalizedRecipe {
            title: self.title.map(|t| clean_text(&t)).unwrap_or_default(),
            description: self
                .description
                .map(|d| strip_markup(&d))
                .unwrap_or_default(),
            ingredients: self
                .ingredients
                .into_iter()
                .flat_map(|group| match group {
                    IngredientGroup::Group { ingredients } => ingredients,
                    IngredientGroup::Line(line) => vec![line],
                })
                .filter_map(IngredientLine::into_text)
                .collect(),
            instructions: self
                .steps
                .into_iter()
                .flat_map(|group| match group {
                    StepGroup::Group { steps } => steps,
                    StepGroup::Step(step) => vec![step],
                })
                .filter_map(StepLine::into_text)
                .collect(),
            image_url: first_image_url(&self.image),
            duration_raw: self.total_time.and_then(|t| non_empty(t.trim().to_string())),
            source_url: url.to_string(),
            author: self
                .attribution
                .and_then(|a| a.byline)
                .and_then(|b| non_empty(clean_text(&b))),
            recipe_yield: self.recipe_yield.and_then(NumberOrText::into_text),
            prep_time_raw: self.prep_time.and_then(|t| non_empty(t.trim().to_string())),
            cook_time_raw: self.cook_time.and_then(|t| non_empty(t.trim().to_string())),
            rating: self.ratings.and_then(|r| {
                Some(Rating {
                    value: r.avg_rating.as_ref().and_then(NumberOrText::as_f64)?,
                    count: r
                        .num_ratings
                        .as_ref()
                        .and_then(NumberOrText::as_f64)
                        .filter(|c| *c >= 0.0)
                        .map(|c| c as u64),
                })
            }),
            tips: self
                .tips
                .into_iter()
                .filter_map(StepLine::into_text)
                .collect(),
        }
    }
}

impl Extractor for NextDataExtractor {
    fn name(&self) -> &'static str {
        "NextDataExtractor"
    }

    fn parse(&self, context: &ParsingContext) -> Result<NormalizedRecipe, RecipeError> {
        let selector = Selector::parse("script#__NEXT_DATA__").unwrap();
        let Some(script) = context.document.select(&selector).next() else {
            return Err(RecipeError::NoStructuredData {
                url: context.url.clone(),
            });
        };

        let state: Value = serde_json::from_str(script.inner_html().trim())
            .map_err(|e| RecipeError::parse(&context.url, "page state", e))?;

        let Some(recipe) = RECIPE_PATHS.iter().find_map(|path| lookup(&state, path)) else {
            debug!("NextDataExtractor: no recipe at any known path for {}", context.url);
            return Err(RecipeError::NoStructuredData {
                url: context.url.clone(),
            });
        };

        // Some page states embed a schema.org object verbatim
        if recipe.get("recipeIngredient").is_some() || recipe.get("recipeInstructions").is_some() {
            debug!("NextDataExtractor: recipe uses schema.org field names");
            return JsonLdRecipe::try_from(recipe)
                .map(|r| r.normalize(&context.url))
                .map_err(|e| RecipeError::parse(&context.url, "page state recipe", e));
        }

        serde_json::from_value::<NextDataRecipe>(recipe.clone())
            .map(|r| r.normalize(&context.url))
            .map_err(|e| RecipeError::parse(&context.url, "page state recipe", e))
    }
}
