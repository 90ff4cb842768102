//! Input shapes seen in schema.org recipe payloads.
//!
//! Each field that varies between publishers is an untagged enum whose variants are tried
//! in declaration order. Sequence variants come before struct variants because serde will
//! happily read a struct out of a JSON array.

use html_escape::decode_html_entities;
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::model::{NormalizedRecipe, Rating};

#[derive(Debug, Deserialize)]
pub(crate) struct JsonLdRecipe {
    #[serde(default, deserialize_with = "lenient")]
    name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    description: Option<DescriptionType>,
    #[serde(default, deserialize_with = "lenient")]
    image: Option<ImageType>,
    #[serde(
        rename = "recipeIngredient",
        alias = "ingredients",
        default,
        deserialize_with = "lenient"
    )]
    recipe_ingredient: Option<RecipeIngredients>,
    #[serde(rename = "recipeInstructions", default, deserialize_with = "lenient")]
    recipe_instructions: Option<Instructions>,
    #[serde(rename = "recipeYield", default, deserialize_with = "lenient")]
    recipe_yield: Option<RecipeYield>,
    #[serde(rename = "prepTime", default, deserialize_with = "lenient")]
    prep_time: Option<String>,
    #[serde(rename = "cookTime", default, deserialize_with = "lenient")]
    cook_time: Option<String>,
    #[serde(rename = "totalTime", default, deserialize_with = "lenient")]
    total_time: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    author: Option<Author>,
    #[serde(rename = "aggregateRating", default, deserialize_with = "lenient")]
    aggregate_rating: Option<AggregateRating>,
    #[serde(default, deserialize_with = "lenient")]
    tips: Option<Instructions>,
}

/// Read a field through `Value` so one odd field degrades to `None` instead of
/// rejecting the whole recipe.
pub(crate) fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(None);
    }
    Ok(serde_json::from_value(value).ok())
}

/// Like [`lenient`] for lists: unreadable items are dropped, a non-list reads as empty.
pub(crate) fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match Value::deserialize(deserializer)? {
        Value::Array(items) => Ok(items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect()),
        _ => Ok(Vec::new()),
    }
}

#[derive(Debug, Deserialize)]
struct TextObject {
    text: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DescriptionType {
    String(String),
    Object(TextObject),
}

#[derive(Debug, Deserialize)]
struct ImageObject {
    url: Option<String>,
    #[serde(rename = "contentUrl")]
    content_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ImageType {
    String(String),
    Multiple(Vec<ImageType>),
    Object(ImageObject),
}

impl ImageType {
    fn first_url(self) -> Option<String> {
        match self {
            ImageType::String(url) => non_empty(clean_text(&url)),
            ImageType::Multiple(images) => images.into_iter().find_map(ImageType::first_url),
            ImageType::Object(obj) => obj
                .url
                .or(obj.content_url)
                .and_then(|url| non_empty(clean_text(&url))),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RecipeIngredients {
    One(String),
    Multiple(Vec<IngredientItem>),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum IngredientItem {
    String(String),
    Object(IngredientObject),
    Unknown(IgnoredAny),
}

#[derive(Debug, Deserialize)]
struct IngredientObject {
    name: String,
    amount: Option<String>,
}

impl RecipeIngredients {
    fn into_lines(self) -> Vec<String> {
        let items = match self {
            RecipeIngredients::One(line) => vec![IngredientItem::String(line)],
            RecipeIngredients::Multiple(items) => items,
        };

        items
            .into_iter()
            .filter_map(|item| match item {
                IngredientItem::String(line) => non_empty(clean_text(&line)),
                IngredientItem::Object(obj) => {
                    let name = clean_text(&obj.name);
                    let amount = obj.amount.as_deref().unwrap_or("").trim();
                    if name.is_empty() {
                        None
                    } else if amount.is_empty() {
                        Some(name)
                    } else {
                        Some(format!("{amount} {name}"))
                    }
                }
                IngredientItem::Unknown(_) => None,
            })
            .collect()
    }
}

/// Every instruction layout we accept
///
/// A step or section object given where a list is expected is just another variant, so
/// it becomes a single element instead of being walked as a map.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum Instructions {
    Text(String),
    List(Vec<Instructions>),
    Section(HowToSection),
    Step(HowToStep),
    Unknown(IgnoredAny),
}

#[derive(Debug, Deserialize)]
pub(crate) struct HowToSection {
    #[serde(rename = "itemListElement")]
    item_list_element: Box<Instructions>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct HowToStep {
    text: Option<String>,
    name: Option<String>,
    description: Option<String>,
}

impl Instructions {
    /// Collapse any nesting into plain steps, in document order
    pub(crate) fn flatten(self) -> Vec<String> {
        let mut steps = Vec::new();
        self.collect_into(&mut steps);
        steps
    }

    fn collect_into(self, steps: &mut Vec<String>) {
        match self {
            Instructions::Text(text) => steps.extend(
                text.lines()
                    .filter_map(|line| non_empty(clean_text(line))),
            ),
            Instructions::List(items) => {
                for item in items {
                    item.collect_into(steps);
                }
            }
            Instructions::Section(section) => section.item_list_element.collect_into(steps),
            Instructions::Step(step) => {
                // Prefer text over name
                if let Some(text) = [step.text, step.name, step.description]
                    .into_iter()
                    .flatten()
                    .find_map(|t| non_empty(clean_text(&t)))
                {
                    steps.push(text);
                }
            }
            Instructions::Unknown(_) => {}
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RecipeYield {
    String(String),
    Number(serde_json::Number),
    Array(Vec<RecipeYield>),
}

impl RecipeYield {
    fn into_text(self) -> Option<String> {
        match self {
            RecipeYield::String(s) => non_empty(clean_text(&s)),
            RecipeYield::Number(n) => Some(n.to_string()),
            RecipeYield::Array(values) => {
                let texts: Vec<String> = values.into_iter().filter_map(RecipeYield::into_text).collect();
                // Prefer the descriptive form ("4 servings") over the bare number
                texts
                    .iter()
                    .find(|s| s.contains(char::is_alphabetic))
                    .or_else(|| texts.first())
                    .cloned()
            }
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Author {
    String(String),
    Multiple(Vec<Author>),
    Object(AuthorObject),
}

#[derive(Debug, Deserialize)]
struct AuthorObject {
    name: Option<String>,
}

impl Author {
    fn names(self) -> Vec<String> {
        match self {
            Author::String(name) => non_empty(clean_text(&name)).into_iter().collect(),
            Author::Multiple(authors) => authors.into_iter().flat_map(Author::names).collect(),
            Author::Object(obj) => obj
                .name
                .and_then(|name| non_empty(clean_text(&name)))
                .into_iter()
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum NumberOrText {
    Number(f64),
    Text(String),
}

impl NumberOrText {
    pub(crate) fn as_f64(&self) -> Option<f64> {
        match self {
            NumberOrText::Number(n) => Some(*n),
            NumberOrText::Text(s) => s.trim().parse().ok(),
        }
    }

    pub(crate) fn into_text(self) -> Option<String> {
        match self {
            NumberOrText::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                Some(format!("{}", n as i64))
            }
            NumberOrText::Number(n) => Some(n.to_string()),
            NumberOrText::Text(s) => non_empty(clean_text(&s)),
        }
    }
}

#[derive(Debug, Deserialize)]
struct AggregateRating {
    #[serde(rename = "ratingValue")]
    rating_value: Option<NumberOrText>,
    #[serde(rename = "reviewCount", alias = "ratingCount")]
    review_count: Option<NumberOrText>,
}

impl JsonLdRecipe {
    pub(crate) fn normalize(self, url: &str) -> NormalizedRecipe {
        let author = self.author.map(Author::names).unwrap_or_default();

        NormalizedRecipe {
            title: self.name.map(|n| clean_text(&n)).unwrap_or_default(),
            description: self
                .description
                .map(|desc| match desc {
                    DescriptionType::String(d) => clean_text(&d),
                    DescriptionType::Object(d) => clean_text(&d.text),
                })
                .unwrap_or_default(),
            ingredients: self
                .recipe_ingredient
                .map(RecipeIngredients::into_lines)
                .unwrap_or_default(),
            instructions: self
                .recipe_instructions
                .map(Instructions::flatten)
                .unwrap_or_default(),
            image_url: self.image.and_then(ImageType::first_url),
            duration_raw: self.total_time.and_then(|t| non_empty(t.trim().to_string())),
            source_url: url.to_string(),
            author: if author.is_empty() {
                None
            } else {
                Some(author.join(", "))
            },
            recipe_yield: self.recipe_yield.and_then(RecipeYield::into_text),
            prep_time_raw: self.prep_time.and_then(|t| non_empty(t.trim().to_string())),
            cook_time_raw: self.cook_time.and_then(|t| non_empty(t.trim().to_string())),
            rating: self.aggregate_rating.and_then(|rating| {
                let value = rating.rating_value.as_ref().and_then(NumberOrText::as_f64)?;
                Some(Rating {
                    value,
                    count: rating
                        .review_count
                        .as_ref()
                        .and_then(NumberOrText::as_f64)
                        .filter(|c| *c >= 0.0)
                        .map(|c| c as u64),
                })
            }),
            tips: self.tips.map(Instructions::flatten).unwrap_or_default(),
        }
    }
}

impl TryFrom<&Value> for JsonLdRecipe {
    type Error = serde_json::Error;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        serde_json::from_value(value.clone())
    }
}

pub(crate) fn decode_html_symbols(text: &str) -> String {
    // some publishers double-encode, so decode twice
    decode_html_entities(&decode_html_entities(text)).into_owned()
}

pub(crate) fn clean_text(text: &str) -> String {
    decode_html_symbols(text).trim().to_string()
}

pub(crate) fn non_empty(text: String) -> Option<String> {
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}
