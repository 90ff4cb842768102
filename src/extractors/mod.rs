use log::debug;
use scraper::Html;

use crate::error::RecipeError;
use crate::model::NormalizedRecipe;

mod json_ld;
mod next_data;
pub(crate) mod schema;

pub use json_ld::JsonLdExtractor;
pub use next_data::NextDataExtractor;

pub struct ParsingContext {
    pub url: String,
    pub document: Html,
}

impl ParsingContext {
    pub fn new(url: &str, html: &str) -> Self {
        Self {
            url: url.to_string(),
            document: Html::parse_document(html),
        }
    }
}

/// One location strategy for the embedded recipe
///
/// Implementations return `NoStructuredData` when their block is absent so the next
/// strategy gets a chance, and `ParseError` when the block exists but is unreadable.
pub trait Extractor {
    fn name(&self) -> &'static str;
    fn parse(&self, context: &ParsingContext) -> Result<NormalizedRecipe, RecipeError>;
}

/// Locate and normalize the recipe embedded in `html`
///
/// JSON-LD is tried first, then the page-state fallback. A parse failure in an earlier
/// strategy is reported only when no later strategy finds anything.
pub fn extract_recipe(url: &str, html: &str) -> Result<NormalizedRecipe, RecipeError> {
    let context = ParsingContext::new(url, html);
    let extractors: Vec<Box<dyn Extractor>> =
        vec![Box::new(JsonLdExtractor), Box::new(NextDataExtractor)];

    let mut parse_failure = None;
    for extractor in extractors {
        match extractor.parse(&context) {
            Ok(recipe) => {
                debug!("{} extracted '{}' from {}", extractor.name(), recipe.title, url);
                return Ok(recipe);
            }
            Err(RecipeError::NoStructuredData { .. }) => {
                debug!("{} found nothing at {}", extractor.name(), url);
            }
            Err(err) => {
                debug!("{} failed at {}: {}", extractor.name(), url, err);
                parse_failure.get_or_insert(err);
            }
        }
    }

    Err(parse_failure.unwrap_or_else(|| RecipeError::NoStructuredData {
        url: url.to_string(),
    }))
}
