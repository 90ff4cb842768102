use std::fmt::Write;

use crate::model::NormalizedRecipe;

/// Render a recipe as a standalone markdown document
///
/// Sections without content are left out; the source link is always present.
pub fn recipe_to_markdown(recipe: &NormalizedRecipe) -> String {
    let mut md = String::new();

    let title = if recipe.title.is_empty() {
        "Untitled Recipe"
    } else {
        &recipe.title
    };
    let _ = writeln!(md, "# {title}\n");

    if let Some(author) = recipe.author.as_deref().filter(|a| !a.is_empty()) {
        let _ = writeln!(md, "*By {author}*\n");
    }

    if !recipe.description.is_empty() {
        let _ = writeln!(md, "{}\n", recipe.description);
    }

    let metadata = metadata_lines(recipe);
    if !metadata.is_empty() {
        let _ = writeln!(md, "{}\n", metadata.join("  \n"));
    }

    if !recipe.ingredients.is_empty() {
        md.push_str("## Ingredients\n\n");
        for ingredient in &recipe.ingredients {
            let _ = writeln!(md, "- {ingredient}");
        }
        md.push('\n');
    }

    if !recipe.instructions.is_empty() {
        md.push_str("## Instructions\n\n");
        for (i, step) in recipe.instructions.iter().enumerate() {
            let _ = writeln!(md, "{}. {}", i + 1, step);
        }
        md.push('\n');
    }

    if !recipe.tips.is_empty() {
        md.push_str("## Tips\n\n");
        for tip in &recipe.tips {
            let _ = writeln!(md, "- {tip}");
        }
        md.push('\n');
    }

    md.push_str("---\n\n");
    let mut footer = Vec::new();
    let total = recipe.duration();
    if !total.is_empty() {
        footer.push(format!("**Total Time:** {total}"));
    }
    let source_label = recipe
        .source_domain()
        .unwrap_or_else(|| recipe.source_url.clone());
    footer.push(format!("**Source:** [{}]({})", source_label, recipe.source_url));
    let _ = writeln!(md, "{}", footer.join(" | "));

    md
}

fn metadata_lines(recipe: &NormalizedRecipe) -> Vec<String> {
    let mut lines = Vec::new();

    let prep = recipe.prep_time();
    if !prep.is_empty() {
        lines.push(format!("**Prep Time:** {prep}"));
    }
    let cook = recipe.cook_time();
    if !cook.is_empty() {
        lines.push(format!("**Cook Time:** {cook}"));
    }
    if let Some(recipe_yield) = recipe.recipe_yield.as_deref().filter(|y| !y.is_empty()) {
        lines.push(format!("**Yield:** {recipe_yield}"));
    }
    if let Some(rating) = &recipe.rating {
        let value = (rating.value * 10.0).round() / 10.0;
        match rating.count {
            Some(count) => lines.push(format!("**Rating:** {value}/5 ({count} ratings)")),
            None => lines.push(format!("**Rating:** {value}/5")),
        }
    }

    lines
}
