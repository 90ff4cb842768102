//! Mapping between source URLs and the path segments used as route paths and cache keys.
//!
//! [`to_path`] is the single function behind both uses, so a cached entry is always
//! reachable at the path that produced it. Decoding always assumes `https://`; the original
//! scheme is not recoverable.

use regex::Regex;
use std::sync::OnceLock;
use url::Url;

use crate::error::RecipeError;

const NYT_RECIPE_BASE: &str = "https://cooking.nytimes.com/recipes/";

/// Canonical key for `input`: `<host>[:port]<path>[?query]`
///
/// The host is lower-cased and loses a leading `www.`, the scheme and fragment are
/// dropped, and a bare `/` path collapses to nothing. Inputs without a scheme are read
/// as `https://`.
pub fn to_path(input: &str) -> Result<String, RecipeError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(invalid(input, "empty URL"));
    }

    let with_scheme = if has_scheme(trimmed) {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed.trim_start_matches('/'))
    };

    let parsed = Url::parse(&with_scheme).map_err(|e| invalid(input, e))?;
    match parsed.scheme() {
        "http" | "https" => {}
        scheme => return Err(invalid(input, format!("unsupported scheme: {scheme}"))),
    }

    let host = parsed
        .host_str()
        .filter(|h| !h.is_empty())
        .ok_or_else(|| invalid(input, "missing host"))?
        .to_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host);

    let mut key = String::from(host);
    if let Some(port) = parsed.port() {
        key.push_str(&format!(":{port}"));
    }
    if parsed.path() != "/" {
        key.push_str(parsed.path());
    }
    if let Some(query) = parsed.query() {
        key.push('?');
        key.push_str(query);
    }

    Ok(key)
}

/// Source URL for a route path segment, always `https://`
pub fn to_url(segment: &str) -> String {
    format!("https://{}", strip_scheme(segment))
}

/// Like [`to_url`] but with a `www.` host prefix
pub fn to_url_with_www(segment: &str) -> String {
    let rest = strip_scheme(segment);
    if rest.starts_with("www.") {
        format!("https://{rest}")
    } else {
        format!("https://www.{rest}")
    }
}

fn scheme_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.-]*://").expect("static regex is valid"))
}

/// Whether `input` starts with a `scheme://` prefix
///
/// A `://` later in the path or query (say `?next=https://...`) does not count.
pub fn has_scheme(input: &str) -> bool {
    scheme_regex().is_match(input.trim())
}

fn strip_scheme(segment: &str) -> &str {
    let trimmed = segment.trim().trim_start_matches('/');
    match scheme_regex().find(trimmed) {
        Some(scheme) => &trimmed[scheme.end()..],
        None => trimmed,
    }
}

/// Host of a full URL or of a path segment
pub fn extract_domain(input: &str) -> Option<String> {
    let rest = strip_scheme(input);
    let end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    let domain = &rest[..end];
    if domain.is_empty() {
        None
    } else {
        Some(domain.to_lowercase())
    }
}

/// Source URL for an incoming route segment
///
/// A purely numeric segment is an NYT Cooking recipe id.
pub fn resolve_segment(segment: &str) -> String {
    let trimmed = segment.trim().trim_matches('/');
    if !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit()) {
        format!("{NYT_RECIPE_BASE}{trimmed}")
    } else {
        to_url(trimmed)
    }
}

fn nyt_recipe_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"cooking\.nytimes\.com/recipes/(\d+)").expect("static regex is valid")
    })
}

/// Numeric id of an NYT Cooking recipe URL
pub fn nyt_recipe_id(url: &str) -> Option<String> {
    nyt_recipe_regex()
        .captures(url)
        .map(|caps| caps[1].to_string())
}

/// Filename-safe slug for a recipe
///
/// NYT recipe URLs keep their own `<id>-<name>` segment; everything else is derived
/// from the title.
pub fn recipe_slug(title: &str, url: Option<&str>) -> String {
    if let Some(url) = url.filter(|u| nyt_recipe_id(u).is_some()) {
        if let Some(last) = url
            .split(['?', '#'])
            .next()
            .and_then(|u| u.trim_end_matches('/').rsplit('/').next())
        {
            return last.to_string();
        }
    }

    let slug = title
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '-')
        .collect::<String>()
        .split(|c: char| c.is_whitespace() || c == '-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-");

    if slug.is_empty() {
        "recipe".to_string()
    } else {
        slug
    }
}

fn invalid(input: &str, reason: impl std::fmt::Display) -> RecipeError {
    RecipeError::InvalidUrl {
        input: input.to_string(),
        reason: reason.to_string(),
    }
}
