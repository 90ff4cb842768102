//! Pure formatting helpers for durations and instruction trees.

use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

use crate::extractors::schema::Instructions;

fn duration_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        let number = r"(\d+(?:[.,]\d+)?)";
        Regex::new(&format!(
            r"(?i)^P(?:{number}D)?(?:T(?:{number}H)?(?:{number}M)?(?:{number}S)?)?$"
        ))
        .expect("static regex is valid")
    })
}

fn unit(value: u64, name: &str) -> String {
    format!("{} {}{}", value, name, if value == 1 { "" } else { "s" })
}

/// Convert an ISO 8601 duration to human-readable format
///
/// e.g. `PT30M` -> `30 minutes`, `PT1H30M` -> `1 hour 30 minutes`, `PT90M` ->
/// `1 hour 30 minutes`. Seconds are only shown when there are no hours or days.
/// Malformed, zero or missing tokens give an empty string.
pub fn format_duration(token: Option<&str>) -> String {
    let Some(token) = token.map(str::trim).filter(|t| !t.is_empty()) else {
        return String::new();
    };
    let Some(caps) = duration_regex().captures(token) else {
        return String::new();
    };

    let component = |idx: usize| -> f64 {
        caps.get(idx)
            .and_then(|m| m.as_str().replace(',', ".").parse::<f64>().ok())
            .unwrap_or(0.0)
    };
    let total = (component(1) * 86_400.0 + component(2) * 3_600.0 + component(3) * 60.0
        + component(4))
    .round() as u64;

    let days = total / 86_400;
    let hours = (total % 86_400) / 3_600;
    let minutes = (total % 3_600) / 60;
    let seconds = total % 60;

    let mut parts = Vec::new();
    if days > 0 {
        parts.push(unit(days, "day"));
    }
    if hours > 0 {
        parts.push(unit(hours, "hour"));
    }
    if minutes > 0 {
        parts.push(unit(minutes, "minute"));
    }
    if seconds > 0 && days == 0 && hours == 0 {
        parts.push(unit(seconds, "second"));
    }
    parts.join(" ")
}

/// Flatten any accepted `recipeInstructions` layout into plain steps
///
/// Unreadable input yields an empty list rather than an error.
pub fn flatten_instructions(value: &Value) -> Vec<String> {
    serde_json::from_value::<Instructions>(value.clone())
        .map(Instructions::flatten)
        .unwrap_or_default()
}
