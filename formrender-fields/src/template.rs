//! `{{field}}` template tokens.
//!
//! A string that is exactly `"{{dot.path}}"` is a whole-value reference and
//! resolves to the referenced field's value, whatever its type. Tokens
//! embedded in longer strings are replaced textually, which only happens
//! for async binding URLs and params.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::Value;

static TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{\{([^}]+)\}\}").expect("valid token regex"));

/// The dotted reference inside a whole-value token, trimmed.
pub fn whole_token(text: &str) -> Option<&str> {
    let inner = text.strip_prefix("{{")?.strip_suffix("}}")?;
    let inner = inner.trim();
    (!inner.is_empty()).then_some(inner)
}

/// Whole-value reference held by a JSON string value.
pub fn whole_token_value(value: &Value) -> Option<&str> {
    value.as_str().and_then(whole_token)
}

/// Every reference mentioned anywhere in `text`, in order of appearance.
pub fn token_references(text: &str) -> Vec<String> {
    TOKEN
        .captures_iter(text)
        .map(|caps| caps[1].trim().to_string())
        .filter(|name| !name.is_empty())
        .collect()
}

/// Replace every token in `text` with the display form of the referenced
/// value. Missing and null values become the empty string.
pub fn substitute_tokens(text: &str, lookup: impl Fn(&str) -> Option<Value>) -> String {
    TOKEN
        .replace_all(text, |caps: &Captures<'_>| match lookup(caps[1].trim()) {
            None | Some(Value::Null) => String::new(),
            Some(value) => stringify(&value),
        })
        .into_owned()
}

/// Display form of a value: strings without quotes, arrays comma-joined,
/// objects as JSON.
pub fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => format_number(n),
        Value::Array(items) => items.iter().map(stringify).collect::<Vec<_>>().join(","),
        Value::Object(_) => value.to_string(),
    }
}

fn format_number(n: &serde_json::Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() && f.fract() == 0.0 && f.is_finite() && f.abs() < 1e15 => {
            format!("{}", f as i64)
        }
        _ => n.to_string(),
    }
}
