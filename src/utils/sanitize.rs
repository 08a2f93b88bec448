//! Input sanitization primitives.
//!
//! Both sanitizers only ever delete characters or fields, so their output is a
//! subset of their input and running them twice changes nothing.
//!
//! - [`strip_operator_keys`] - drops object keys a document store could read as a
//!   query operator (`$gt`, `a.b`)
//! - [`strip_markup`] - removes executable markup from strings

use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;

/// `<script ...> ... </script>` blocks, including unterminated ones.
static SCRIPT_BLOCK_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<\s*script\b[^>]*>.*?(<\s*/\s*script\s*>|$)").unwrap()
});

/// Any complete tag, which also removes event-handler attributes such as `onerror=`.
static TAG_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^<>]*>").unwrap());

/// Returns `true` for keys that must not reach the document store.
pub fn is_operator_key(key: &str) -> bool {
    key.starts_with('$') || key.contains('.')
}

/// Recursively removes operator-like keys from objects inside `value`.
///
/// Returns the number of removed keys.
pub fn strip_operator_keys(value: &mut Value) -> usize {
    match value {
        Value::Object(map) => strip_operator_keys_in_map(map),
        Value::Array(items) => items.iter_mut().map(strip_operator_keys).sum(),
        _ => 0,
    }
}

/// Same as [`strip_operator_keys`] for a top-level object.
pub fn strip_operator_keys_in_map(map: &mut Map<String, Value>) -> usize {
    let before = map.len();
    map.retain(|key, _| !is_operator_key(key));
    let mut removed = before - map.len();

    for nested in map.values_mut() {
        removed += strip_operator_keys(nested);
    }
    removed
}

/// Removes script blocks, tags and stray angle brackets from `input`.
pub fn strip_markup(input: &str) -> String {
    if !input.contains(['<', '>']) {
        return input.to_string();
    }

    let without_scripts = SCRIPT_BLOCK_REGEX.replace_all(input, "");
    let without_tags = TAG_REGEX.replace_all(&without_scripts, "");
    without_tags.replace(['<', '>'], "")
}

/// Applies [`strip_markup`] to every string inside `value`. Keys are left alone.
pub fn strip_markup_in_value(value: &mut Value) {
    match value {
        Value::String(s) => {
            if s.contains(['<', '>']) {
                *s = strip_markup(s);
            }
        }
        Value::Array(items) => items.iter_mut().for_each(strip_markup_in_value),
        Value::Object(map) => map.values_mut().for_each(strip_markup_in_value),
        _ => {}
    }
}

/// Same as [`strip_markup_in_value`] for a top-level object.
pub fn strip_markup_in_map(map: &mut Map<String, Value>) {
    map.values_mut().for_each(strip_markup_in_value);
}
