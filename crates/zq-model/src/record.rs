//! Source and target records
//!
//! Records are plain JSON objects. Absent keys and explicit `null` values are
//! treated the same everywhere, so the accessors here return `None` for both.

use serde_json::{Map, Value};

/// A string-keyed record, as read from Zephyr or written for qTest
pub type Record = Map<String, Value>;

/// Look up a dotted path such as `priority.name` or `testScript.steps`.
///
/// Returns `None` when any segment is missing, when an intermediate value is
/// not an object, or when the final value is `null`.
#[must_use]
pub fn get_path<'a>(record: &'a Record, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let first = segments.next()?;
    let mut current = record.get(first)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    if current.is_null() { None } else { Some(current) }
}

/// Return the first non-null value among `paths`
#[must_use]
pub fn first_present<'a>(record: &'a Record, paths: &[&str]) -> Option<&'a Value> {
    paths.iter().find_map(|path| get_path(record, path))
}

/// Interpret a value as an identifier.
///
/// Strings and numbers are used directly; objects contribute their `id` or
/// `key` member. Empty strings are not identifiers.
#[must_use]
pub fn value_to_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Object(obj) => obj
            .get("id")
            .and_then(value_to_id)
            .or_else(|| obj.get("key").and_then(value_to_id)),
        _ => None,
    }
}

/// Interpret a scalar value as text. Objects contribute their `name` member.
#[must_use]
pub fn value_to_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Object(obj) => obj.get("name").and_then(value_to_text),
        Value::Null | Value::Array(_) => None,
    }
}

/// Render any value as a display string. Strings are not quoted and `null`
/// renders as an empty string.
#[must_use]
pub fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}
