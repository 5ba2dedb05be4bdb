//! Transform and validation operations
//!
//! Implements each [`TransformKind`] and [`ValidationKind`] over JSON values.

use serde_json::Value;
use zq_model::{stringify, value_to_text};

use crate::dates::iso_from_value;
use crate::functions::FunctionRegistry;
use crate::normalize::{DEFAULT_PRIORITY_ID, lookup_priority, map_priority, map_status_value};
use crate::numeric::value_to_f64;
use crate::rules::{TransformKind, ValidationKind};

/// Transform a value using the specified operation
///
/// # Errors
///
/// Returns an error if the selected transform cannot be applied to the input.
pub fn apply_transform(
    value: &Value,
    transform: &TransformKind,
    functions: &FunctionRegistry,
) -> crate::Result<Value> {
    match transform {
        TransformKind::Uppercase => map_text(value, "uppercase", str::to_uppercase),
        TransformKind::Lowercase => map_text(value, "lowercase", str::to_lowercase),
        TransformKind::Trim => map_text(value, "trim", |s| s.trim().to_string()),
        TransformKind::ToString => Ok(match value {
            Value::Null => Value::Null,
            other => Value::String(stringify(other)),
        }),
        TransformKind::ListJoin { separator } => Ok(transform_list_join(value, separator)),
        TransformKind::PriorityId => transform_priority_id(value),
        TransformKind::PriorityName => Ok(Value::String(
            map_priority(value_to_text(value).as_deref())
                .as_str()
                .to_string(),
        )),
        TransformKind::Status => Ok(Value::String(map_status_value(value).as_str().to_string())),
        TransformKind::DateIso => transform_date_iso(value),
        TransformKind::DefaultIfEmpty { value: default } => Ok(match value {
            Value::Null => default.clone(),
            Value::String(s) if s.trim().is_empty() => default.clone(),
            other => other.clone(),
        }),
        TransformKind::Chain { transforms } => {
            let mut current = value.clone();
            for step in transforms {
                current = apply_transform(&current, step, functions)?;
            }
            Ok(current)
        }
        TransformKind::Custom { name } => functions.call_transform(name, value),
    }
}

fn map_text(value: &Value, op: &str, f: impl Fn(&str) -> String) -> crate::Result<Value> {
    match value {
        Value::Null => Ok(Value::Null),
        Value::String(s) => Ok(Value::String(f(s))),
        Value::Number(_) | Value::Bool(_) => Ok(Value::String(f(&stringify(value)))),
        Value::Array(_) | Value::Object(_) => Err(crate::Error::Transform(format!(
            "Cannot apply {op} to a structured value"
        ))),
    }
}

/// Join list items with `separator`; scalars pass through as text
#[must_use]
pub fn transform_list_join(value: &Value, separator: &str) -> Value {
    match value {
        Value::Null => Value::Null,
        Value::Array(items) => Value::String(
            items
                .iter()
                .filter(|item| !item.is_null())
                .map(|item| value_to_text(item).unwrap_or_else(|| stringify(item)))
                .collect::<Vec<_>>()
                .join(separator),
        ),
        other => Value::String(stringify(other)),
    }
}

/// Map a priority name to its numeric id. Absent input takes the default id.
///
/// # Errors
///
/// Returns an error for names outside the priority vocabulary.
pub fn transform_priority_id(value: &Value) -> crate::Result<Value> {
    if value.is_null() {
        return Ok(Value::from(DEFAULT_PRIORITY_ID));
    }
    let name = value_to_text(value).ok_or_else(|| {
        crate::Error::Transform(format!("Priority value {value} is not a name"))
    })?;
    lookup_priority(&name)
        .map(|priority| Value::from(priority.id()))
        .ok_or_else(|| crate::Error::Transform(format!("Unknown priority '{name}'")))
}

fn transform_date_iso(value: &Value) -> crate::Result<Value> {
    if value.is_null() {
        return Ok(Value::Null);
    }
    iso_from_value(value)
        .map(Value::String)
        .ok_or_else(|| crate::Error::Transform(format!("Cannot parse date {value}")))
}

/// Evaluate a validation predicate
///
/// # Errors
///
/// Returns an error when the predicate cannot be evaluated, e.g. an invalid
/// pattern or a failing named validator.
pub fn apply_validation(
    value: &Value,
    validation: &ValidationKind,
    functions: &FunctionRegistry,
) -> crate::Result<bool> {
    match validation {
        ValidationKind::NotEmpty => Ok(match value {
            Value::Null => false,
            Value::String(s) => !s.trim().is_empty(),
            Value::Array(items) => !items.is_empty(),
            Value::Object(map) => !map.is_empty(),
            Value::Number(_) | Value::Bool(_) => true,
        }),
        ValidationKind::MaxLength { max } => Ok(stringify(value).chars().count() <= *max),
        ValidationKind::Matches { pattern } => functions.is_match(pattern, &stringify(value)),
        ValidationKind::OneOf { values } => {
            let text = stringify(value);
            Ok(values.iter().any(|allowed| *allowed == text))
        }
        ValidationKind::Numeric => Ok(value_to_f64(value).is_some()),
        ValidationKind::Custom { name } => functions.call_validator(name, value),
    }
}
