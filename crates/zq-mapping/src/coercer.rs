//! Custom-field value coercion
//!
//! Converts an arbitrarily shaped custom-field value into a single value for
//! a qTest STRING, NUMBER, DATE or CHECKBOX slot. Dispatch order: a per-field
//! override, then null handling, then status/priority names, then the
//! declared type.

use serde_json::{Map, Value};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{trace, warn};
use zq_model::{CustomFieldType, stringify};

use crate::dates::iso_from_value;
use crate::normalize::{map_priority, map_status_value};
use crate::numeric::{f64_to_value, value_to_f64};
use crate::CustomFieldError;

/// Per-field override function
pub type CoerceFn = Arc<dyn Fn(&Value) -> crate::Result<Value> + Send + Sync>;

const TRUTHY: [&str; 4] = ["true", "yes", "1", "on"];
const HIERARCHY_SEPARATOR: &str = " > ";
const LIST_SEPARATOR: &str = ", ";

/// A coerced value plus any non-fatal problem noticed on the way
#[derive(Debug, Clone, PartialEq)]
pub struct Coerced {
    pub value: Value,
    pub warning: Option<String>,
}

impl Coerced {
    fn ok(value: Value) -> Self {
        Self {
            value,
            warning: None,
        }
    }
}

/// Type-dispatching coercer with per-field overrides
#[derive(Clone, Default)]
pub struct CustomFieldCoercer {
    overrides: HashMap<String, CoerceFn>,
}

impl CustomFieldCoercer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an override for the field named `field_name` (case-insensitive)
    pub fn register_override(
        &mut self,
        field_name: &str,
        func: impl Fn(&Value) -> crate::Result<Value> + Send + Sync + 'static,
    ) -> &mut Self {
        self.overrides
            .insert(field_name.trim().to_lowercase(), Arc::new(func));
        self
    }

    #[must_use]
    pub fn has_override(&self, field_name: &str) -> bool {
        self.overrides.contains_key(&field_name.trim().to_lowercase())
    }

    /// Coerce one custom-field value.
    ///
    /// # Errors
    ///
    /// Only a failing override produces an error; it is reported as
    /// [`CustomFieldError::Unexpected`]. Unparseable data never errors.
    pub fn coerce(
        &self,
        field_name: &str,
        field_type: CustomFieldType,
        raw: &Value,
    ) -> crate::Result<Coerced> {
        let key = field_name.trim().to_lowercase();
        if let Some(func) = self.overrides.get(&key) {
            return func(raw).map(Coerced::ok).map_err(|e| {
                CustomFieldError::Unexpected {
                    field: field_name.to_string(),
                    message: e.to_string(),
                }
                .into()
            });
        }

        if raw.is_null() {
            return Ok(Coerced::ok(Value::String(String::new())));
        }

        match key.as_str() {
            "status" | "execution_status" => {
                return Ok(Coerced::ok(Value::String(
                    map_status_value(raw).as_str().to_string(),
                )));
            }
            "priority" | "importance" => {
                let name = zq_model::value_to_text(raw);
                return Ok(Coerced::ok(Value::String(
                    map_priority(name.as_deref()).as_str().to_string(),
                )));
            }
            _ => {}
        }

        trace!(field = field_name, field_type = field_type.as_str(), "coercing custom field");
        Ok(match field_type {
            CustomFieldType::MultipleSelect => Coerced::ok(coerce_multiple_select(raw)),
            CustomFieldType::Date | CustomFieldType::DateTime => Coerced::ok(coerce_date(raw)),
            CustomFieldType::Table => Coerced::ok(Value::String(render_table(raw))),
            CustomFieldType::HierarchicalSelect
            | CustomFieldType::UserGroup
            | CustomFieldType::Component
            | CustomFieldType::Version
            | CustomFieldType::Label
            | CustomFieldType::Sprint => Coerced::ok(Value::String(render_hierarchy(raw))),
            CustomFieldType::Checkbox => Coerced::ok(Value::Bool(coerce_checkbox(raw))),
            CustomFieldType::Numeric => coerce_numeric(field_name, raw),
            CustomFieldType::User => Coerced::ok(Value::String(coerce_user(raw))),
            CustomFieldType::Text => Coerced::ok(Value::String(stringify(raw))),
        })
    }
}

impl std::fmt::Debug for CustomFieldCoercer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&String> = self.overrides.keys().collect();
        names.sort();
        f.debug_struct("CustomFieldCoercer")
            .field("overrides", &names)
            .finish()
    }
}

fn item_text(item: &Value) -> String {
    zq_model::value_to_text(item).unwrap_or_else(|| stringify(item))
}

fn coerce_multiple_select(raw: &Value) -> Value {
    match raw {
        Value::Array(items) => Value::String(
            items
                .iter()
                .map(item_text)
                .collect::<Vec<_>>()
                .join(LIST_SEPARATOR),
        ),
        other => Value::String(stringify(other)),
    }
}

fn coerce_date(raw: &Value) -> Value {
    Value::String(iso_from_value(raw).unwrap_or_else(|| stringify(raw)))
}

fn coerce_checkbox(raw: &Value) -> bool {
    match raw {
        Value::Bool(b) => *b,
        Value::String(s) => TRUTHY.contains(&s.trim().to_lowercase().as_str()),
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
        Value::Null => false,
    }
}

fn coerce_numeric(field_name: &str, raw: &Value) -> Coerced {
    match raw {
        Value::Number(_) => Coerced::ok(raw.clone()),
        Value::Bool(b) => Coerced::ok(Value::from(u8::from(*b))),
        other => match value_to_f64(other) {
            Some(number) => Coerced::ok(f64_to_value(number)),
            None => {
                let message = format!(
                    "Custom field '{field_name}' has non-numeric value '{}' \
                     for a numeric field; using 0",
                    stringify(other)
                );
                warn!(field = field_name, "{message}");
                Coerced {
                    value: Value::from(0),
                    warning: Some(message),
                }
            }
        },
    }
}

fn coerce_user(raw: &Value) -> String {
    match raw {
        Value::Object(obj) => ["name", "displayName", "username", "value"]
            .iter()
            .chain(["id", "accountId"].iter())
            .find_map(|key| obj.get(*key).and_then(zq_model::value_to_text))
            .unwrap_or_else(|| stringify(raw)),
        other => stringify(other),
    }
}

/// Render a table-typed value as pipe-delimited text.
///
/// Rows of objects use the sorted union of their keys as the header; rows of
/// lists use the first row as the header when every cell in it is a string.
#[must_use]
pub fn render_table(raw: &Value) -> String {
    let Value::Array(rows) = raw else {
        return stringify(raw);
    };
    if rows.is_empty() {
        return String::new();
    }

    if rows.iter().all(Value::is_object) {
        let objects: Vec<&Map<String, Value>> = rows.iter().filter_map(Value::as_object).collect();
        let headers: Vec<&String> = objects
            .iter()
            .flat_map(|row| row.keys())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let header_cells: Vec<String> = headers.iter().map(|h| (*h).clone()).collect();
        let body = objects.iter().map(|row| {
            headers
                .iter()
                .map(|h| row.get(*h).map(stringify).unwrap_or_default())
                .collect()
        });
        return layout(Some(header_cells), body);
    }

    if rows.iter().all(Value::is_array) {
        let lists: Vec<&Vec<Value>> = rows.iter().filter_map(Value::as_array).collect();
        let first = lists[0];
        let first_is_header = !first.is_empty() && first.iter().all(Value::is_string);
        if first_is_header {
            let header: Vec<String> = first.iter().map(stringify).collect();
            let width = header.len();
            let body = lists[1..].iter().map(|row| {
                (0..width)
                    .map(|i| row.get(i).map(stringify).unwrap_or_default())
                    .collect()
            });
            return layout(Some(header), body);
        }
        let body = lists
            .iter()
            .map(|row| row.iter().map(stringify).collect::<Vec<_>>());
        return layout(None, body);
    }

    rows.iter().map(stringify).collect::<Vec<_>>().join("\n")
}

fn layout(header: Option<Vec<String>>, body: impl Iterator<Item = Vec<String>>) -> String {
    let mut lines = Vec::new();
    if let Some(header) = header {
        let header_line = header.join(" | ");
        lines.push("-".repeat(header_line.chars().count()));
        lines.insert(0, header_line);
    }
    lines.extend(body.map(|cells| cells.join(" | ")));
    lines.join("\n")
}

/// Render a hierarchical value (cascading select, component, version, ...)
/// as a single path string
#[must_use]
pub fn render_hierarchy(raw: &Value) -> String {
    match raw {
        Value::Null => String::new(),
        Value::Object(obj) if obj.is_empty() => String::new(),
        Value::Object(obj) => {
            if obj.contains_key("id") && obj.contains_key("name") {
                return obj.get("name").map(stringify).unwrap_or_default();
            }
            if obj.contains_key("value") && obj.contains_key("label") {
                return obj.get("label").map(stringify).unwrap_or_default();
            }
            obj.iter()
                .map(|(k, v)| format!("{k}: {}", stringify(v)))
                .collect::<Vec<_>>()
                .join(HIERARCHY_SEPARATOR)
        }
        Value::Array(items) if items.iter().all(Value::is_object) => items
            .iter()
            .filter_map(Value::as_object)
            .map(|item| {
                ["name", "label", "value"]
                    .iter()
                    .find_map(|key| item.get(*key).filter(|v| !v.is_null()))
                    .map_or_else(|| stringify(&Value::Object(item.clone())), stringify)
            })
            .collect::<Vec<_>>()
            .join(HIERARCHY_SEPARATOR),
        Value::Array(items) => items
            .iter()
            .map(stringify)
            .collect::<Vec<_>>()
            .join(LIST_SEPARATOR),
        other => stringify(other),
    }
}
