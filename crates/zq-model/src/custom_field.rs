//! Custom fields
//!
//! A Zephyr custom field is a `{id, name, type, value}` object whose value
//! shape depends on `type`. Callers normalize raw entries into
//! [`CustomField`] once, at ingestion, and work with the typed union after.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::record::{Record, value_to_id};

/// Source collection keys that may carry custom fields
pub const CUSTOM_FIELD_KEYS: [&str; 2] = ["customFields", "custom_fields"];

/// Declared type of a source custom field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CustomFieldType {
    Text,
    Checkbox,
    Numeric,
    Date,
    DateTime,
    MultipleSelect,
    Table,
    HierarchicalSelect,
    UserGroup,
    Component,
    Version,
    Label,
    Sprint,
    User,
}

impl CustomFieldType {
    /// Interpret a declared type name. Unrecognized names are treated as text.
    #[must_use]
    pub fn from_declared(declared: &str) -> Self {
        let normalized = declared.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "checkbox" | "boolean" | "bool" => CustomFieldType::Checkbox,
            "numeric" | "number" | "decimal" | "integer" => CustomFieldType::Numeric,
            "date" => CustomFieldType::Date,
            "datetime" | "date_time" => CustomFieldType::DateTime,
            "multiple_select" | "multi_select" | "multiselect" | "multiple_choice"
            | "checkboxes" => CustomFieldType::MultipleSelect,
            "table" => CustomFieldType::Table,
            "hierarchical_select" | "hierarchical" | "cascading_select" => {
                CustomFieldType::HierarchicalSelect
            }
            "user_group" | "group" => CustomFieldType::UserGroup,
            "component" => CustomFieldType::Component,
            "version" => CustomFieldType::Version,
            "label" | "labels" => CustomFieldType::Label,
            "sprint" => CustomFieldType::Sprint,
            "user" | "user_picker" | "single_user_picker" => CustomFieldType::User,
            _ => CustomFieldType::Text,
        }
    }

    /// Infer a type from the shape of an untyped value
    #[must_use]
    pub fn infer(value: &Value) -> Self {
        match value {
            Value::Bool(_) => CustomFieldType::Checkbox,
            Value::Number(_) => CustomFieldType::Numeric,
            Value::Array(_) => CustomFieldType::MultipleSelect,
            Value::Object(_) => CustomFieldType::HierarchicalSelect,
            Value::Null | Value::String(_) => CustomFieldType::Text,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            CustomFieldType::Text => "TEXT",
            CustomFieldType::Checkbox => "CHECKBOX",
            CustomFieldType::Numeric => "NUMERIC",
            CustomFieldType::Date => "DATE",
            CustomFieldType::DateTime => "DATETIME",
            CustomFieldType::MultipleSelect => "MULTIPLE_SELECT",
            CustomFieldType::Table => "TABLE",
            CustomFieldType::HierarchicalSelect => "HIERARCHICAL_SELECT",
            CustomFieldType::UserGroup => "USER_GROUP",
            CustomFieldType::Component => "COMPONENT",
            CustomFieldType::Version => "VERSION",
            CustomFieldType::Label => "LABEL",
            CustomFieldType::Sprint => "SPRINT",
            CustomFieldType::User => "USER",
        }
    }

    /// The qTest slot type a coerced value of this type is written into
    #[must_use]
    pub fn target_type(self) -> TargetFieldType {
        match self {
            CustomFieldType::Checkbox => TargetFieldType::Checkbox,
            CustomFieldType::Numeric => TargetFieldType::Number,
            CustomFieldType::Date | CustomFieldType::DateTime => TargetFieldType::Date,
            _ => TargetFieldType::String,
        }
    }
}

impl From<String> for CustomFieldType {
    fn from(value: String) -> Self {
        CustomFieldType::from_declared(&value)
    }
}

impl From<CustomFieldType> for String {
    fn from(value: CustomFieldType) -> Self {
        value.as_str().to_string()
    }
}

/// Type of a qTest property slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TargetFieldType {
    String,
    Number,
    Date,
    Checkbox,
}

impl TargetFieldType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            TargetFieldType::String => "STRING",
            TargetFieldType::Number => "NUMBER",
            TargetFieldType::Date => "DATE",
            TargetFieldType::Checkbox => "CHECKBOX",
        }
    }
}

/// A normalized source custom field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomField {
    /// Source identifier, when Zephyr supplied one
    pub id: Option<String>,

    /// Display name
    pub name: String,

    /// Declared type
    #[serde(rename = "type")]
    pub field_type: CustomFieldType,

    /// Raw value; its shape depends on `field_type`
    #[serde(default)]
    pub value: Value,
}

impl CustomField {
    /// Create a custom field
    pub fn new(name: impl Into<String>, field_type: CustomFieldType, value: Value) -> Self {
        Self {
            id: None,
            name: name.into(),
            field_type,
            value,
        }
    }

    /// Set the source identifier
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Normalize one raw `{id, name, type, value}` entry.
    ///
    /// # Errors
    ///
    /// Returns an error when the entry is not an object or has no usable name.
    pub fn from_entry(index: usize, entry: &Value) -> crate::Result<Self> {
        let obj = entry.as_object().ok_or_else(|| {
            crate::Error::invalid_custom_field(index, "entry is not an object")
        })?;

        let name = obj
            .get("name")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| crate::Error::invalid_custom_field(index, "entry has no name"))?;

        let value = obj.get("value").cloned().unwrap_or(Value::Null);
        let field_type = match obj.get("type").and_then(Value::as_str) {
            Some(declared) => CustomFieldType::from_declared(declared),
            None => CustomFieldType::infer(&value),
        };

        Ok(Self {
            id: obj.get("id").and_then(value_to_id),
            name: name.to_string(),
            field_type,
            value,
        })
    }

    /// Extract the custom-field collection carried by a source record.
    ///
    /// Both shapes Zephyr produces are accepted: a list of typed entries, or
    /// an object of `name -> value` pairs whose types are inferred. Returns
    /// `None` when the record carries no collection; each entry is normalized
    /// independently so one malformed entry does not hide the others.
    #[must_use]
    pub fn extract(record: &Record) -> Option<Vec<crate::Result<CustomField>>> {
        let (key, collection) = CUSTOM_FIELD_KEYS
            .iter()
            .find_map(|key| record.get(*key).filter(|v| !v.is_null()).map(|v| (*key, v)))?;

        let entries = match collection {
            Value::Array(items) => items
                .iter()
                .enumerate()
                .map(|(index, item)| CustomField::from_entry(index, item))
                .collect(),
            Value::Object(pairs) => pairs
                .iter()
                .map(|(name, value)| {
                    Ok(CustomField::new(
                        name.clone(),
                        CustomFieldType::infer(value),
                        value.clone(),
                    ))
                })
                .collect(),
            other => {
                tracing::debug!(key, "custom field collection has unexpected shape");
                vec![Err(crate::Error::conversion(
                    key,
                    format!("expected a list or object, found {other}"),
                ))]
            }
        };
        Some(entries)
    }
}

/// A custom field as written into a qTest `properties` list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformedField {
    pub field_id: String,
    pub field_name: String,
    pub field_type: TargetFieldType,
    pub field_value: Value,
}

impl TransformedField {
    /// Render as a JSON object for inclusion in a target record
    #[must_use]
    pub fn to_json(&self) -> Value {
        json!({
            "field_id": self.field_id,
            "field_name": self.field_name,
            "field_type": self.field_type,
            "field_value": self.field_value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_declared_type_spellings() {
        assert_eq!(CustomFieldType::from_declared("numeric"), CustomFieldType::Numeric);
        assert_eq!(
            CustomFieldType::from_declared("MULTIPLE_SELECT"),
            CustomFieldType::MultipleSelect
        );
        assert_eq!(
            CustomFieldType::from_declared("Hierarchical Select"),
            CustomFieldType::HierarchicalSelect
        );
        assert_eq!(CustomFieldType::from_declared("rich text"), CustomFieldType::Text);
    }

    #[test]
    fn test_from_entry() {
        let field = CustomField::from_entry(
            0,
            &json!({"id": 12, "name": "Max Users", "type": "numeric", "value": "10"}),
        )
        .unwrap();
        assert_eq!(field.id.as_deref(), Some("12"));
        assert_eq!(field.field_type, CustomFieldType::Numeric);
        assert_eq!(field.field_type.target_type(), TargetFieldType::Number);

        let err = CustomField::from_entry(3, &json!({"type": "text"})).unwrap_err();
        assert!(err.to_string().contains("position 3"));
        assert!(CustomField::from_entry(0, &json!("loose")).is_err());
    }

    #[test]
    fn test_extract_object_shape_infers_types() {
        let record = json!({"customFields": {"Automated": true, "Component": "UI"}});
        let fields: Vec<CustomField> = CustomField::extract(record.as_object().unwrap())
            .unwrap()
            .into_iter()
            .map(Result::unwrap)
            .collect();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].name, "Automated");
        assert_eq!(fields[0].field_type, CustomFieldType::Checkbox);
        assert_eq!(fields[1].field_type, CustomFieldType::Text);
    }

    #[test]
    fn test_extract_absent_collection() {
        let record = json!({"name": "x", "custom_fields": null});
        assert!(CustomField::extract(record.as_object().unwrap()).is_none());
    }

    #[test]
    fn test_transformed_field_json() {
        let field = TransformedField {
            field_id: "cf_env".to_string(),
            field_name: "Env".to_string(),
            field_type: TargetFieldType::String,
            field_value: json!("QA"),
        };
        assert_eq!(
            field.to_json(),
            json!({
                "field_id": "cf_env",
                "field_name": "Env",
                "field_type": "STRING",
                "field_value": "QA"
            })
        );
    }

    #[test]
    fn test_type_serde_uses_declared_names() {
        let field: CustomField =
            serde_json::from_value(json!({"id": null, "name": "a", "type": "checkbox"})).unwrap();
        assert_eq!(field.field_type, CustomFieldType::Checkbox);
        assert_eq!(serde_json::to_value(field.field_type).unwrap(), json!("CHECKBOX"));
    }
}
