//! Integration test: custom-field coercion
//!
//! Table, hierarchy and user fields in both collection shapes.

use serde_json::{Value, json};
use zq_mapping::{CustomFieldCoercer, CustomFieldError, CustomFieldProfile, Error};
use zq_model::{CustomField, Record};

fn entries(value: Value) -> Vec<zq_model::Result<CustomField>> {
    CustomField::extract(value.as_object().unwrap()).unwrap()
}

#[test]
fn test_table_with_object_rows() -> anyhow::Result<()> {
    let source = json!({"customFields": [{
        "name": "Matrix",
        "type": "TABLE",
        "value": [
            {"Input": "a", "Expected": "b"},
            {"Input": "c", "Expected": "d"}
        ]
    }]});
    let mapping = CustomFieldProfile::Generic.map(entries(source), &CustomFieldCoercer::new())?;
    assert_eq!(
        mapping.fields[0].field_value,
        json!("Expected | Input\n----------------\nb | a\nd | c")
    );
    Ok(())
}

#[test]
fn test_table_with_header_row() -> anyhow::Result<()> {
    let source = json!({"customFields": [{
        "name": "Matrix",
        "type": "TABLE",
        "value": [["Input", "Expected"], ["a", "b", "extra"], ["c"]]
    }]});
    let mapping = CustomFieldProfile::Generic.map(entries(source), &CustomFieldCoercer::new())?;
    assert_eq!(
        mapping.fields[0].field_value,
        json!("Input | Expected\n----------------\na | b\nc | ")
    );
    Ok(())
}

#[test]
fn test_hierarchy_and_object_shape() -> anyhow::Result<()> {
    let source = json!({"custom_fields": {
        "Region": {"id": 4, "name": "EMEA"},
        "Flaky": true
    }});
    let mapping = CustomFieldProfile::Generic.map(entries(source), &CustomFieldCoercer::new())?;
    assert_eq!(mapping.fields.len(), 2);

    let flaky = mapping.fields.iter().find(|f| f.field_name == "Flaky").unwrap();
    assert_eq!(flaky.field_value, json!(true));
    assert_eq!(flaky.field_id, "cf_flaky");

    let region = mapping.fields.iter().find(|f| f.field_name == "Region").unwrap();
    assert_eq!(region.field_value, json!("EMEA"));
    Ok(())
}

#[test]
fn test_cascading_select_path() -> anyhow::Result<()> {
    let source = json!({"customFields": [{
        "id": "cf-88",
        "name": "Region",
        "type": "CASCADING_SELECT",
        "value": [{"label": "EMEA"}, {"label": "Germany"}]
    }]});
    let mapping = CustomFieldProfile::Generic.map(entries(source), &CustomFieldCoercer::new())?;
    assert_eq!(mapping.fields[0].field_id, "cf-88");
    assert_eq!(mapping.fields[0].field_value, json!("EMEA > Germany"));
    Ok(())
}

#[test]
fn test_malformed_entry_becomes_warning() -> anyhow::Result<()> {
    let source: Record = json!({"customFields": [
        "not an object",
        {"type": "TEXT", "value": "nameless"},
        {"name": "Owner", "type": "USER", "value": {"displayName": "Dana"}}
    ]})
    .as_object()
    .cloned()
    .unwrap();
    let mapping = CustomFieldProfile::Generic.map(
        CustomField::extract(&source).unwrap(),
        &CustomFieldCoercer::new(),
    )?;
    assert_eq!(mapping.fields.len(), 1);
    assert_eq!(mapping.fields[0].field_value, json!("Dana"));
    assert_eq!(mapping.warnings.len(), 2);
    Ok(())
}

#[test]
fn test_failing_override_is_unexpected() {
    let mut coercer = CustomFieldCoercer::new();
    coercer.register_override("Owner", |_| Err(Error::Transform("directory offline".into())));
    let source = json!({"customFields": [{"name": "owner", "type": "TEXT", "value": "x"}]});
    let err = CustomFieldProfile::Generic
        .map(entries(source), &coercer)
        .unwrap_err();
    assert!(err.is_unexpected());
    assert!(matches!(err, Error::CustomField(CustomFieldError::Unexpected { .. })));
}
