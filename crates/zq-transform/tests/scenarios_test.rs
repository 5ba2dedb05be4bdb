//! Integration test: transformer scenarios
//!
//! End-to-end behavior of the three transformers over Zephyr-shaped records,
//! including partial failure and lookup outages.

use serde_json::{Value, json};
use std::sync::Arc;
use zq_mapping::{CustomFieldCoercer, MappingRegistry, new_default_registry};
use zq_model::{EntityKind, Record};
use zq_transform::{
    EntityTransformer, InMemoryLookup, LookupError, MappingLookup, MappingType, NoLookup,
    TestCaseTransformer, TransformContext, TransformerConfig, Transformers,
};

fn record(value: Value) -> Record {
    value.as_object().cloned().unwrap()
}

fn transformers(config: TransformerConfig) -> Transformers {
    Transformers::new(TransformContext::with_defaults(config))
}

struct OfflineLookup;

impl MappingLookup for OfflineLookup {
    fn lookup(&self, _: &str, _: MappingType, _: &str) -> Result<Option<String>, LookupError> {
        Err(LookupError::Backend("connection pool exhausted".to_string()))
    }
}

#[test]
fn test_case_without_name_gets_placeholder() {
    let result = transformers(TransformerConfig::default())
        .transform_record(EntityKind::TestCase, &record(json!({"name": null, "steps": []})));

    assert!(result.success, "{:?}", result.errors);
    let target = result.transformed.unwrap();
    assert!(target["name"].as_str().is_some_and(|name| !name.is_empty()));
    assert!(result.warnings.iter().any(|w| w.contains("name")));
    assert_eq!(target["test_steps"], json!([]));
}

#[test]
fn test_numeric_custom_field_warns() {
    let result = transformers(TransformerConfig::default()).transform_record(
        EntityKind::TestCase,
        &record(json!({
            "name": "Load",
            "customFields": [{"name": "Max Users", "type": "numeric", "value": "not_a_number"}]
        })),
    );

    assert!(result.success);
    assert!(result.warnings.iter().any(|w| w.contains("numeric")));
    let properties = result.transformed.unwrap()["properties"].clone();
    assert_eq!(properties[0]["field_id"], json!("cf_max_users"));
    assert_eq!(properties[0]["field_value"], json!(0));
}

#[test]
fn test_execution_statuses_at_run_and_step_level() {
    let transformers = transformers(TransformerConfig::default());
    let cases = [
        (json!("PASS"), "PASSED"),
        (json!("FAIL"), "FAILED"),
        (json!("BLOCKED"), "BLOCKED"),
        (json!("WIP"), "IN_PROGRESS"),
        (json!("UNEXECUTED"), "NOT_RUN"),
        (json!("unknown_status"), "NOT_RUN"),
        (Value::Null, "NOT_RUN"),
    ];
    for (status, expected) in cases {
        let source = record(json!({
            "name": "run",
            "status": status,
            "testScriptResults": [{"description": "step", "status": status}]
        }));
        let result = transformers.transform_record(EntityKind::TestExecution, &source);
        let target = result.transformed.unwrap();
        assert_eq!(target["status"], json!(expected), "run status for {status}");
        assert_eq!(
            target["test_step_logs"][0]["status"],
            json!(expected),
            "step status for {status}"
        );
    }
}

#[test]
fn test_null_steps_are_excluded() {
    let result = transformers(TransformerConfig::default()).transform_record(
        EntityKind::TestCase,
        &record(json!({
            "name": "Steps",
            "steps": [
                {"description": "one"},
                null,
                {"description": "two"},
                null
            ]
        })),
    );

    assert!(result.success);
    let steps = result.transformed.unwrap()["test_steps"].clone();
    assert_eq!(steps.as_array().unwrap().len(), 2);
    assert_eq!(steps[1]["description"], json!("two"));
    assert_eq!(steps[1]["order"], json!(2));
    assert_eq!(result.warnings.len(), 2);
}

#[test]
fn test_null_steps_fail_in_strict_mode() {
    let result = transformers(TransformerConfig::default().strict(true)).transform_record(
        EntityKind::TestCase,
        &record(json!({"name": "Steps", "steps": [null, {"description": "one"}]})),
    );

    assert!(!result.success);
    assert_eq!(result.errors, vec!["Step 1 is null; skipped".to_string()]);
    let steps = result.transformed.unwrap()["test_steps"].clone();
    assert_eq!(steps.as_array().unwrap().len(), 1);
}

#[test]
fn test_transform_is_deterministic() -> anyhow::Result<()> {
    let transformers = transformers(TransformerConfig::default());
    let source = record(json!({
        "key": "PROJ-T7",
        "name": "Checkout",
        "priority": "Low",
        "customFields": {
            "Browsers": ["Firefox", "Chrome"],
            "Automated": true,
            "Owner": {"id": 5, "name": "QA"}
        },
        "steps": [{"description": "Pay", "expectedResult": "Receipt"}],
        "attachments": [{"fileName": "cart.png", "fileSize": 2048}]
    }));

    let first = transformers.transform_record(EntityKind::TestCase, &source);
    let second = transformers.transform_record(EntityKind::TestCase, &source);
    let first = serde_json::to_string(&first.transformed)?;
    let second = serde_json::to_string(&second.transformed)?;
    assert_eq!(first, second);
    Ok(())
}

#[test]
fn test_lookup_failure_mentions_database() {
    let context = TransformContext::new(
        Arc::new(new_default_registry()),
        Arc::new(OfflineLookup),
        TransformerConfig::default().with_project_key("PROJ"),
    );
    let result = TestCaseTransformer::new(context)
        .transform(&record(json!({"name": "x", "folderId": 12})));

    assert!(!result.success);
    assert!(result.errors[0].contains("database"));
    assert!(result.errors[0].contains("connection pool exhausted"));
    // Earlier steps still produced their output.
    assert_eq!(result.transformed.unwrap()["name"], json!("x"));
}

#[test]
fn test_unexpected_custom_field_error_fails_transformation() {
    let mut registry = new_default_registry();
    registry
        .coercer_mut()
        .register_override("Owner", |_| {
            Err(zq_mapping::Error::Transform("directory offline".into()))
        });
    let context = TransformContext::new(
        Arc::new(registry),
        Arc::new(NoLookup),
        TransformerConfig::default(),
    );
    let result = TestCaseTransformer::new(context).transform(&record(json!({
        "key": "PROJ-T1",
        "name": "x",
        "customFields": [{"name": "Owner", "type": "USER", "value": "dana"}]
    })));

    assert!(!result.success);
    assert!(result.errors[0].contains("Unexpected"));
    // The reference property is still written.
    let properties = result.transformed.unwrap()["properties"].clone();
    assert_eq!(properties[0]["field_id"], json!("zephyr_key"));
}

#[test]
fn test_malformed_custom_field_only_warns() {
    let result = transformers(TransformerConfig::default()).transform_record(
        EntityKind::TestCycle,
        &record(json!({
            "name": "c",
            "customFields": [{"value": 1}, {"name": "Env", "value": "qa"}]
        })),
    );

    assert!(result.success);
    assert!(result.warnings.iter().any(|w| w.contains("Malformed")));
    let properties = result.transformed.unwrap()["properties"].clone();
    assert_eq!(properties.as_array().unwrap().len(), 1);
}

#[test]
fn test_bad_attachment_is_skipped() {
    let result = transformers(TransformerConfig::default()).transform_record(
        EntityKind::TestExecution,
        &record(json!({
            "name": "run",
            "attachments": [
                {"fileName": "ok.txt", "content": "aGVsbG8="},
                {"fileSize": 3},
                "junk"
            ]
        })),
    );

    let attachments = result.transformed.unwrap()["attachments"].clone();
    assert_eq!(
        attachments,
        json!([{
            "name": "ok.txt",
            "content_type": "application/octet-stream",
            "size": 0,
            "content": "aGVsbG8="
        }])
    );
    assert_eq!(result.warnings.iter().filter(|w| w.contains("Attachment")).count(), 2);
}

#[test]
fn test_attachment_sizes_and_content() {
    let result = transformers(TransformerConfig::default()).transform_record(
        EntityKind::TestCase,
        &record(json!({
            "name": "Upload",
            "attachments": [
                {"fileName": "a.txt", "fileSize": "12"},
                {"fileName": "b.txt", "fileSize": 3.5},
                {"fileName": "c.txt", "content": 123}
            ]
        })),
    );

    assert!(result.success, "{:?}", result.errors);
    let attachments = result.transformed.unwrap()["attachments"].clone();
    assert_eq!(attachments[0]["size"], json!(12));
    assert_eq!(attachments[1]["size"], json!(0));
    assert_eq!(attachments[2]["size"], json!(0));
    assert_eq!(attachments[2]["content"], Value::Null);
    assert!(
        result
            .warnings
            .iter()
            .any(|w| w.contains("Attachment 3 content is not a string"))
    );
}

#[test]
fn test_batch_keeps_order() {
    let lookup = {
        let mut table = InMemoryLookup::new();
        table.insert("PROJ", MappingType::FolderToModule, "3", "300");
        table
    };
    let mut coercer = CustomFieldCoercer::new();
    coercer.register_override("Build", |value| Ok(json!(format!("build-{value}"))));
    let mut registry =
        MappingRegistry::with_parts(zq_mapping::FunctionRegistry::with_builtins(), coercer);
    registry.apply_overrides(new_default_registry().to_rule_set());

    let transformers = Transformers::new(TransformContext::new(
        Arc::new(registry),
        Arc::new(lookup),
        TransformerConfig::default().with_project_key("PROJ"),
    ));
    let sources = vec![
        record(json!({"name": "a", "folderId": 3, "customFields": {"Build": 7}})),
        record(json!({"name": null})),
        record(json!({"name": "c", "folderId": 4})),
    ];
    let results = transformers.transform_batch(EntityKind::TestCase, &sources);

    assert_eq!(results.len(), 3);
    let first = results[0].transformed.as_ref().unwrap();
    assert_eq!(first["module_id"], json!("300"));
    assert_eq!(first["properties"][0]["field_value"], json!("build-7"));
    assert_eq!(results[1].original, sources[1]);
    assert!(results[2].warnings.iter().any(|w| w.contains("'4'")));
    assert!(results.iter().all(|r| r.success));
}
