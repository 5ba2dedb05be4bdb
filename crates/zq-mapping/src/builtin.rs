//! Built-in rules for the eight Zephyr entity kinds

use serde_json::json;
use zq_model::EntityKind;

use crate::rules::{EntityRule, FieldRule, OnFail, TransformKind, ValidationKind};

const OCTET_STREAM: &str = "application/octet-stream";

pub(crate) fn default_rules() -> Vec<EntityRule> {
    EntityKind::ALL.iter().map(|kind| default_rule(*kind)).collect()
}

fn text(source: &str, target: &str) -> FieldRule {
    FieldRule::new(source, target).transform(TransformKind::Trim)
}

fn date(source: &str, target: &str) -> FieldRule {
    FieldRule::new(source, target).transform(TransformKind::DateIso)
}

fn default_rule(kind: EntityKind) -> EntityRule {
    let rule = EntityRule::new(kind);
    match kind {
        EntityKind::Project => rule
            .field(
                text("name", "name")
                    .required()
                    .on_fail(OnFail::Default)
                    .default_value(json!("Unnamed Project")),
            )
            .field(FieldRule::new("description", "description"))
            .field(FieldRule::new("key", "zephyr_key").transform(TransformKind::ToString))
            .field(FieldRule::new("id", "zephyr_id").transform(TransformKind::ToString)),
        EntityKind::Folder => rule
            .field(
                text("name", "name")
                    .required()
                    .validate(ValidationKind::NotEmpty)
                    .on_fail(OnFail::Error),
            )
            .field(FieldRule::new("description", "description"))
            .field(
                FieldRule::new("parentId", "parent_zephyr_id")
                    .fallback("parent_id")
                    .fallback("parent.id")
                    .transform(TransformKind::ToString),
            )
            .field(FieldRule::new("id", "zephyr_id").transform(TransformKind::ToString)),
        EntityKind::TestCase => rule
            .field(text("name", "name"))
            .field(FieldRule::new("description", "description").fallback("objective"))
            .field(FieldRule::new("precondition", "precondition").fallback("preconditions"))
            .field(
                FieldRule::new("priority", "priority_id")
                    .fallback("priorityName")
                    .transform(TransformKind::PriorityId)
                    .on_fail(OnFail::Default)
                    .default_value(json!(3)),
            )
            .with_custom_fields(),
        EntityKind::TestStep => rule
            .field(
                FieldRule::new("description", "description")
                    .fallback("step")
                    .fallback("inline.description"),
            )
            .field(
                FieldRule::new("expectedResult", "expected")
                    .fallback("expected_result")
                    .fallback("result")
                    .fallback("inline.expectedResult"),
            )
            .field(
                FieldRule::new("testData", "test_data")
                    .fallback("test_data")
                    .fallback("data")
                    .fallback("inline.testData"),
            ),
        EntityKind::TestCycle => rule
            .field(text("name", "name"))
            .field(FieldRule::new("description", "description"))
            .with_custom_fields(),
        EntityKind::TestExecution => rule
            .field(
                FieldRule::new("status", "status")
                    .fallback("testExecutionStatus")
                    .fallback("executionStatus")
                    .transform(TransformKind::Status),
            )
            .field(
                FieldRule::new("executedBy", "executed_by")
                    .fallback("executed_by")
                    .fallback("executedById")
                    .transform(TransformKind::ToString),
            )
            .field(FieldRule::new("comment", "note").fallback("note"))
            .field(
                date("actualStartDate", "execution_start_date")
                    .fallback("executedOn")
                    .fallback("executionDate"),
            )
            .field(
                date("actualEndDate", "execution_end_date")
                    .fallback("executedOn")
                    .fallback("executionDate"),
            )
            .with_custom_fields(),
        EntityKind::TestStepResult => rule
            .field(
                FieldRule::new("description", "description")
                    .fallback("step.description")
                    .fallback("inline.description"),
            )
            .field(
                FieldRule::new("expectedResult", "expected")
                    .fallback("expected_result")
                    .fallback("step.expectedResult"),
            )
            .field(
                FieldRule::new("actualResult", "actual_result")
                    .fallback("actual_result")
                    .fallback("comment"),
            )
            .field(
                FieldRule::new("status", "status")
                    .fallback("statusName")
                    .transform(TransformKind::Status),
            ),
        EntityKind::Attachment => rule
            .field(
                text("name", "name")
                    .fallback("fileName")
                    .fallback("filename")
                    .required()
                    .validate(ValidationKind::NotEmpty)
                    .on_fail(OnFail::Error),
            )
            .field(
                FieldRule::new("contentType", "content_type")
                    .fallback("mimeType")
                    .fallback("content_type")
                    .transform(TransformKind::DefaultIfEmpty {
                        value: json!(OCTET_STREAM),
                    }),
            )
            .field(
                FieldRule::new("fileSize", "size")
                    .fallback("size")
                    .transform(TransformKind::Chain {
                        transforms: vec![
                            TransformKind::DefaultIfEmpty { value: json!(0) },
                            TransformKind::Custom {
                                name: "non_negative_integer".to_string(),
                            },
                        ],
                    })
                    .on_fail(OnFail::Default)
                    .default_value(json!(0)),
            )
            .field(FieldRule::new("content", "content")),
    }
}
