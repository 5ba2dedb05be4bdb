//! Test execution transformer

use serde_json::Value;
use tracing::debug;
use zq_model::{EntityKind, Record, first_present, value_to_id, value_to_text};

use crate::resolver::MappingType;
use crate::result::TransformationResult;
use crate::transformer::{EntityTransformer, TransformContext};

const STEP_RESULT_PATHS: [&str; 4] = ["testScriptResults", "stepResults", "testSteps", "steps"];
const TEST_CASE_PATHS: [&str; 5] = [
    "testCaseKey",
    "testCase.key",
    "testCaseId",
    "testCase.id",
    "test_case_id",
];
const TEST_CYCLE_PATHS: [&str; 5] = [
    "testCycleId",
    "testCycle",
    "cycleId",
    "cycle_id",
    "testCycleKey",
];

/// Zephyr test execution to qTest test run
///
/// Output fields: `name`, `status`, `test_case_id`, `test_cycle_id`,
/// `executed_by`, `execution_start_date`, `execution_end_date`, `note`,
/// `test_step_logs`, `properties`, `attachments`.
#[derive(Debug, Clone)]
pub struct TestExecutionTransformer {
    context: TransformContext,
}

impl TestExecutionTransformer {
    #[must_use]
    pub fn new(context: TransformContext) -> Self {
        Self { context }
    }

    /// An execution is named after its test case when the source has no name
    fn name(source: &Record, target: &mut Record) {
        let name = source
            .get("name")
            .and_then(value_to_text)
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .or_else(|| {
                first_present(source, &TEST_CASE_PATHS[..2])
                    .and_then(value_to_id)
                    .map(|key| format!("Execution of {key}"))
            });
        if let Some(name) = name {
            target.insert("name".to_string(), Value::String(name));
        }
    }
}

impl EntityTransformer for TestExecutionTransformer {
    fn kind(&self) -> EntityKind {
        EntityKind::TestExecution
    }

    fn transform(&self, source: &Record) -> TransformationResult {
        let ctx = &self.context;
        let mut result = TransformationResult::new(source.clone());
        let mut target = Record::new();

        ctx.basic_fields(EntityKind::TestExecution, source, &mut target, &mut result);
        Self::name(source, &mut target);
        ctx.ensure_name("test execution", source, &mut target, &mut result);

        let logs = ctx.map_sequence(
            EntityKind::TestStepResult,
            "Step result",
            first_present(source, &STEP_RESULT_PATHS),
            false,
            &mut result,
        );
        target.insert("test_step_logs".to_string(), Value::Array(logs));

        ctx.custom_fields(EntityKind::TestExecution, source, &mut target, &mut result);
        ctx.attachments(source, &mut target, &mut result);

        let test_case = first_present(source, &TEST_CASE_PATHS).and_then(value_to_id);
        let test_case_id =
            ctx.resolve(source, MappingType::TestCase, test_case, true, &mut result);
        target.insert("test_case_id".to_string(), test_case_id);

        let test_cycle = first_present(source, &TEST_CYCLE_PATHS).and_then(value_to_id);
        let test_cycle_id =
            ctx.resolve(source, MappingType::TestCycle, test_cycle, false, &mut result);
        target.insert("test_cycle_id".to_string(), test_cycle_id);

        debug!(
            success = result.success,
            errors = result.errors.len(),
            warnings = result.warnings.len(),
            "transformed test execution"
        );
        result.transformed = Some(target);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TransformerConfig;
    use crate::resolver::InMemoryLookup;
    use serde_json::json;
    use std::sync::Arc;
    use zq_mapping::new_default_registry;

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    fn transformer(config: TransformerConfig) -> TestExecutionTransformer {
        let mut table = InMemoryLookup::new();
        table
            .insert("PROJ", MappingType::TestCase, "PROJ-T1", "4411")
            .insert("PROJ", MappingType::TestCycle, "PROJ-R1", "7001");
        TestExecutionTransformer::new(TransformContext::new(
            Arc::new(new_default_registry()),
            Arc::new(table),
            config,
        ))
    }

    #[test]
    fn test_resolves_references_and_names_after_test_case() {
        let result = transformer(TransformerConfig::default()).transform(&record(json!({
            "key": "PROJ-E1",
            "testCase": {"key": "PROJ-T1"},
            "testCycle": {"key": "PROJ-R1"},
            "status": "Pass",
            "executedBy": "jdoe",
            "comment": "all good",
            "actualEndDate": "2024-05-02T10:30:00Z"
        })));
        assert!(result.success, "{:?}", result.errors);
        let target = result.transformed.unwrap();
        assert_eq!(target["name"], json!("Execution of PROJ-T1"));
        assert_eq!(target["status"], json!("PASSED"));
        assert_eq!(target["test_case_id"], json!("4411"));
        assert_eq!(target["test_cycle_id"], json!("7001"));
        assert_eq!(target["executed_by"], json!("jdoe"));
        assert_eq!(target["note"], json!("all good"));
        assert_eq!(target["execution_end_date"], json!("2024-05-02T10:30:00+00:00"));
    }

    #[test]
    fn test_missing_test_case_depends_on_strictness() {
        let source = record(json!({"key": "PROJ-E2", "name": "run"}));

        let lenient = transformer(TransformerConfig::default()).transform(&source);
        assert!(lenient.success);
        assert!(lenient.warnings.iter().any(|w| w.contains("test case")));

        let strict = transformer(TransformerConfig::default().strict(true)).transform(&source);
        assert!(!strict.success);
        assert_eq!(strict.transformed.unwrap()["test_case_id"], Value::Null);
    }

    #[test]
    fn test_unknown_test_case_in_strict_mode_is_error() {
        let result = transformer(TransformerConfig::default().strict(true))
            .transform(&record(json!({"name": "run", "testCaseKey": "PROJ-T404"})));
        assert!(!result.success);
        assert!(result.errors.iter().any(|e| e.contains("PROJ-T404")));
    }

    #[test]
    fn test_step_logs_carry_status() {
        let result = transformer(TransformerConfig::default()).transform(&record(json!({
            "name": "run",
            "testCaseKey": "PROJ-T1",
            "testScriptResults": [
                {"statusName": "Fail", "actualResult": "500 error"},
                {"status": null}
            ]
        })));
        let logs = result.transformed.unwrap()["test_step_logs"].clone();
        assert_eq!(logs[0]["status"], json!("FAILED"));
        assert_eq!(logs[0]["actual_result"], json!("500 error"));
        assert_eq!(logs[1]["status"], json!("NOT_RUN"));
        assert_eq!(logs[1]["order"], json!(2));
    }
}
