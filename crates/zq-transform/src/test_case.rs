//! Test case transformer

use serde_json::Value;
use tracing::debug;
use zq_mapping::lookup_priority;
use zq_model::{EntityKind, Record, first_present, value_to_id, value_to_text};

use crate::resolver::MappingType;
use crate::result::TransformationResult;
use crate::transformer::{EntityTransformer, FOLDER_ID_PATHS, TransformContext};

const STEP_PATHS: [&str; 3] = ["steps", "testScript.steps", "test_steps"];
const PRIORITY_PATHS: [&str; 2] = ["priority", "priorityName"];

/// Zephyr test case to qTest test case
///
/// Output fields: `name`, `description`, `precondition`, `priority_id`,
/// `module_id`, `test_steps`, `properties`, `attachments`.
#[derive(Debug, Clone)]
pub struct TestCaseTransformer {
    context: TransformContext,
}

impl TestCaseTransformer {
    #[must_use]
    pub fn new(context: TransformContext) -> Self {
        Self { context }
    }

    fn check_priority(&self, source: &Record, result: &mut TransformationResult) {
        let Some(raw) = first_present(source, &PRIORITY_PATHS) else {
            return;
        };
        match value_to_text(raw) {
            Some(name) if name.trim().is_empty() || lookup_priority(&name).is_some() => {}
            Some(name) => {
                result.add_warning(format!("Unknown priority '{name}'; using default priority 3"));
            }
            None => {
                result.add_warning(format!(
                    "Unreadable priority {raw}; using default priority 3"
                ));
            }
        }
    }
}

impl EntityTransformer for TestCaseTransformer {
    fn kind(&self) -> EntityKind {
        EntityKind::TestCase
    }

    fn transform(&self, source: &Record) -> TransformationResult {
        let ctx = &self.context;
        let mut result = TransformationResult::new(source.clone());
        let mut target = Record::new();

        ctx.basic_fields(EntityKind::TestCase, source, &mut target, &mut result);
        ctx.ensure_name("test case", source, &mut target, &mut result);
        self.check_priority(source, &mut result);

        let steps = ctx.map_sequence(
            EntityKind::TestStep,
            "Step",
            first_present(source, &STEP_PATHS),
            true,
            &mut result,
        );
        target.insert("test_steps".to_string(), Value::Array(steps));

        ctx.custom_fields(EntityKind::TestCase, source, &mut target, &mut result);
        ctx.attachments(source, &mut target, &mut result);

        let folder_id = first_present(source, &FOLDER_ID_PATHS).and_then(value_to_id);
        let module_id =
            ctx.resolve(source, MappingType::FolderToModule, folder_id, false, &mut result);
        target.insert("module_id".to_string(), module_id);

        debug!(
            success = result.success,
            errors = result.errors.len(),
            warnings = result.warnings.len(),
            "transformed test case"
        );
        result.transformed = Some(target);
        result
    }
}
