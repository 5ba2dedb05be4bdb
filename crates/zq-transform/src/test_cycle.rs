//! Test cycle transformer

use chrono::{DateTime, FixedOffset};
use serde_json::Value;
use tracing::debug;
use zq_mapping::dates::{parse_date_value, to_iso};
use zq_model::{EntityKind, Record, first_present, stringify, value_to_id};

use crate::resolver::MappingType;
use crate::result::TransformationResult;
use crate::transformer::{EntityTransformer, FOLDER_ID_PATHS, TransformContext};

const START_PATHS: [&str; 3] = ["plannedStartDate", "startDate", "start_date"];
const END_PATHS: [&str; 3] = ["plannedEndDate", "endDate", "end_date"];

/// Zephyr test cycle to qTest test cycle
///
/// Output fields: `name`, `description`, `start_date`, `end_date`,
/// `parent_id`, `properties`, `attachments`.
#[derive(Debug, Clone)]
pub struct TestCycleTransformer {
    context: TransformContext,
}

impl TestCycleTransformer {
    #[must_use]
    pub fn new(context: TransformContext) -> Self {
        Self { context }
    }

    fn date(
        source: &Record,
        paths: &[&str],
        label: &str,
        result: &mut TransformationResult,
    ) -> Option<DateTime<FixedOffset>> {
        let raw = first_present(source, paths)?;
        let parsed = parse_date_value(raw);
        if parsed.is_none() {
            result.add_warning(format!(
                "Unparseable {label} date '{}'; left empty",
                stringify(raw)
            ));
        }
        parsed
    }

    fn date_range(source: &Record, target: &mut Record, result: &mut TransformationResult) {
        let start = Self::date(source, &START_PATHS, "start", result);
        let end = Self::date(source, &END_PATHS, "end", result);
        if let (Some(start), Some(end)) = (start, end) {
            if end < start {
                result.add_warning(format!(
                    "Test cycle end date {} is before start date {}",
                    to_iso(&end),
                    to_iso(&start)
                ));
            }
        }
        let render = |date: Option<DateTime<FixedOffset>>| {
            date.map_or(Value::Null, |d| Value::String(to_iso(&d)))
        };
        target.insert("start_date".to_string(), render(start));
        target.insert("end_date".to_string(), render(end));
    }
}

impl EntityTransformer for TestCycleTransformer {
    fn kind(&self) -> EntityKind {
        EntityKind::TestCycle
    }

    fn transform(&self, source: &Record) -> TransformationResult {
        let ctx = &self.context;
        let mut result = TransformationResult::new(source.clone());
        let mut target = Record::new();

        ctx.basic_fields(EntityKind::TestCycle, source, &mut target, &mut result);
        ctx.ensure_name("test cycle", source, &mut target, &mut result);
        Self::date_range(source, &mut target, &mut result);
        ctx.custom_fields(EntityKind::TestCycle, source, &mut target, &mut result);
        ctx.attachments(source, &mut target, &mut result);

        let folder_id = first_present(source, &FOLDER_ID_PATHS).and_then(value_to_id);
        let parent_id =
            ctx.resolve(source, MappingType::FolderToCycle, folder_id, false, &mut result);
        target.insert("parent_id".to_string(), parent_id);

        debug!(
            success = result.success,
            errors = result.errors.len(),
            warnings = result.warnings.len(),
            "transformed test cycle"
        );
        result.transformed = Some(target);
        result
    }
}
