//! Transformer orchestration
//!
//! The steps every transformer shares live on [`TransformContext`]. Each
//! step reports into the [`TransformationResult`] rather than returning
//! early, so a failure in one step never stops the steps after it.

use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};
use zq_mapping::entity::PROPERTIES_KEY;
use zq_mapping::{MappingRegistry, new_default_registry};
use zq_model::{
    EntityKind, Record, TargetFieldType, TransformedField, first_present, stringify, value_to_id,
};

use crate::config::TransformerConfig;
use crate::resolver::{MappingLookup, MappingType, NoLookup};
use crate::result::TransformationResult;
use crate::test_case::TestCaseTransformer;
use crate::test_cycle::TestCycleTransformer;
use crate::test_execution::TestExecutionTransformer;

const ATTACHMENTS_KEY: &str = "attachments";
const PROJECT_KEY_PATHS: [&str; 3] = ["projectKey", "project.key", "project_key"];
pub(crate) const FOLDER_ID_PATHS: [&str; 3] = ["folderId", "folder.id", "folder_id"];

/// Turns one source record of a fixed kind into a target record
pub trait EntityTransformer: Send + Sync {
    /// Source kind this transformer accepts
    fn kind(&self) -> EntityKind;

    /// Transform a source record. Never fails; problems are reported in the result.
    fn transform(&self, source: &Record) -> TransformationResult;
}

/// Registry, lookup and settings shared by the transformers
#[derive(Clone)]
pub struct TransformContext {
    registry: Arc<MappingRegistry>,
    lookup: Arc<dyn MappingLookup>,
    config: TransformerConfig,
}

impl fmt::Debug for TransformContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformContext")
            .field("registry", &self.registry)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl TransformContext {
    #[must_use]
    pub fn new(
        registry: Arc<MappingRegistry>,
        lookup: Arc<dyn MappingLookup>,
        config: TransformerConfig,
    ) -> Self {
        Self {
            registry,
            lookup,
            config,
        }
    }

    /// Built-in rules, no recorded id mappings
    #[must_use]
    pub fn with_defaults(config: TransformerConfig) -> Self {
        Self::new(Arc::new(new_default_registry()), Arc::new(NoLookup), config)
    }

    #[must_use]
    pub fn registry(&self) -> &MappingRegistry {
        &self.registry
    }

    #[must_use]
    pub fn config(&self) -> &TransformerConfig {
        &self.config
    }

    /// Missing data: an error in strict mode, a warning otherwise
    pub(crate) fn report_missing(&self, result: &mut TransformationResult, message: String) {
        if self.config.strict_mode {
            result.add_error(message);
        } else {
            result.add_warning(message);
        }
    }

    /// Map the kind's standard fields into `target`
    pub(crate) fn basic_fields(
        &self,
        kind: EntityKind,
        source: &Record,
        target: &mut Record,
        result: &mut TransformationResult,
    ) {
        let mapped = self.registry.map_fields(kind, source).map_err(crate::Error::from);
        if let Some(mapped) = result.check_step("Basic field mapping", mapped) {
            result.extend_warnings(mapped.warnings);
            target.extend(mapped.record);
        }
    }

    /// Guarantee a non-empty `name`, synthesizing one when the source has none
    pub(crate) fn ensure_name(
        &self,
        label: &str,
        source: &Record,
        target: &mut Record,
        result: &mut TransformationResult,
    ) {
        let has_name = target
            .get("name")
            .is_some_and(|name| !stringify(name).trim().is_empty());
        if has_name {
            return;
        }
        let placeholder = match first_present(source, &["key", "id"]).and_then(value_to_id) {
            Some(reference) => format!("Unnamed {label} {reference}"),
            None => format!("Unnamed {label}"),
        };
        self.report_missing(
            result,
            format!("Missing {label} name; using placeholder '{placeholder}'"),
        );
        target.insert("name".to_string(), Value::String(placeholder));
    }

    /// Map a list of nested records (steps, step results) one by one
    ///
    /// Null or non-object elements are skipped. With `require_description`,
    /// an element without a description gets a placeholder, or is dropped in
    /// strict mode. Kept elements are numbered from 1 in `order`.
    pub(crate) fn map_sequence(
        &self,
        item_kind: EntityKind,
        label: &str,
        items: Option<&Value>,
        require_description: bool,
        result: &mut TransformationResult,
    ) -> Vec<Value> {
        let items = match items {
            None => return Vec::new(),
            Some(Value::Array(items)) => items,
            Some(other) => {
                self.report_missing(
                    result,
                    format!("{label} list is not a list: {other}; ignored"),
                );
                return Vec::new();
            }
        };

        let mut mapped = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            let position = index + 1;
            let Some(object) = item.as_object() else {
                let problem = if item.is_null() { "is null" } else { "is not an object" };
                self.report_missing(result, format!("{label} {position} {problem}; skipped"));
                continue;
            };

            let entity = match self.registry.map_fields(item_kind, object) {
                Ok(entity) => entity,
                Err(e) => {
                    result.add_error(format!("{label} {position} could not be mapped: {e}"));
                    continue;
                }
            };
            result.extend_warnings(entity.warnings);
            let mut record = entity.record;

            if require_description {
                let described = record
                    .get("description")
                    .is_some_and(|d| !stringify(d).trim().is_empty());
                if !described {
                    if self.config.strict_mode {
                        result.add_error(format!("{label} {position} has no description; dropped"));
                        continue;
                    }
                    let placeholder = format!("{label} {position}");
                    result.add_warning(format!(
                        "{label} {position} has no description; using '{placeholder}'"
                    ));
                    record.insert("description".to_string(), Value::String(placeholder));
                }
            }

            record.insert("order".to_string(), Value::from(mapped.len() + 1));
            mapped.push(Value::Object(record));
        }
        debug!(label, kept = mapped.len(), total = items.len(), "mapped nested records");
        mapped
    }

    /// Map custom fields into `properties`, adding the Zephyr key reference
    pub(crate) fn custom_fields(
        &self,
        kind: EntityKind,
        source: &Record,
        target: &mut Record,
        result: &mut TransformationResult,
    ) {
        let mut properties = Vec::new();
        match self.registry.map_custom_fields(kind, source) {
            Ok(Some(mapping)) => {
                result.extend_warnings(mapping.warnings);
                properties.extend(mapping.fields.iter().map(TransformedField::to_json));
            }
            Ok(None) => {}
            Err(e) if e.is_unexpected() => result.add_error(e.to_string()),
            Err(e) => result.add_warning(format!("Custom fields not mapped: {e}")),
        }

        if let Some(key) = source.get("key").and_then(value_to_id) {
            let reference = TransformedField {
                field_id: "zephyr_key".to_string(),
                field_name: "Zephyr Key".to_string(),
                field_type: TargetFieldType::String,
                field_value: Value::String(key),
            };
            properties.push(reference.to_json());
        }
        target.insert(PROPERTIES_KEY.to_string(), Value::Array(properties));
    }

    /// Map attachments independently; a bad one is skipped with a warning
    pub(crate) fn attachments(
        &self,
        source: &Record,
        target: &mut Record,
        result: &mut TransformationResult,
    ) {
        let mut mapped = Vec::new();
        if self.config.include_attachments {
            match source.get(ATTACHMENTS_KEY) {
                None | Some(Value::Null) => {}
                Some(Value::Array(items)) => {
                    for (index, item) in items.iter().enumerate() {
                        if let Some(record) = self.attachment(index + 1, item, result) {
                            mapped.push(Value::Object(record));
                        }
                    }
                }
                Some(other) => {
                    result.add_warning(format!("Attachments are not a list: {other}; ignored"));
                }
            }
        }
        target.insert(ATTACHMENTS_KEY.to_string(), Value::Array(mapped));
    }

    fn attachment(
        &self,
        position: usize,
        item: &Value,
        result: &mut TransformationResult,
    ) -> Option<Record> {
        let Some(object) = item.as_object() else {
            result.add_warning(format!("Attachment {position} is malformed; skipped"));
            return None;
        };
        match self.registry.map_entity(EntityKind::Attachment, object) {
            Ok(entity) => {
                result.extend_warnings(entity.warnings);
                let mut record = entity.record;
                let bad_content = record
                    .get("content")
                    .is_some_and(|content| !content.is_null() && !content.is_string());
                if bad_content {
                    result.add_warning(format!(
                        "Attachment {position} content is not a string; content dropped"
                    ));
                    record.insert("content".to_string(), Value::Null);
                }
                Some(record)
            }
            Err(e) => {
                result.add_warning(format!("Attachment {position} skipped: {e}"));
                None
            }
        }
    }

    /// Project key for lookups: configured, else from the record, else the
    /// prefix of the record's Zephyr key
    pub(crate) fn project_key(&self, source: &Record) -> Option<String> {
        self.config
            .project_key
            .clone()
            .or_else(|| first_present(source, &PROJECT_KEY_PATHS).and_then(value_to_id))
            .or_else(|| {
                let key = source.get("key").and_then(value_to_id)?;
                let (prefix, _) = key.split_once('-')?;
                (!prefix.is_empty()).then(|| prefix.to_string())
            })
    }

    /// Resolve a Zephyr reference to its qTest id
    ///
    /// A missing reference or mapping is a warning, or an error in strict
    /// mode when `required`. A failing lookup store is always an error.
    pub(crate) fn resolve(
        &self,
        source: &Record,
        mapping_type: MappingType,
        source_id: Option<String>,
        required: bool,
        result: &mut TransformationResult,
    ) -> Value {
        let label = mapping_type.target_label();
        let miss = |result: &mut TransformationResult, message: String| {
            if required {
                self.report_missing(result, message);
            } else {
                result.add_warning(message);
            }
        };

        let Some(source_id) = source_id else {
            if required {
                self.report_missing(result, format!("Missing {label} reference"));
            }
            return Value::Null;
        };
        let Some(project_key) = self.project_key(source) else {
            miss(
                result,
                format!("No project key to resolve {label} '{source_id}'"),
            );
            return Value::Null;
        };

        match self.lookup.lookup(&project_key, mapping_type, &source_id) {
            Ok(Some(target_id)) => {
                debug!(%mapping_type, source_id, target_id, "resolved reference");
                Value::String(target_id)
            }
            Ok(None) => {
                miss(
                    result,
                    format!("No {label} mapping found for '{source_id}' in project {project_key}"),
                );
                Value::Null
            }
            Err(e) => {
                result.add_error(format!(
                    "Failed to resolve {label} '{source_id}' from the mapping database: {e}"
                ));
                Value::Null
            }
        }
    }
}

/// The three transformers behind one kind-based entry point
#[derive(Debug, Clone)]
pub struct Transformers {
    test_case: TestCaseTransformer,
    test_cycle: TestCycleTransformer,
    test_execution: TestExecutionTransformer,
}

impl Transformers {
    #[must_use]
    pub fn new(context: TransformContext) -> Self {
        Self {
            test_case: TestCaseTransformer::new(context.clone()),
            test_cycle: TestCycleTransformer::new(context.clone()),
            test_execution: TestExecutionTransformer::new(context),
        }
    }

    /// Transformer for `kind`, if there is one
    #[must_use]
    pub fn get(&self, kind: EntityKind) -> Option<&dyn EntityTransformer> {
        match kind {
            EntityKind::TestCase => Some(&self.test_case),
            EntityKind::TestCycle => Some(&self.test_cycle),
            EntityKind::TestExecution => Some(&self.test_execution),
            _ => None,
        }
    }

    /// Transform one record of the given kind
    ///
    /// Kinds without a transformer produce a failed result.
    #[must_use]
    pub fn transform_record(&self, kind: EntityKind, source: &Record) -> TransformationResult {
        match self.get(kind) {
            Some(transformer) => transformer.transform(source),
            None => TransformationResult::failed(
                source.clone(),
                crate::Error::UnsupportedKind(kind).to_string(),
            ),
        }
    }

    /// Transform records in order, one result per record
    #[must_use]
    pub fn transform_batch(
        &self,
        kind: EntityKind,
        sources: &[Record],
    ) -> Vec<TransformationResult> {
        let results: Vec<TransformationResult> = sources
            .iter()
            .map(|source| self.transform_record(kind, source))
            .collect();
        let failed = results.iter().filter(|r| !r.success).count();
        info!(%kind, total = results.len(), failed, "transformed batch");
        results
    }
}
