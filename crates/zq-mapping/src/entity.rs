//! Entity-level mapping
//!
//! Runs an [`EntityRule`]'s field rules in declared order and gathers the
//! results into one target record.

use serde_json::Value;
use tracing::{debug, warn};
use zq_model::{CustomField, Record};

use crate::coercer::CustomFieldCoercer;
use crate::custom_fields::{CustomFieldMapping, CustomFieldProfile};
use crate::functions::FunctionRegistry;
use crate::rules::{EntityRule, OnFail};

/// Key under which mapped custom fields are attached
pub const PROPERTIES_KEY: &str = "properties";

/// A mapped target record and the non-fatal problems met while building it
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MappedEntity {
    pub record: Record,
    pub warnings: Vec<String>,
}

impl EntityRule {
    /// Map the standard fields of a source record.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::FieldRejected`] as soon as a field whose policy
    /// is [`OnFail::Error`] fails; no partial record is returned.
    pub fn map_fields(
        &self,
        source: &Record,
        functions: &FunctionRegistry,
    ) -> crate::Result<MappedEntity> {
        let mut mapped = MappedEntity::default();
        for rule in &self.fields {
            let outcome = rule.validate_and_transform(rule.read(source), functions)?;
            if let Some(message) = outcome.error {
                warn!(
                    kind = %self.source_kind,
                    field = %rule.source_field,
                    %message,
                    "field degraded"
                );
                mapped.warnings.push(message);
            }
            if !outcome.is_valid && rule.on_fail == OnFail::Skip {
                debug!(field = %rule.target_field, "skipping invalid field");
                continue;
            }
            mapped.record.insert(rule.target_field.clone(), outcome.value);
        }
        Ok(mapped)
    }

    /// Map the record's custom-field collection with this kind's profile.
    ///
    /// Returns `None` when custom fields are disabled for the kind or the
    /// record carries no collection.
    ///
    /// # Errors
    ///
    /// Returns an unexpected custom-field error when a coercion override fails.
    pub fn map_custom_fields(
        &self,
        source: &Record,
        coercer: &CustomFieldCoercer,
    ) -> crate::Result<Option<CustomFieldMapping>> {
        if !self.custom_fields_enabled {
            return Ok(None);
        }
        let Some(entries) = CustomField::extract(source) else {
            return Ok(None);
        };
        CustomFieldProfile::for_kind(self.source_kind)
            .map(entries, coercer)
            .map(Some)
    }

    /// Map a whole source record: standard fields, then custom fields under
    /// `properties`.
    ///
    /// # Errors
    ///
    /// Returns an error on a hard field rejection or a failing coercion override.
    pub fn map(
        &self,
        source: &Record,
        functions: &FunctionRegistry,
        coercer: &CustomFieldCoercer,
    ) -> crate::Result<MappedEntity> {
        let mut mapped = self.map_fields(source, functions)?;
        if let Some(custom) = self.map_custom_fields(source, coercer)? {
            mapped.warnings.extend(custom.warnings);
            let properties = custom.fields.iter().map(|f| f.to_json()).collect();
            mapped
                .record
                .insert(PROPERTIES_KEY.to_string(), Value::Array(properties));
        }
        Ok(mapped)
    }
}
