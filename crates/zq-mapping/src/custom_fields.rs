//! Per-kind custom-field mappers
//!
//! Each entity kind owns a profile naming the custom fields that its standard
//! field set already covers. Everything else becomes a qTest property.

use tracing::debug;
use zq_model::{CustomField, EntityKind, TransformedField};

use crate::coercer::CustomFieldCoercer;
use crate::CustomFieldError;

/// Which mapper handles an entity kind's custom fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CustomFieldProfile {
    TestCase,
    TestCycle,
    TestExecution,
    Generic,
}

/// Mapped properties plus the problems noticed while mapping them
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CustomFieldMapping {
    pub fields: Vec<TransformedField>,
    pub warnings: Vec<String>,
}

impl CustomFieldProfile {
    #[must_use]
    pub fn for_kind(kind: EntityKind) -> Self {
        match kind {
            EntityKind::TestCase => CustomFieldProfile::TestCase,
            EntityKind::TestCycle => CustomFieldProfile::TestCycle,
            EntityKind::TestExecution => CustomFieldProfile::TestExecution,
            _ => CustomFieldProfile::Generic,
        }
    }

    /// Lower-case names skipped because a standard field carries them
    #[must_use]
    pub fn reserved_names(self) -> &'static [&'static str] {
        match self {
            CustomFieldProfile::TestCase => &["name", "description", "precondition", "priority"],
            CustomFieldProfile::TestCycle => &[
                "name",
                "description",
                "start date",
                "end date",
                "planned start date",
                "planned end date",
            ],
            CustomFieldProfile::TestExecution | CustomFieldProfile::Generic => &[],
        }
    }

    fn is_reserved(self, name: &str) -> bool {
        let normalized = name.trim().to_lowercase().replace('_', " ");
        self.reserved_names().contains(&normalized.as_str())
    }

    /// Map normalized custom-field entries to qTest properties.
    ///
    /// Entries that failed normalization and values that could only be
    /// coerced partially become warnings; the remaining entries still map.
    ///
    /// # Errors
    ///
    /// Returns [`CustomFieldError::Unexpected`] when a coercion override fails.
    pub fn map(
        self,
        entries: Vec<zq_model::Result<CustomField>>,
        coercer: &CustomFieldCoercer,
    ) -> crate::Result<CustomFieldMapping> {
        let mut mapping = CustomFieldMapping::default();
        for entry in entries {
            let field = match entry {
                Ok(field) => field,
                Err(e) => {
                    mapping
                        .warnings
                        .push(CustomFieldError::Malformed(e.to_string()).to_string());
                    continue;
                }
            };
            if self.is_reserved(&field.name) {
                debug!(
                    field = %field.name,
                    profile = ?self,
                    "custom field covered by standard field"
                );
                continue;
            }

            let coerced = coercer.coerce(&field.name, field.field_type, &field.value)?;
            if let Some(warning) = coerced.warning {
                mapping.warnings.push(warning);
            }
            mapping.fields.push(TransformedField {
                field_id: field.id.clone().unwrap_or_else(|| generated_field_id(&field.name)),
                field_name: field.name.clone(),
                field_type: field.field_type.target_type(),
                field_value: coerced.value,
            });
        }
        Ok(mapping)
    }
}

/// Identifier for a custom field that arrived without one
#[must_use]
pub fn generated_field_id(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for ch in name.trim().chars() {
        if ch.is_alphanumeric() {
            slug.extend(ch.to_lowercase());
        } else if !slug.ends_with('_') {
            slug.push('_');
        }
    }
    format!("cf_{}", slug.trim_matches('_'))
}
