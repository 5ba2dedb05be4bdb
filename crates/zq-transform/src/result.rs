//! Transformation results

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use zq_model::Record;

/// Outcome of transforming one source record
///
/// Always returned, even when every step failed. `transformed` holds
/// whatever was built, so a failed result may still carry a partial record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformationResult {
    /// False as soon as any error is recorded
    pub success: bool,
    pub transformed: Option<Record>,
    pub original: Record,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl TransformationResult {
    /// Start a result for `original` with no problems recorded
    #[must_use]
    pub fn new(original: Record) -> Self {
        Self {
            success: true,
            transformed: None,
            original,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// A result that failed before any record could be built
    #[must_use]
    pub fn failed(original: Record, error: impl Into<String>) -> Self {
        let mut result = Self::new(original);
        result.add_error(error);
        result
    }

    pub fn add_error(&mut self, error: impl Into<String>) {
        let error = error.into();
        debug!(%error, "transformation error");
        self.success = false;
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: impl Into<String>) {
        let warning = warning.into();
        warn!(%warning, "transformation warning");
        self.warnings.push(warning);
    }

    pub fn extend_warnings(&mut self, warnings: impl IntoIterator<Item = String>) {
        for warning in warnings {
            self.add_warning(warning);
        }
    }

    /// Record the outcome of a step that may fail as a whole
    pub fn check_step<T>(&mut self, step: &str, outcome: crate::Result<T>) -> Option<T> {
        match outcome {
            Ok(value) => Some(value),
            Err(e) => {
                self.add_error(format!("{step} failed: {e}"));
                None
            }
        }
    }

    #[must_use]
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_clears_success() {
        let mut result = TransformationResult::new(Record::new());
        assert!(result.success);
        result.add_warning("just a warning");
        assert!(result.success);
        assert!(result.has_warnings());
        result.add_error("broken");
        assert!(!result.success);
        assert_eq!(result.errors, vec!["broken".to_string()]);
    }

    #[test]
    fn test_failed_step_is_recorded() {
        let mut result = TransformationResult::new(Record::new());
        let outcome: crate::Result<()> = Err(crate::Error::UnsupportedKind(
            zq_model::EntityKind::Project,
        ));
        assert_eq!(result.check_step("Basic fields", outcome), None);
        assert_eq!(
            result.errors,
            vec!["Basic fields failed: No transformer for entity kind 'project'".to_string()]
        );
    }

    #[test]
    fn test_failed_constructor() {
        let result = TransformationResult::failed(Record::new(), "nope");
        assert!(!result.success);
        assert!(result.transformed.is_none());
    }
}
