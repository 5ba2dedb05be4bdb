//! Transformer settings

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Settings shared by all transformers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformerConfig {
    /// Promote missing-data warnings (null steps, unnamed entities, missing
    /// required references) to errors
    pub strict_mode: bool,

    /// Map the record's attachments
    pub include_attachments: bool,

    /// Project key used for cross-reference lookups; when unset it is read
    /// from the record
    pub project_key: Option<String>,
}

impl Default for TransformerConfig {
    fn default() -> Self {
        Self {
            strict_mode: false,
            include_attachments: true,
            project_key: None,
        }
    }
}

impl TransformerConfig {
    #[must_use]
    pub fn strict(mut self, strict_mode: bool) -> Self {
        self.strict_mode = strict_mode;
        self
    }

    #[must_use]
    pub fn attachments(mut self, include_attachments: bool) -> Self {
        self.include_attachments = include_attachments;
        self
    }

    #[must_use]
    pub fn with_project_key(mut self, project_key: impl Into<String>) -> Self {
        self.project_key = Some(project_key.into());
        self
    }

    /// Parse settings from YAML; missing keys take their defaults
    ///
    /// # Errors
    ///
    /// Returns an error when the document is not valid YAML or has the wrong shape.
    pub fn from_yaml(yaml: &str) -> crate::Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| crate::Error::config("<yaml>", e.to_string()))
    }

    /// Load settings from a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be read or parsed.
    pub fn load_from_file(path: &Path) -> crate::Result<Self> {
        let name = path.display().to_string();
        let content =
            std::fs::read_to_string(path).map_err(|e| crate::Error::config(&name, e.to_string()))?;
        serde_yaml::from_str(&content).map_err(|e| crate::Error::config(name, e.to_string()))
    }
}
