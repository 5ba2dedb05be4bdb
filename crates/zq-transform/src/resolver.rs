//! Cross-reference lookups
//!
//! Transformers never resolve references themselves. They ask a
//! [`MappingLookup`] for the qTest id recorded for a Zephyr id, scoped by
//! project key and mapping type.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::Path;
use thiserror::Error;
use tracing::debug;
use zq_model::value_to_id;

/// Kind of id mapping held by the lookup store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MappingType {
    /// Zephyr folder to qTest module
    FolderToModule,
    /// Zephyr folder to qTest parent test cycle
    FolderToCycle,
    /// Zephyr test case key or id to qTest test case id
    TestCase,
    /// Zephyr test cycle key or id to qTest test cycle id
    TestCycle,
}

impl MappingType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            MappingType::FolderToModule => "folder_to_module",
            MappingType::FolderToCycle => "folder_to_cycle",
            MappingType::TestCase => "test_case",
            MappingType::TestCycle => "test_cycle",
        }
    }

    /// What the resolved id refers to, for messages
    #[must_use]
    pub fn target_label(self) -> &'static str {
        match self {
            MappingType::FolderToModule => "module",
            MappingType::FolderToCycle => "parent cycle",
            MappingType::TestCase => "test case",
            MappingType::TestCycle => "test cycle",
        }
    }
}

impl fmt::Display for MappingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure inside the lookup store itself
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LookupError {
    #[error("{0}")]
    Backend(String),
}

/// Read-only source of previously recorded id mappings
pub trait MappingLookup: Send + Sync {
    /// Find the target id recorded for `source_id`
    ///
    /// # Errors
    ///
    /// Returns an error when the store cannot be queried. A missing mapping
    /// is `Ok(None)`, not an error.
    fn lookup(
        &self,
        project_key: &str,
        mapping_type: MappingType,
        source_id: &str,
    ) -> Result<Option<String>, LookupError>;
}

/// Lookup that knows no mappings
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLookup;

impl MappingLookup for NoLookup {
    fn lookup(&self, _: &str, _: MappingType, _: &str) -> Result<Option<String>, LookupError> {
        Ok(None)
    }
}

type LookupKey = (String, MappingType, String);

/// Mapping table held in memory
///
/// The JSON form groups entries by project key, then mapping type:
///
/// ```json
/// {"PROJ": {"folder_to_module": {"12": "900"}, "test_case": {"PROJ-T1": 4411}}}
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryLookup {
    entries: HashMap<LookupKey, String>,
}

impl InMemoryLookup {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a mapping, replacing any earlier target for the same source id
    pub fn insert(
        &mut self,
        project_key: impl Into<String>,
        mapping_type: MappingType,
        source_id: impl Into<String>,
        target_id: impl Into<String>,
    ) -> &mut Self {
        self.entries.insert(
            (project_key.into(), mapping_type, source_id.into()),
            target_id.into(),
        );
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Build a table from its JSON form
    ///
    /// # Errors
    ///
    /// Returns an error when the value is not shaped as project, mapping type,
    /// source id, or a target id is not a string or number.
    pub fn from_value(value: &Value) -> crate::Result<Self> {
        type Table = BTreeMap<String, BTreeMap<MappingType, BTreeMap<String, Value>>>;
        let table: Table = serde_json::from_value(value.clone())
            .map_err(|e| crate::Error::config("mapping table", e.to_string()))?;

        let mut lookup = Self::new();
        for (project_key, by_type) in table {
            for (mapping_type, pairs) in by_type {
                for (source_id, target) in pairs {
                    let target_id = value_to_id(&target).ok_or_else(|| {
                        crate::Error::config(
                            "mapping table",
                            format!(
                                "target for {project_key}/{mapping_type}/{source_id} \
                                 is not an id: {target}"
                            ),
                        )
                    })?;
                    lookup.insert(project_key.clone(), mapping_type, source_id, target_id);
                }
            }
        }
        debug!(entries = lookup.len(), "loaded mapping table");
        Ok(lookup)
    }

    /// Load a table from a JSON file
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be read or parsed.
    pub fn load_from_file(path: &Path) -> crate::Result<Self> {
        let name = path.display().to_string();
        let content =
            std::fs::read_to_string(path).map_err(|e| crate::Error::config(&name, e.to_string()))?;
        let value: Value =
            serde_json::from_str(&content).map_err(|e| crate::Error::config(&name, e.to_string()))?;
        Self::from_value(&value)
    }
}

impl MappingLookup for InMemoryLookup {
    fn lookup(
        &self,
        project_key: &str,
        mapping_type: MappingType,
        source_id: &str,
    ) -> Result<Option<String>, LookupError> {
        let key = (project_key.to_string(), mapping_type, source_id.to_string());
        Ok(self.entries.get(&key).cloned())
    }
}
