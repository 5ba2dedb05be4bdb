//! Status and priority vocabularies
//!
//! Zephyr instances are configured with free-form status and priority names.
//! These tables fold the common spellings onto qTest's closed vocabulary.
//! Both lookups are total: unknown, empty, and missing input map to a default.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// qTest execution status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionStatus {
    Passed,
    Failed,
    InProgress,
    Blocked,
    NotRun,
}

impl ExecutionStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ExecutionStatus::Passed => "PASSED",
            ExecutionStatus::Failed => "FAILED",
            ExecutionStatus::InProgress => "IN_PROGRESS",
            ExecutionStatus::Blocked => "BLOCKED",
            ExecutionStatus::NotRun => "NOT_RUN",
        }
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// qTest priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Critical,
    High,
    Medium,
    Low,
    Trivial,
}

impl Priority {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Critical => "CRITICAL",
            Priority::High => "HIGH",
            Priority::Medium => "MEDIUM",
            Priority::Low => "LOW",
            Priority::Trivial => "TRIVIAL",
        }
    }

    /// Numeric qTest priority id, 1 (most urgent) through 5
    #[must_use]
    pub fn id(self) -> u8 {
        match self {
            Priority::Critical => 1,
            Priority::High => 2,
            Priority::Medium => 3,
            Priority::Low => 4,
            Priority::Trivial => 5,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Priority id used when the source carries none
pub const DEFAULT_PRIORITY_ID: u8 = 3;

fn normalize(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Map a Zephyr execution status name onto the qTest vocabulary
#[must_use]
pub fn map_status(raw: Option<&str>) -> ExecutionStatus {
    let Some(raw) = raw else {
        return ExecutionStatus::NotRun;
    };
    match normalize(raw).as_str() {
        "PASS" | "PASSED" | "PASS WITH WARNINGS" | "CONDITIONAL PASS" => ExecutionStatus::Passed,
        "FAIL" | "FAILED" => ExecutionStatus::Failed,
        "WIP" | "IN PROGRESS" | "EXECUTING" => ExecutionStatus::InProgress,
        "BLOCKED" | "ABORTED" => ExecutionStatus::Blocked,
        _ => ExecutionStatus::NotRun,
    }
}

/// Map a status carried as a JSON value; objects contribute their `name`
#[must_use]
pub fn map_status_value(value: &Value) -> ExecutionStatus {
    map_status(zq_model::value_to_text(value).as_deref())
}

/// Look up a priority name, returning `None` for unknown or empty input
#[must_use]
pub fn lookup_priority(raw: &str) -> Option<Priority> {
    match normalize(raw).as_str() {
        "HIGHEST" | "CRITICAL" | "BLOCKER" => Some(Priority::Critical),
        "HIGH" | "MAJOR" => Some(Priority::High),
        "MEDIUM" => Some(Priority::Medium),
        "LOW" | "MINOR" => Some(Priority::Low),
        "LOWEST" | "TRIVIAL" => Some(Priority::Trivial),
        _ => None,
    }
}

/// Map a Zephyr priority name onto the qTest vocabulary, defaulting to medium
#[must_use]
pub fn map_priority(raw: Option<&str>) -> Priority {
    raw.and_then(lookup_priority).unwrap_or(Priority::Medium)
}
