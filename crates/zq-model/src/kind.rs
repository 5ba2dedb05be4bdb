//! Entity kinds on both sides of the migration

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kinds of source entities read from Zephyr
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Project,
    Folder,
    TestCase,
    TestStep,
    TestCycle,
    TestExecution,
    TestStepResult,
    Attachment,
}

impl EntityKind {
    /// All built-in kinds, in registration order
    pub const ALL: [EntityKind; 8] = [
        EntityKind::Project,
        EntityKind::Folder,
        EntityKind::TestCase,
        EntityKind::TestStep,
        EntityKind::TestCycle,
        EntityKind::TestExecution,
        EntityKind::TestStepResult,
        EntityKind::Attachment,
    ];

    /// Snake-case name used in rule files and on the command line
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Project => "project",
            EntityKind::Folder => "folder",
            EntityKind::TestCase => "test_case",
            EntityKind::TestStep => "test_step",
            EntityKind::TestCycle => "test_cycle",
            EntityKind::TestExecution => "test_execution",
            EntityKind::TestStepResult => "test_step_result",
            EntityKind::Attachment => "attachment",
        }
    }

    /// The qTest kind this source kind maps onto by default
    #[must_use]
    pub fn default_target(self) -> TargetKind {
        match self {
            EntityKind::Project => TargetKind::QTestProject,
            EntityKind::Folder => TargetKind::QTestModule,
            EntityKind::TestCase => TargetKind::QTestTestCase,
            EntityKind::TestStep => TargetKind::QTestTestStep,
            EntityKind::TestCycle => TargetKind::QTestTestCycle,
            EntityKind::TestExecution => TargetKind::QTestTestRun,
            EntityKind::TestStepResult => TargetKind::QTestTestStepLog,
            EntityKind::Attachment => TargetKind::QTestAttachment,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "project" => Ok(EntityKind::Project),
            "folder" => Ok(EntityKind::Folder),
            "test_case" | "testcase" => Ok(EntityKind::TestCase),
            "test_step" | "teststep" | "step" => Ok(EntityKind::TestStep),
            "test_cycle" | "testcycle" | "cycle" => Ok(EntityKind::TestCycle),
            "test_execution" | "testexecution" | "execution" => Ok(EntityKind::TestExecution),
            "test_step_result" | "step_result" => Ok(EntityKind::TestStepResult),
            "attachment" => Ok(EntityKind::Attachment),
            _ => Err(crate::Error::UnknownEntityKind(s.to_string())),
        }
    }
}

/// Kinds of target entities written to qTest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetKind {
    QTestProject,
    QTestModule,
    QTestTestCase,
    QTestTestStep,
    QTestTestCycle,
    QTestTestRun,
    QTestTestStepLog,
    QTestAttachment,
}

impl TargetKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            TargetKind::QTestProject => "QTestProject",
            TargetKind::QTestModule => "QTestModule",
            TargetKind::QTestTestCase => "QTestTestCase",
            TargetKind::QTestTestStep => "QTestTestStep",
            TargetKind::QTestTestCycle => "QTestTestCycle",
            TargetKind::QTestTestRun => "QTestTestRun",
            TargetKind::QTestTestStepLog => "QTestTestStepLog",
            TargetKind::QTestAttachment => "QTestAttachment",
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
