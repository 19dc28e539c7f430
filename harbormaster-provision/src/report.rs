//! Per-operation outcome report.
//!
//! Provisioning and deprovisioning never fail as a whole; the report is the
//! only record of which steps succeeded.

use serde::Serialize;

use harbormaster_core::ProjectName;

use crate::error::FailureClass;
use crate::steps::Step;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Provision,
    Deprovision,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::Provision => write!(f, "provision"),
            Operation::Deprovision => write!(f, "deprovision"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Succeeded,
    /// Failed in a way the step's policy accepts (e.g. already exists).
    Tolerated,
    Failed,
    /// Not attempted because a prerequisite was missing.
    Skipped,
}

impl std::fmt::Display for StepStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StepStatus::Succeeded => write!(f, "succeeded"),
            StepStatus::Tolerated => write!(f, "tolerated"),
            StepStatus::Failed => write!(f, "failed"),
            StepStatus::Skipped => write!(f, "skipped"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepRecord {
    pub step: Step,
    /// Sub-target of the step, e.g. a repository name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    pub status: StepStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureClass>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationReport {
    pub operation: Operation,
    pub project: ProjectName,
    pub steps: Vec<StepRecord>,
}

impl OperationReport {
    /// True when no step failed. Tolerated and skipped steps do not count.
    pub fn succeeded(&self) -> bool {
        self.steps.iter().all(|s| s.status != StepStatus::Failed)
    }

    pub fn failures(&self) -> impl Iterator<Item = &StepRecord> {
        self.with_status(StepStatus::Failed)
    }

    pub fn tolerated(&self) -> impl Iterator<Item = &StepRecord> {
        self.with_status(StepStatus::Tolerated)
    }

    pub fn with_status(&self, status: StepStatus) -> impl Iterator<Item = &StepRecord> {
        self.steps.iter().filter(move |s| s.status == status)
    }

    /// Every record for `step` (deletions produce one per repository).
    pub fn records_for(&self, step: Step) -> impl Iterator<Item = &StepRecord> {
        self.steps.iter().filter(move |s| s.step == step)
    }

    /// Status of the first record for `step`.
    pub fn status_of(&self, step: Step) -> Option<StepStatus> {
        self.records_for(step).next().map(|s| s.status)
    }
}
