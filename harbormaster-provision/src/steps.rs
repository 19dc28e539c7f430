//! Step executor: runs each workflow step under a failure boundary.
//!
//! A step's error is classified ([`FailureClass`]), logged at the severity its
//! [`StepPolicy`] assigns, and recorded. It never propagates: callers get a
//! [`StepResult`] and decide whether dependent steps can run.

use std::future::Future;

use serde::Serialize;

use harbormaster_core::ProjectName;

use crate::error::{FailureClass, StepError};
use crate::report::{Operation, OperationReport, StepRecord, StepStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    CreateProject,
    ResolveProjectId,
    CreateRobot,
    StoreCredentials,
    CreateWebhook,
    ListRepositories,
    DeleteRepository,
    DeleteProject,
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Step::CreateProject => "create_project",
            Step::ResolveProjectId => "resolve_project_id",
            Step::CreateRobot => "create_robot",
            Step::StoreCredentials => "store_credentials",
            Step::CreateWebhook => "create_webhook",
            Step::ListRepositories => "list_repositories",
            Step::DeleteRepository => "delete_repository",
            Step::DeleteProject => "delete_project",
        };
        f.write_str(name)
    }
}

impl Step {
    /// Human-readable summary of a failure of this step.
    pub fn describe_failure(self, class: FailureClass) -> String {
        let text = match (self, class) {
            (Step::CreateProject, FailureClass::Conflict) => "registry project already exists",
            (Step::ResolveProjectId, FailureClass::NotFound) => "registry project does not exist",
            (Step::CreateRobot, FailureClass::Conflict) => {
                "a robot account of the same name already exists"
            }
            (Step::DeleteProject, FailureClass::InvalidRequest) => "invalid registry project id",
            (Step::DeleteProject, FailureClass::NotFound) => "registry project not found",
            (Step::DeleteProject, FailureClass::PreconditionFailed) => {
                "registry project still contains repositories"
            }
            (Step::StoreCredentials, _) => "could not write registry credentials",
            (step, class) => return format!("{step} failed ({class})"),
        };
        text.to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warn,
    Error,
}

macro_rules! event_at {
    ($level:expr, $($rest:tt)+) => {
        match $level {
            Severity::Info => tracing::info!($($rest)+),
            Severity::Warn => tracing::warn!($($rest)+),
            Severity::Error => tracing::error!($($rest)+),
        }
    };
}

/// How a step's failures are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepPolicy {
    tolerate: Option<(FailureClass, Severity)>,
    failure: Severity,
}

impl StepPolicy {
    /// Every failure is logged at error severity.
    pub const fn strict() -> Self {
        Self {
            tolerate: None,
            failure: Severity::Error,
        }
    }

    /// `class` is benign and logged at `level`; everything else is an error.
    pub const fn tolerating(class: FailureClass, level: Severity) -> Self {
        Self {
            tolerate: Some((class, level)),
            failure: Severity::Error,
        }
    }

    fn severity_for(&self, class: FailureClass) -> (StepStatus, Severity) {
        match self.tolerate {
            Some((tolerated, level)) if tolerated == class => (StepStatus::Tolerated, level),
            _ => (StepStatus::Failed, self.failure),
        }
    }
}

/// Outcome of one step as seen by the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepResult<T> {
    Done(T),
    Tolerated(FailureClass),
    Failed(FailureClass),
}

impl<T> StepResult<T> {
    pub fn ok(self) -> Option<T> {
        match self {
            StepResult::Done(value) => Some(value),
            _ => None,
        }
    }
}

/// Collects step records for one operation.
#[derive(Debug)]
pub struct StepRunner {
    operation: Operation,
    project: ProjectName,
    records: Vec<StepRecord>,
}

impl StepRunner {
    pub fn new(operation: Operation, project: &ProjectName) -> Self {
        Self {
            operation,
            project: project.clone(),
            records: Vec::new(),
        }
    }

    pub async fn run<T, Fut>(&mut self, step: Step, policy: StepPolicy, fut: Fut) -> StepResult<T>
    where
        Fut: Future<Output = Result<T, StepError>>,
    {
        self.execute(step, None, policy, fut).await
    }

    /// [`run`](Self::run) for a step applied to one of several targets.
    pub async fn run_target<T, Fut>(
        &mut self,
        step: Step,
        target: &str,
        policy: StepPolicy,
        fut: Fut,
    ) -> StepResult<T>
    where
        Fut: Future<Output = Result<T, StepError>>,
    {
        self.execute(step, Some(target.to_string()), policy, fut).await
    }

    /// Record `step` as not attempted.
    pub fn skip(&mut self, step: Step, reason: &str) {
        tracing::warn!(
            operation = %self.operation,
            project = %self.project,
            step = %step,
            reason,
            "step skipped"
        );
        self.records.push(StepRecord {
            step,
            target: None,
            status: StepStatus::Skipped,
            failure: None,
            status_code: None,
            message: Some(reason.to_string()),
        });
    }

    pub fn finish(self) -> OperationReport {
        OperationReport {
            operation: self.operation,
            project: self.project,
            steps: self.records,
        }
    }

    async fn execute<T, Fut>(
        &mut self,
        step: Step,
        target: Option<String>,
        policy: StepPolicy,
        fut: Fut,
    ) -> StepResult<T>
    where
        Fut: Future<Output = Result<T, StepError>>,
    {
        match fut.await {
            Ok(value) => {
                tracing::debug!(
                    operation = %self.operation,
                    project = %self.project,
                    step = %step,
                    item = target.as_deref().unwrap_or(""),
                    "step completed"
                );
                self.records.push(StepRecord {
                    step,
                    target,
                    status: StepStatus::Succeeded,
                    failure: None,
                    status_code: None,
                    message: None,
                });
                StepResult::Done(value)
            }
            Err(err) => {
                let class = err.class();
                let status_code = err.status_code();
                let (status, level) = policy.severity_for(class);
                let summary = step.describe_failure(class);
                event_at!(
                    level,
                    operation = %self.operation,
                    project = %self.project,
                    step = %step,
                    item = target.as_deref().unwrap_or(""),
                    status = status_code.unwrap_or_default(),
                    error = %err,
                    "{summary}"
                );
                self.records.push(StepRecord {
                    step,
                    target,
                    status,
                    failure: Some(class),
                    status_code,
                    message: Some(format!("{summary}: {err}")),
                });
                if status == StepStatus::Tolerated {
                    StepResult::Tolerated(class)
                } else {
                    StepResult::Failed(class)
                }
            }
        }
    }
}
