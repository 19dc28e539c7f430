//! Registry project provisioning and teardown.
//!
//! Both operations run their steps strictly in order through a
//! [`StepRunner`] and always return an [`OperationReport`]. There is no
//! rollback: a failed step is logged and the workflow moves on. Values one
//! step produces (the registry project id, the robot credential) are passed
//! to later steps explicitly; when they are missing the dependent steps are
//! recorded as skipped instead of being called with an unresolved value.

use serde_json::Value;

use harbormaster_core::{
    types::{NewRegistryProject, NewRobotAccount},
    CredentialEnvVariable, EnvVarName, InternalProjectId, MissingTokenPolicy, ProjectName,
    RegistryProject, RegistryProjectId, Repository, RobotCredential, Routes, SearchResult,
    Settings, WebhookPolicy,
};

use crate::client::{encode_path_segments, encode_query_value, RegistryClient};
use crate::error::{ClientError, FailureClass, StepError};
use crate::locks::ProjectLocks;
use crate::report::{Operation, OperationReport};
use crate::steps::{Severity, Step, StepPolicy, StepResult, StepRunner};
use crate::store::CredentialStore;

/// Values injected at construction instead of read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionerConfig {
    pub routes: Routes,
    pub webhook_name: String,
    pub missing_token: MissingTokenPolicy,
}

impl Default for ProvisionerConfig {
    fn default() -> Self {
        Self::from(&Settings::default())
    }
}

impl From<&Settings> for ProvisionerConfig {
    fn from(settings: &Settings) -> Self {
        Self {
            routes: settings.routes(),
            webhook_name: settings.webhook_name.clone(),
            missing_token: settings.missing_token,
        }
    }
}

const CREATE_PROJECT: StepPolicy = StepPolicy::tolerating(FailureClass::Conflict, Severity::Info);
const CREATE_ROBOT: StepPolicy = StepPolicy::tolerating(FailureClass::Conflict, Severity::Warn);
// A project missing from the registry predates registry-backed credentials.
const DEPROVISION_LOOKUP: StepPolicy =
    StepPolicy::tolerating(FailureClass::NotFound, Severity::Warn);

pub struct Provisioner<C, S> {
    client: C,
    store: S,
    config: ProvisionerConfig,
    locks: Option<ProjectLocks>,
}

impl<C, S> Provisioner<C, S>
where
    C: RegistryClient,
    S: CredentialStore,
{
    pub fn new(client: C, store: S, config: ProvisionerConfig) -> Self {
        Self {
            client,
            store,
            config,
            locks: None,
        }
    }

    /// Serialize operations on the same project name through `locks`.
    pub fn with_project_locks(mut self, locks: ProjectLocks) -> Self {
        self.locks = Some(locks);
        self
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &ProvisionerConfig {
        &self.config
    }

    /// Create the registry project, its robot credential and webhook, and
    /// store the credential records for `owner`.
    pub async fn provision_project(
        &self,
        name: &ProjectName,
        owner: InternalProjectId,
    ) -> OperationReport {
        let _guard = match &self.locks {
            Some(locks) => Some(locks.acquire(name).await),
            None => None,
        };
        let mut runner = StepRunner::new(Operation::Provision, name);

        runner
            .run(Step::CreateProject, CREATE_PROJECT, self.create_project(name))
            .await;

        let project_id = runner
            .run(Step::ResolveProjectId, StepPolicy::strict(), self.lookup_project(name))
            .await
            .ok();
        let Some(project_id) = project_id else {
            for step in [Step::CreateRobot, Step::StoreCredentials, Step::CreateWebhook] {
                runner.skip(step, "registry project id unresolved");
            }
            return finish(runner);
        };
        tracing::debug!(project = %name, registry_project_id = %project_id, "resolved registry project");

        let robot = match runner
            .run(Step::CreateRobot, CREATE_ROBOT, self.create_robot(name, project_id))
            .await
        {
            StepResult::Done(robot) => Some(robot),
            _ => None,
        };

        let records = self.credential_records(name, owner, robot);
        runner
            .run(Step::StoreCredentials, StepPolicy::strict(), self.store_credentials(&records))
            .await;

        runner
            .run(Step::CreateWebhook, StepPolicy::strict(), self.create_webhook(project_id))
            .await;

        finish(runner)
    }

    /// Delete every repository of the registry project, then the project.
    /// A project unknown to the registry is a no-op.
    pub async fn deprovision_project(&self, name: &ProjectName) -> OperationReport {
        let _guard = match &self.locks {
            Some(locks) => Some(locks.acquire(name).await),
            None => None,
        };
        let mut runner = StepRunner::new(Operation::Deprovision, name);

        let Some(project_id) = runner
            .run(Step::ResolveProjectId, DEPROVISION_LOOKUP, self.lookup_project(name))
            .await
            .ok()
        else {
            return finish(runner);
        };

        let repositories = runner
            .run(Step::ListRepositories, StepPolicy::strict(), self.project_repositories(name))
            .await
            .ok();
        match repositories {
            Some(repositories) => {
                for repository in &repositories {
                    runner
                        .run_target(
                            Step::DeleteRepository,
                            &repository.repository_name,
                            StepPolicy::strict(),
                            self.delete_repository(repository),
                        )
                        .await;
                }
            }
            None => runner.skip(Step::DeleteRepository, "repository list unavailable"),
        }

        runner
            .run(Step::DeleteProject, StepPolicy::strict(), self.delete_project(project_id))
            .await;

        finish(runner)
    }

    // -----------------------------------------------------------------------
    // Steps
    // -----------------------------------------------------------------------

    async fn create_project(&self, name: &ProjectName) -> Result<(), StepError> {
        let payload = serde_json::to_value(NewRegistryProject::unlimited_private(name))
            .map_err(ClientError::from)?;
        self.client.post("projects", &payload).await?;
        Ok(())
    }

    /// The registry's name filter is fuzzy; only an exact name match counts.
    async fn lookup_project(&self, name: &ProjectName) -> Result<RegistryProjectId, StepError> {
        let response = self
            .client
            .get(&format!("projects?name={}", encode_query_value(name.as_str())))
            .await?;
        let projects: Vec<RegistryProject> = match response.body {
            Value::Null => Vec::new(),
            _ => response.json()?,
        };
        projects
            .into_iter()
            .find(|p| p.name == *name)
            .map(|p| p.project_id)
            .ok_or_else(|| StepError::Missing(format!("no registry project named {name}")))
    }

    async fn create_robot(
        &self,
        name: &ProjectName,
        project_id: RegistryProjectId,
    ) -> Result<RobotCredential, StepError> {
        let payload = serde_json::to_value(NewRobotAccount::push_only(name, project_id))
            .map_err(ClientError::from)?;
        let response = self
            .client
            .post(&format!("projects/{project_id}/robots"), &payload)
            .await?;
        Ok(response.json()?)
    }

    /// Records to write for `owner`. Without an issued credential the
    /// [`MissingTokenPolicy`] decides between an empty password and writing
    /// only the registry URL.
    fn credential_records(
        &self,
        name: &ProjectName,
        owner: InternalProjectId,
        robot: Option<RobotCredential>,
    ) -> Vec<CredentialEnvVariable> {
        let url = CredentialEnvVariable::registry(
            EnvVarName::InternalRegistryUrl,
            self.config.routes.registry_url.clone(),
            owner,
        );
        let (username, token) = match (robot, self.config.missing_token) {
            (Some(robot), _) => (robot.name, robot.token),
            (None, MissingTokenPolicy::WriteEmpty) => {
                tracing::warn!(project = %name, "no robot token issued; writing empty registry password");
                (RobotCredential::account_name(name), String::new())
            }
            (None, MissingTokenPolicy::Skip) => {
                tracing::warn!(project = %name, "no robot token issued; writing registry URL only");
                return vec![url];
            }
        };
        vec![
            url,
            CredentialEnvVariable::registry(EnvVarName::InternalRegistryUsername, username, owner),
            CredentialEnvVariable::registry(EnvVarName::InternalRegistryPassword, token, owner),
        ]
    }

    /// Writes share one failure boundary: the first failed write ends the step.
    async fn store_credentials(&self, records: &[CredentialEnvVariable]) -> Result<usize, StepError> {
        for record in records {
            self.store.insert_env_variable(record).await?;
            tracing::debug!(name = %record.name, owner = %record.project, "credential record stored");
        }
        Ok(records.len())
    }

    async fn create_webhook(&self, project_id: RegistryProjectId) -> Result<(), StepError> {
        let policy = WebhookPolicy::scan_events(
            self.config.webhook_name.clone(),
            self.config.routes.webhook_url.clone(),
        );
        let payload = serde_json::to_value(policy).map_err(ClientError::from)?;
        self.client
            .post(&format!("projects/{project_id}/webhook/policies"), &payload)
            .await?;
        Ok(())
    }

    async fn project_repositories(&self, name: &ProjectName) -> Result<Vec<Repository>, StepError> {
        let response = self
            .client
            .get(&format!("search?name={}", encode_query_value(name.as_str())))
            .await?;
        let result: SearchResult = match response.body {
            Value::Null => SearchResult::default(),
            _ => response.json()?,
        };
        Ok(result.repositories_of(name))
    }

    async fn delete_repository(&self, repository: &Repository) -> Result<(), StepError> {
        self.client
            .delete(&format!(
                "repositories/{}",
                encode_path_segments(&repository.repository_name)
            ))
            .await?;
        Ok(())
    }

    async fn delete_project(&self, project_id: RegistryProjectId) -> Result<(), StepError> {
        self.client.delete(&format!("projects/{project_id}")).await?;
        Ok(())
    }
}

fn finish(runner: StepRunner) -> OperationReport {
    let report = runner.finish();
    tracing::info!(
        operation = %report.operation,
        project = %report.project,
        failures = report.failures().count(),
        tolerated = report.tolerated().count(),
        "registry {} finished",
        report.operation
    );
    report
}
