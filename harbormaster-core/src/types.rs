//! Domain types for registry provisioning.
//!
//! Wire-facing structs mirror the registry service's JSON field names so they
//! can be sent and parsed with serde directly. Persisted structs are stored as
//! YAML by [`crate::store`].

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Name of an internal project; doubles as the registry namespace name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProjectName(pub String);

impl ProjectName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for ProjectName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ProjectName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Numeric id of the owning internal project (credential attribution).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InternalProjectId(pub u64);

impl fmt::Display for InternalProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<u64> for InternalProjectId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Id assigned by the registry service when a project is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegistryProjectId(pub i64);

impl fmt::Display for RegistryProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ---------------------------------------------------------------------------
// Registry entities
// ---------------------------------------------------------------------------

/// A namespace in the registry service, as returned by a project lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryProject {
    pub project_id: RegistryProjectId,
    pub name: ProjectName,
}

/// Push credential issued by the registry for one project.
///
/// `token` is only ever present in the creation response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RobotCredential {
    pub name: String,
    #[serde(default)]
    pub token: String,
}

impl RobotCredential {
    /// Account name the registry assigns to a robot created for `project`.
    pub fn account_name(project: &ProjectName) -> String {
        format!("robot${}", project.0)
    }
}

/// An image repository nested under a registry project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub project_name: String,
    /// Fully qualified name, e.g. `myproject/nginx`.
    pub repository_name: String,
}

/// Body of the registry's `search` endpoint. Only repositories are used.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResult {
    #[serde(default)]
    pub repository: Vec<Repository>,
}

impl SearchResult {
    /// Repositories that belong to `project` exactly.
    ///
    /// The search endpoint matches on substrings, so `foo` also returns
    /// repositories of `foobar`.
    pub fn repositories_of(self, project: &ProjectName) -> Vec<Repository> {
        self.repository
            .into_iter()
            .filter(|r| r.project_name == project.0)
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Registry request payloads
// ---------------------------------------------------------------------------

/// Project metadata. The registry expects string-encoded booleans.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectMetadata {
    pub auto_scan: String,
    pub reuse_sys_cve_whitelist: String,
    pub public: String,
}

/// Payload for `POST projects`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRegistryProject {
    pub count_limit: i64,
    pub project_name: String,
    pub storage_limit: i64,
    pub metadata: ProjectMetadata,
}

impl NewRegistryProject {
    /// Private project with no quotas and scan-on-push enabled.
    pub fn unlimited_private(name: &ProjectName) -> Self {
        Self {
            count_limit: -1,
            project_name: name.0.clone(),
            storage_limit: -1,
            metadata: ProjectMetadata {
                auto_scan: "true".to_string(),
                reuse_sys_cve_whitelist: "true".to_string(),
                public: "false".to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RobotAccess {
    pub resource: String,
    pub action: String,
}

/// Payload for `POST projects/<id>/robots`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRobotAccount {
    pub name: String,
    pub access: Vec<RobotAccess>,
}

impl NewRobotAccount {
    /// Robot named after the project with push access to its repositories only.
    pub fn push_only(name: &ProjectName, id: RegistryProjectId) -> Self {
        Self {
            name: name.0.clone(),
            access: vec![RobotAccess {
                resource: format!("/project/{id}/repository"),
                action: "push".to_string(),
            }],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WebhookEventType {
    ScanningFailed,
    ScanningCompleted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookTarget {
    #[serde(rename = "type")]
    pub kind: String,
    pub skip_cert_verify: bool,
    pub address: String,
}

/// Payload for `POST projects/<id>/webhook/policies`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookPolicy {
    pub targets: Vec<WebhookTarget>,
    pub event_types: Vec<WebhookEventType>,
    pub name: String,
    pub enabled: bool,
}

impl WebhookPolicy {
    /// Enabled policy posting scan results to `address`.
    pub fn scan_events(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            targets: vec![WebhookTarget {
                kind: "http".to_string(),
                skip_cert_verify: true,
                address: address.into(),
            }],
            event_types: vec![
                WebhookEventType::ScanningFailed,
                WebhookEventType::ScanningCompleted,
            ],
            name: name.into(),
            enabled: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Credential store records
// ---------------------------------------------------------------------------

/// Names of the records written for each provisioned project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnvVarName {
    InternalRegistryUrl,
    InternalRegistryUsername,
    InternalRegistryPassword,
}

impl fmt::Display for EnvVarName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnvVarName::InternalRegistryUrl => write!(f, "INTERNAL_REGISTRY_URL"),
            EnvVarName::InternalRegistryUsername => write!(f, "INTERNAL_REGISTRY_USERNAME"),
            EnvVarName::InternalRegistryPassword => write!(f, "INTERNAL_REGISTRY_PASSWORD"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnvVarScope {
    #[default]
    InternalContainerRegistry,
}

impl fmt::Display for EnvVarScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnvVarScope::InternalContainerRegistry => write!(f, "INTERNAL_CONTAINER_REGISTRY"),
        }
    }
}

/// A scoped key/value record attributed to an internal project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialEnvVariable {
    pub name: EnvVarName,
    pub value: String,
    pub scope: EnvVarScope,
    pub project: InternalProjectId,
}

impl CredentialEnvVariable {
    /// Record in the internal container registry scope.
    pub fn registry(name: EnvVarName, value: impl Into<String>, project: InternalProjectId) -> Self {
        Self {
            name,
            value: value.into(),
            scope: EnvVarScope::InternalContainerRegistry,
            project,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
