//! harbormaster core library: domain types, route resolution, settings,
//! file-backed credential store, errors.
//!
//! - [`types`]: newtypes, registry entities and payloads, credential records
//! - [`routes`]: registry and webhook address resolution
//! - [`settings`]: defaults, config file, environment overrides
//! - [`store`]: YAML credential store
//! - [`error`]: [`StoreError`], [`ConfigError`]

pub mod error;
pub mod paths;
pub mod routes;
pub mod settings;
pub mod store;
pub mod types;

pub use error::{ConfigError, StoreError};
pub use routes::Routes;
pub use settings::{HarborSettings, MissingTokenPolicy, Settings};
pub use types::{
    CredentialEnvVariable, EnvVarName, EnvVarScope, InternalProjectId, ProjectName,
    RegistryProject, RegistryProjectId, Repository, RobotCredential, SearchResult, WebhookPolicy,
};
