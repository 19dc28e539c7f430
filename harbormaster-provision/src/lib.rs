//! # harbormaster-provision
//!
//! Registry project provisioning orchestrator.
//!
//! [`Provisioner::provision_project`] creates a registry project, a push-only
//! robot credential and a scan webhook, and stores the credentials for the
//! owning internal project. [`Provisioner::deprovision_project`] removes the
//! project's repositories and then the project. Both are best-effort: every
//! step runs under the failure boundary in [`steps`] and the outcome is an
//! [`OperationReport`], never an error.

pub mod client;
pub mod error;
pub mod locks;
pub mod orchestrator;
pub mod report;
pub mod steps;
pub mod store;

pub use client::{HarborClient, RegistryClient, RegistryResponse};
pub use error::{ClientError, FailureClass, StepError};
pub use locks::ProjectLocks;
pub use orchestrator::{Provisioner, ProvisionerConfig};
pub use report::{Operation, OperationReport, StepRecord, StepStatus};
pub use steps::{Step, StepPolicy, StepResult};
pub use store::{CredentialStore, FileCredentialStore, MemoryCredentialStore};
