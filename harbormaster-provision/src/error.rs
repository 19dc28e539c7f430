//! Error types for harbormaster-provision.

use thiserror::Error;

use harbormaster_core::StoreError;

/// Errors surfaced by a [`crate::client::RegistryClient`].
#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport failure: connect, timeout, TLS, body read.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The registry answered with a non-success status.
    #[error("registry returned {status}: {message}")]
    Status { status: u16, message: String },
}

impl ClientError {
    /// HTTP status code, when the registry answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            ClientError::Http(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Failure classes used by the step executor to decide how a failure is
/// logged and whether it counts as benign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureClass {
    /// 409: the resource already exists.
    Conflict,
    /// 404, or a lookup that matched nothing.
    NotFound,
    /// 400: e.g. an invalid project id.
    InvalidRequest,
    /// 412: e.g. deleting a project that still has repositories.
    PreconditionFailed,
    /// Any other status, or a transport failure.
    Service,
    /// Credential store write failure.
    Persistence,
}

impl FailureClass {
    pub fn from_status(status: u16) -> Self {
        match status {
            400 => FailureClass::InvalidRequest,
            404 => FailureClass::NotFound,
            409 => FailureClass::Conflict,
            412 => FailureClass::PreconditionFailed,
            _ => FailureClass::Service,
        }
    }
}

impl std::fmt::Display for FailureClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            FailureClass::Conflict => "conflict",
            FailureClass::NotFound => "not found",
            FailureClass::InvalidRequest => "invalid request",
            FailureClass::PreconditionFailed => "precondition failed",
            FailureClass::Service => "service error",
            FailureClass::Persistence => "persistence error",
        };
        f.write_str(label)
    }
}

/// Failure of a single provisioning step.
#[derive(Debug, Error)]
pub enum StepError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// The registry answered successfully but the entity was absent.
    #[error("{0}")]
    Missing(String),
}

impl StepError {
    pub fn class(&self) -> FailureClass {
        match self {
            StepError::Client(err) => match err.status() {
                Some(status) => FailureClass::from_status(status),
                None => FailureClass::Service,
            },
            StepError::Store(_) => FailureClass::Persistence,
            StepError::Missing(_) => FailureClass::NotFound,
        }
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            StepError::Client(err) => err.status(),
            _ => None,
        }
    }
}
