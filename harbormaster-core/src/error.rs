//! Error types for harbormaster-core.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::{EnvVarName, InternalProjectId};

/// All errors that can arise from credential store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying I/O failure (permission denied, disk full, etc.).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization error (write path).
    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// YAML parse error on load, with the offending file.
    #[error("failed to parse credential store at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// `dirs::home_dir()` returned `None`.
    #[error("cannot determine home directory; set $HOME or equivalent")]
    HomeNotFound,

    /// A record with this name already exists for the project.
    #[error("environment variable {name} already exists for project {project}")]
    Duplicate {
        name: EnvVarName,
        project: InternalProjectId,
    },

    /// The store backend is unavailable (e.g. a blocking task was cancelled).
    #[error("credential store unavailable: {0}")]
    Unavailable(String),
}

/// Errors raised while loading [`crate::settings::Settings`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// An environment override could not be interpreted.
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },

    #[error("cannot determine home directory; set $HOME or equivalent")]
    HomeNotFound,
}
