//! On-disk layout under the user's home directory.
//!
//! ```text
//! ~/.harbormaster/
//!   config.yaml               (optional settings)
//!   projects/
//!     <internal_project_id>/
//!       env.yaml              (credential records, mode 0600)
//! ```

use std::path::{Path, PathBuf};

use crate::types::InternalProjectId;

pub const CONFIG_FILE: &str = "config.yaml";
pub const ENV_FILE: &str = "env.yaml";

pub fn harbormaster_root(home: &Path) -> PathBuf {
    home.join(".harbormaster")
}

pub fn config_path(home: &Path) -> PathBuf {
    harbormaster_root(home).join(CONFIG_FILE)
}

pub fn projects_root(home: &Path) -> PathBuf {
    harbormaster_root(home).join("projects")
}

pub fn project_dir(home: &Path, project: InternalProjectId) -> PathBuf {
    projects_root(home).join(project.to_string())
}

pub fn env_path(home: &Path, project: InternalProjectId) -> PathBuf {
    project_dir(home, project).join(ENV_FILE)
}
