//! File-backed credential store.
//!
//! One YAML file per internal project at
//! `~/.harbormaster/projects/<id>/env.yaml` (see [`crate::paths`]).
//! A record is unique by `(name, project)`; inserting a second record with the
//! same name fails with [`StoreError::Duplicate`].
//!
//! # API pattern
//!
//! Readers have two forms:
//! - `fn_at(home: &Path, …)`: explicit home; used in tests with `TempDir`
//! - `fn(…)`: derives home from `dirs::home_dir()`, delegates to `_at`
//!
//! [`insert_env_variable_at`] is a read-modify-write of the whole file and
//! takes no lock; concurrent writers must be serialized by the caller.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::error::StoreError;
use crate::paths;
use crate::types::{CredentialEnvVariable, InternalProjectId};

/// A stored credential record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvRecord {
    #[serde(flatten)]
    pub variable: CredentialEnvVariable,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct EnvFile {
    #[serde(default)]
    variables: Vec<EnvRecord>,
}

// ---------------------------------------------------------------------------
// 1. Load
// ---------------------------------------------------------------------------

/// All records for `project`, in insertion order. Empty if none were written.
pub fn load_env_at(home: &Path, project: InternalProjectId) -> Result<Vec<EnvRecord>, StoreError> {
    Ok(read_file(&paths::env_path(home, project))?.variables)
}

/// `load_env_at` convenience wrapper.
pub fn load_env(project: InternalProjectId) -> Result<Vec<EnvRecord>, StoreError> {
    load_env_at(&home()?, project)
}

/// Ids of every project with a store directory, ascending.
pub fn list_projects_at(home: &Path) -> Result<Vec<InternalProjectId>, StoreError> {
    let dir = paths::projects_root(home);
    if !dir.exists() {
        return Ok(vec![]);
    }
    let mut ids: Vec<InternalProjectId> = std::fs::read_dir(&dir)?
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .filter_map(|e| e.file_name().to_string_lossy().parse::<u64>().ok())
        .map(InternalProjectId)
        .collect();
    ids.sort();
    Ok(ids)
}

/// `list_projects_at` convenience wrapper.
pub fn list_projects() -> Result<Vec<InternalProjectId>, StoreError> {
    list_projects_at(&home()?)
}

// ---------------------------------------------------------------------------
// 2. Insert
// ---------------------------------------------------------------------------

/// Append `variable` to its project's file.
///
/// Write flow: load, reject duplicate, serialize, write a uniquely named
/// sibling temp file, `chmod 0600`, rename over the target.
pub fn insert_env_variable_at(
    home: &Path,
    variable: &CredentialEnvVariable,
) -> Result<EnvRecord, StoreError> {
    let path = paths::env_path(home, variable.project);
    let mut file = read_file(&path)?;
    if file.variables.iter().any(|r| r.variable.name == variable.name) {
        return Err(StoreError::Duplicate {
            name: variable.name,
            project: variable.project,
        });
    }

    let record = EnvRecord {
        variable: variable.clone(),
        created_at: Utc::now(),
    };
    file.variables.push(record.clone());

    ensure_project_dir(home, variable.project)?;
    write_atomic(&path, &serde_yaml::to_string(&file)?)?;
    Ok(record)
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

fn home() -> Result<PathBuf, StoreError> {
    dirs::home_dir().ok_or(StoreError::HomeNotFound)
}

fn read_file(path: &Path) -> Result<EnvFile, StoreError> {
    if !path.exists() {
        return Ok(EnvFile::default());
    }
    let contents = std::fs::read_to_string(path)?;
    serde_yaml::from_str(&contents).map_err(|e| StoreError::Parse {
        path: path.to_path_buf(),
        source: e,
    })
}

fn ensure_project_dir(home: &Path, project: InternalProjectId) -> Result<(), StoreError> {
    let dir = paths::project_dir(home, project);
    if !dir.exists() {
        std::fs::create_dir_all(&dir)?;
        set_dir_permissions(&dir)?;
    }
    Ok(())
}

/// Each writer gets its own temp file, so concurrent writers never share a
/// staging path. Callers serialize the read-modify-write themselves.
fn write_atomic(path: &Path, contents: &str) -> Result<(), StoreError> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(contents.as_bytes())?;
    set_file_permissions(tmp.path())?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(unix)]
fn set_dir_permissions(path: &Path) -> Result<(), StoreError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o700))?;
    Ok(())
}
#[cfg(not(unix))]
fn set_dir_permissions(_path: &Path) -> Result<(), StoreError> {
    Ok(())
}

#[cfg(unix)]
fn set_file_permissions(path: &Path) -> Result<(), StoreError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    Ok(())
}
#[cfg(not(unix))]
fn set_file_permissions(_path: &Path) -> Result<(), StoreError> {
    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
