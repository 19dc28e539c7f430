//! Credential store port and adapters.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use harbormaster_core::{store, CredentialEnvVariable, InternalProjectId, StoreError};

/// Persists scoped key/value records for an internal project.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn insert_env_variable(&self, variable: &CredentialEnvVariable) -> Result<(), StoreError>;
}

#[async_trait]
impl<T: CredentialStore + ?Sized> CredentialStore for Arc<T> {
    async fn insert_env_variable(&self, variable: &CredentialEnvVariable) -> Result<(), StoreError> {
        (**self).insert_env_variable(variable).await
    }
}

/// YAML store under `<home>/.harbormaster/`. File I/O runs on the blocking pool.
///
/// Inserts are serialized through a write lock shared by all clones, so
/// concurrent callers in this process never overwrite each other's records.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    home: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl FileCredentialStore {
    pub fn new(home: impl Into<PathBuf>) -> Self {
        Self {
            home: home.into(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Store rooted at the current user's home directory.
    pub fn from_home_dir() -> Result<Self, StoreError> {
        dirs::home_dir().map(Self::new).ok_or(StoreError::HomeNotFound)
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn insert_env_variable(&self, variable: &CredentialEnvVariable) -> Result<(), StoreError> {
        // Held by the blocking task so a cancelled caller cannot release it mid-write.
        let write = self.write_lock.clone().lock_owned().await;
        let home = self.home.clone();
        let variable = variable.clone();
        tokio::task::spawn_blocking(move || {
            let _write = write;
            store::insert_env_variable_at(&home, &variable)
        })
        .await
        .map_err(|e| StoreError::Unavailable(e.to_string()))??;
        Ok(())
    }
}

/// In-process store with the same uniqueness rule as the file store.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    records: Mutex<Vec<CredentialEnvVariable>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn records(&self) -> Vec<CredentialEnvVariable> {
        self.records.lock().await.clone()
    }

    pub async fn records_for(&self, project: InternalProjectId) -> Vec<CredentialEnvVariable> {
        self.records
            .lock()
            .await
            .iter()
            .filter(|r| r.project == project)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn insert_env_variable(&self, variable: &CredentialEnvVariable) -> Result<(), StoreError> {
        let mut records = self.records.lock().await;
        if records
            .iter()
            .any(|r| r.project == variable.project && r.name == variable.name)
        {
            return Err(StoreError::Duplicate {
                name: variable.name,
                project: variable.project,
            });
        }
        records.push(variable.clone());
        Ok(())
    }
}
