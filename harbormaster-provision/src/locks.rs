//! Optional per-project mutual exclusion.
//!
//! Operations on different projects never contend. Two operations on the same
//! project name run one after the other when the provisioner is given a
//! [`ProjectLocks`].

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use harbormaster_core::ProjectName;

/// Shared registry of per-project async locks. Cheap to clone.
#[derive(Debug, Clone, Default)]
pub struct ProjectLocks {
    inner: Arc<Mutex<HashMap<ProjectName, Arc<AsyncMutex<()>>>>>,
}

impl ProjectLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `project`. The lock is held until the
    /// guard is dropped.
    pub async fn acquire(&self, project: &ProjectName) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().unwrap_or_else(|e| e.into_inner());
            // Entries only referenced by the map have no holder or waiter.
            map.retain(|name, lock| name == project || Arc::strong_count(lock) > 1);
            map.entry(project.clone()).or_default().clone()
        };
        lock.lock_owned().await
    }

    /// Number of projects currently tracked.
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
