//! Serialized access to storage directories and the global index.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, MutexGuard, OwnedMutexGuard};

/// One async mutex per storage directory, plus one for the global index.
///
/// Every read-modify-write of a metadata document happens under its
/// directory lock, and every index rewrite under the index lock, so two
/// tasks in one process can't lose each other's updates. Lock order is
/// always directory first, then index. Locks nobody holds or waits on are
/// dropped from the registry whenever a directory lock is taken.
#[derive(Default)]
pub struct LockRegistry {
    dirs: Mutex<HashMap<PathBuf, Arc<AsyncMutex<()>>>>,
    index: AsyncMutex<()>,
}

impl LockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock a storage directory for the lifetime of the guard.
    pub async fn dir(&self, path: &Path) -> OwnedMutexGuard<()> {
        let lock = {
            let mut dirs = self.dirs.lock().unwrap_or_else(|e| e.into_inner());
            // Only the registry references an idle lock.
            dirs.retain(|_, lock| Arc::strong_count(lock) > 1);
            dirs.entry(path.to_path_buf()).or_default().clone()
        };
        lock.lock_owned().await
    }

    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.dirs.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Lock the global index for the lifetime of the guard.
    pub async fn index(&self) -> MutexGuard<'_, ()> {
        self.index.lock().await
    }
}
