//! Global index of every tracked file and its version ids.

use crate::{GlobalIndexEntry, VersionId, VersionResult};
use revkeep_storage::Storage;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Key name of the index document (`global.json` under the storage root).
pub const INDEX_NAME: &str = "global";

/// The single cross-file index, stored as one JSON array.
///
/// Every mutation rewrites the whole document. Entries are keyed by original
/// path; duplicates found on disk are merged on the next write.
pub struct GlobalIndex<S> {
    storage: Arc<S>,
}

impl<S: Storage> GlobalIndex<S> {
    /// Create an index on top of a storage backend.
    pub fn new(storage: Arc<S>) -> Self {
        Self { storage }
    }

    /// Record `id` for `original`, creating the entry on first use.
    pub async fn upsert(&self, original: &Path, id: &VersionId) -> VersionResult<GlobalIndexEntry> {
        debug!(path = %original.display(), %id, "Updating global index");
        let original = original.to_path_buf();
        let id = id.clone();
        let entry = self
            .edit(move |entries| {
                entries
                    .entry(original.clone())
                    .and_modify(|e| e.touch(id.clone()))
                    .or_insert_with(|| GlobalIndexEntry::new(original, id))
                    .clone()
            })
            .await?;
        Ok(entry)
    }

    /// Drop `id` from the entry of `original`. Entries left empty are removed.
    pub async fn forget(&self, original: &Path, id: &VersionId) -> VersionResult<bool> {
        debug!(path = %original.display(), %id, "Removing version from global index");
        let original = original.to_path_buf();
        let id = id.clone();
        let removed = self
            .edit(move |entries| {
                let Some(entry) = entries.get_mut(&original) else {
                    return false;
                };
                let removed = entry.forget(&id);
                if entry.version_ids.is_empty() {
                    entries.remove(&original);
                }
                removed
            })
            .await?;
        Ok(removed)
    }

    /// Drop the whole entry of `original`.
    pub async fn forget_path(&self, original: &Path) -> VersionResult<bool> {
        debug!(path = %original.display(), "Removing file from global index");
        let original = original.to_path_buf();
        let removed = self
            .edit(move |entries| entries.remove(&original).is_some())
            .await?;
        Ok(removed)
    }

    /// All entries, sorted by original path.
    pub async fn entries(&self) -> VersionResult<Vec<GlobalIndexEntry>> {
        let entries: Vec<GlobalIndexEntry> = self
            .storage
            .read_list(&[INDEX_NAME])
            .await?
            .unwrap_or_default();
        Ok(Self::by_path(entries).into_values().collect())
    }

    async fn edit<F, R>(&self, editor: F) -> VersionResult<R>
    where
        F: FnOnce(&mut BTreeMap<PathBuf, GlobalIndexEntry>) -> R + Send,
        R: Send,
    {
        let result = self
            .storage
            .update_list(&[INDEX_NAME], move |list: &mut Vec<GlobalIndexEntry>| {
                let mut entries = Self::by_path(std::mem::take(list));
                let result = editor(&mut entries);
                *list = entries.into_values().collect();
                result
            })
            .await?;
        Ok(result)
    }

    fn by_path(list: Vec<GlobalIndexEntry>) -> BTreeMap<PathBuf, GlobalIndexEntry> {
        let mut entries: BTreeMap<PathBuf, GlobalIndexEntry> = BTreeMap::new();
        for entry in list {
            match entries.get_mut(&entry.original_path) {
                Some(existing) => {
                    for id in entry.version_ids {
                        if !existing.version_ids.contains(&id) {
                            existing.version_ids.push(id);
                        }
                    }
                    existing.last_updated_at = existing.last_updated_at.max(entry.last_updated_at);
                }
                None => {
                    entries.insert(entry.original_path.clone(), entry);
                }
            }
        }
        entries
    }
}
