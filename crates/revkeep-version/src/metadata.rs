//! Per-file metadata: the ordered list of version records.

use crate::hasher::StorageDir;
use crate::{IdPolicy, VersionError, VersionId, VersionRecord, VersionResult};
use revkeep_storage::Storage;
use std::sync::Arc;
use tracing::debug;

/// Reads and rewrites `version.json` in each storage directory.
///
/// The list is kept in creation order. Every change rewrites the whole
/// document; callers serialize access per directory.
pub struct MetadataStore<S> {
    storage: Arc<S>,
}

impl<S: Storage> MetadataStore<S> {
    /// Create a metadata store on top of a storage backend.
    pub fn new(storage: Arc<S>) -> Self {
        Self { storage }
    }

    /// Read the records, or `None` if the file was never versioned.
    pub async fn load(&self, dir: &StorageDir) -> VersionResult<Option<Vec<VersionRecord>>> {
        Ok(self.storage.read_list(&dir.metadata_key()).await?)
    }

    /// Read the records, failing with `NoVersions` if there is no metadata.
    pub async fn list(&self, dir: &StorageDir) -> VersionResult<Vec<VersionRecord>> {
        self.load(dir).await?.ok_or_else(|| VersionError::NoVersions {
            path: dir.original.clone(),
        })
    }

    /// Append a record, creating the metadata document if needed.
    pub async fn append(&self, dir: &StorageDir, record: VersionRecord) -> VersionResult<usize> {
        debug!(id = %record.id, dir = %dir.path.display(), "Appending version record");
        let len = self
            .storage
            .update_list(&dir.metadata_key(), move |records: &mut Vec<VersionRecord>| {
                records.push(record);
                records.len()
            })
            .await?;
        Ok(len)
    }

    /// Replace the whole record list.
    pub async fn rewrite(&self, dir: &StorageDir, records: &[VersionRecord]) -> VersionResult<()> {
        debug!(count = records.len(), dir = %dir.path.display(), "Rewriting version records");
        self.storage.write(&dir.metadata_key(), &records).await?;
        Ok(())
    }

    /// Choose the id for the next version.
    ///
    /// Under [`IdPolicy::Reuse`] this is `max(N) + 1` over the surviving
    /// records, so removing the newest version frees its id again.
    /// [`IdPolicy::Monotonic`] also honours the recorded high-water mark.
    pub async fn next_id(
        &self,
        dir: &StorageDir,
        records: &[VersionRecord],
        policy: IdPolicy,
    ) -> VersionResult<VersionId> {
        let highest = records
            .iter()
            .filter_map(|r| r.id.ordinal())
            .max()
            .unwrap_or(0);

        let floor = match policy {
            IdPolicy::Reuse => 0,
            IdPolicy::Monotonic => self
                .storage
                .read::<u64>(&dir.sequence_key())
                .await?
                .unwrap_or(0),
        };

        Ok(VersionId::from_ordinal(highest.max(floor) + 1))
    }

    /// Remember that `id` was handed out, for [`IdPolicy::Monotonic`].
    pub async fn record_issued(&self, dir: &StorageDir, id: &VersionId) -> VersionResult<()> {
        let Some(ordinal) = id.ordinal() else {
            return Ok(());
        };
        let current = self
            .storage
            .read::<u64>(&dir.sequence_key())
            .await?
            .unwrap_or(0);
        if ordinal > current {
            self.storage.write(&dir.sequence_key(), &ordinal).await?;
        }
        Ok(())
    }
}
