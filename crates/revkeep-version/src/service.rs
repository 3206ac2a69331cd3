//! Version service: the per-file version lifecycle.

use crate::content::{ContentStore, RemovalSummary};
use crate::diff::{self, DiffResult};
use crate::hasher::{PathHasher, StorageDir, SEQUENCE_FILE};
use crate::index::GlobalIndex;
use crate::lock::LockRegistry;
use crate::metadata::MetadataStore;
use crate::{
    GlobalIndexEntry, IdPolicy, VersionConfig, VersionError, VersionId, VersionRecord,
    VersionResult,
};
use revkeep_storage::{JsonStorage, Storage};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Creates, lists, restores, removes and diffs versions of files.
///
/// Storage layout under the root directory:
/// ```text
/// root/
///   global.json            # index of every tracked file
///   versions/
///     <sha256 of path>/
///       version.json       # records, in creation order
///       sequence.json      # id high-water mark (monotonic ids only)
///       v1, v2, ...        # snapshot bytes
/// ```
///
/// All mutations of one storage directory are serialized, and so are all
/// rewrites of the global index.
pub struct VersionService<S: Storage = JsonStorage> {
    config: VersionConfig,
    root: PathBuf,
    hasher: PathHasher,
    metadata: MetadataStore<S>,
    index: GlobalIndex<S>,
    content: ContentStore,
    locks: LockRegistry,
}

impl VersionService<JsonStorage> {
    /// Open the service on the configured root, creating it if needed.
    pub async fn open(config: VersionConfig) -> VersionResult<Self> {
        let root = config.root_dir()?;
        tokio::fs::create_dir_all(&root)
            .await
            .map_err(|e| VersionError::io(&root, e))?;
        let storage = Arc::new(JsonStorage::new(&root));
        Ok(Self::with_storage(config, root, storage))
    }
}

impl<S: Storage> VersionService<S> {
    /// Build a service over an explicit storage backend.
    ///
    /// `root` holds the snapshot files; `storage` holds the JSON documents
    /// and is normally a [`JsonStorage`] rooted at the same directory.
    pub fn with_storage(config: VersionConfig, root: impl Into<PathBuf>, storage: Arc<S>) -> Self {
        let root = root.into();
        Self {
            hasher: PathHasher::new(&root),
            metadata: MetadataStore::new(storage.clone()),
            index: GlobalIndex::new(storage),
            content: ContentStore::new(config.copy_buffer_size),
            locks: LockRegistry::new(),
            root,
            config,
        }
    }

    /// The storage root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The active configuration.
    pub fn config(&self) -> &VersionConfig {
        &self.config
    }

    /// Snapshot the current content of `path` as a new version.
    ///
    /// Fails with [`VersionError::AlreadyUpToDate`] when the file matches its
    /// latest version; nothing is written in that case.
    pub async fn create(&self, path: &Path, message: &str) -> VersionResult<VersionRecord> {
        let source = self.hasher.resolve(path)?.original;
        let meta = tokio::fs::metadata(&source)
            .await
            .map_err(|e| VersionError::io(&source, e))?;
        if !meta.is_file() {
            return Err(VersionError::invalid_input(format!(
                "{} is not a regular file",
                source.display()
            )));
        }

        let dir = self.hasher.locate(&source).await?;
        let _guard = self.locks.dir(&dir.path).await;

        let records = self.metadata.load(&dir).await?.unwrap_or_default();
        if let Some(head) = records.last() {
            let head_path = self.content.snapshot_path(&dir, &head.id);
            let latest = if self.content.exists(&dir, &head.id).await {
                Some(head_path.as_path())
            } else {
                warn!(id = %head.id, path = %head_path.display(), "Latest snapshot is missing");
                None
            };
            if !diff::has_changed(&dir.original, latest).await? {
                return Err(VersionError::AlreadyUpToDate {
                    path: dir.original.clone(),
                    latest: head.id.clone(),
                });
            }
        }

        let id = self
            .metadata
            .next_id(&dir, &records, self.config.id_policy)
            .await?;
        let (size, checksum) = self.content.store(&dir, &id, &dir.original).await?;
        let record = VersionRecord::new(id, message, size, checksum);

        if let Err(e) = self.metadata.append(&dir, record.clone()).await {
            if let Err(cleanup) = self.content.remove(&dir, &record.id).await {
                warn!(id = %record.id, error = %cleanup, "Failed to remove orphaned snapshot");
            }
            return Err(e);
        }
        if self.config.id_policy == IdPolicy::Monotonic {
            self.metadata.record_issued(&dir, &record.id).await?;
        }

        {
            let _index = self.locks.index().await;
            self.index.upsert(&dir.original, &record.id).await?;
        }

        info!(
            path = %dir.original.display(),
            id = %record.id,
            size = record.size,
            "Created version"
        );
        Ok(record)
    }

    /// All versions of `path`, oldest first.
    pub async fn list(&self, path: &Path) -> VersionResult<Vec<VersionRecord>> {
        let dir = self.hasher.resolve(path)?;
        self.metadata.list(&dir).await
    }

    /// The most recent surviving version of `path`, if any.
    pub async fn head(&self, path: &Path) -> VersionResult<Option<VersionRecord>> {
        let dir = self.hasher.resolve(path)?;
        Ok(self
            .metadata
            .load(&dir)
            .await?
            .and_then(|mut records| records.pop()))
    }

    /// Overwrite `path` with the content of version `id`.
    pub async fn restore(&self, path: &Path, id: &VersionId) -> VersionResult<VersionRecord> {
        self.restore_to(path, id, path).await
    }

    /// Write the content of version `id` of `path` to `destination`.
    ///
    /// The snapshot is verified against its recorded checksum first; on a
    /// mismatch the destination is not touched.
    pub async fn restore_to(
        &self,
        path: &Path,
        id: &VersionId,
        destination: &Path,
    ) -> VersionResult<VersionRecord> {
        let dir = self.hasher.resolve(path)?;
        let destination =
            revkeep_util::absolute(destination).map_err(|e| VersionError::io(destination, e))?;
        let _guard = self.locks.dir(&dir.path).await;

        if !self.content.exists(&dir, id).await {
            return Err(VersionError::version_not_found(id.as_str(), &dir.original));
        }
        let record = self.find(&dir, id).await?;

        let size = self
            .content
            .restore(&dir, id, &record.checksum, &destination)
            .await?;

        info!(
            path = %dir.original.display(),
            %id,
            size,
            destination = %destination.display(),
            "Restored version"
        );
        Ok(record)
    }

    /// Delete one version of `path`.
    pub async fn remove(&self, path: &Path, id: &VersionId) -> VersionResult<()> {
        let dir = self.hasher.resolve(path)?;
        let _guard = self.locks.dir(&dir.path).await;

        self.content.remove(&dir, id).await?;

        if let Some(mut records) = self.metadata.load(&dir).await? {
            let before = records.len();
            records.retain(|r| &r.id != id);
            if records.len() != before {
                self.metadata.rewrite(&dir, &records).await?;
            } else {
                debug!(%id, "Removed snapshot had no record");
            }
        }

        {
            let _index = self.locks.index().await;
            self.index.forget(&dir.original, id).await?;
        }

        info!(path = %dir.original.display(), %id, "Removed version");
        Ok(())
    }

    /// Delete every version of `path` along with its metadata.
    ///
    /// Best effort: files that fail to delete are counted in the summary
    /// instead of aborting the sweep. Under [`IdPolicy::Monotonic`] the id
    /// high-water mark is kept so removed ids are never handed out again.
    pub async fn remove_all(&self, path: &Path) -> VersionResult<RemovalSummary> {
        let dir = self.hasher.resolve(path)?;
        let _guard = self.locks.dir(&dir.path).await;

        let present = tokio::fs::try_exists(&dir.path)
            .await
            .map_err(|e| VersionError::io(&dir.path, e))?;
        if !present {
            return Err(VersionError::NoVersions {
                path: dir.original.clone(),
            });
        }

        // Monotonic ids must survive the sweep, so the high-water mark stays.
        let keep: &[&str] = match self.config.id_policy {
            IdPolicy::Reuse => &[],
            IdPolicy::Monotonic => {
                let records = self.metadata.load(&dir).await?.unwrap_or_default();
                if let Some(highest) = records.iter().filter_map(|r| r.id.ordinal()).max() {
                    self.metadata
                        .record_issued(&dir, &VersionId::from_ordinal(highest))
                        .await?;
                }
                &[SEQUENCE_FILE]
            }
        };

        let summary = self.content.sweep(&dir, keep).await?;
        if keep.is_empty() && summary.failed == 0 && summary.skipped == 0 {
            if let Err(e) = tokio::fs::remove_dir(&dir.path).await {
                debug!(dir = %dir.path.display(), error = %e, "Storage directory left in place");
            }
        }

        {
            let _index = self.locks.index().await;
            self.index.forget_path(&dir.original).await?;
        }

        info!(
            path = %dir.original.display(),
            deleted = summary.deleted,
            failed = summary.failed,
            skipped = summary.skipped,
            "Removed all versions"
        );
        Ok(summary)
    }

    /// Compare two arbitrary files.
    pub async fn diff(&self, left: &Path, right: &Path) -> VersionResult<DiffResult> {
        diff::compare(
            left,
            right,
            self.config.large_file_threshold,
            &self.content,
        )
        .await
    }

    /// Compare the latest version of `path` (left) with the file as it is now (right).
    pub async fn diff_last(&self, path: &Path) -> VersionResult<DiffResult> {
        let dir = self.hasher.resolve(path)?;
        let head = self
            .metadata
            .list(&dir)
            .await?
            .pop()
            .ok_or_else(|| VersionError::NoVersions {
                path: dir.original.clone(),
            })?;
        self.diff_against(&dir, &head.id).await
    }

    /// Compare version `id` of `path` (left) with the file as it is now (right).
    pub async fn diff_version(&self, path: &Path, id: &VersionId) -> VersionResult<DiffResult> {
        let dir = self.hasher.resolve(path)?;
        self.find(&dir, id).await?;
        self.diff_against(&dir, id).await
    }

    /// Every tracked file, sorted by path.
    pub async fn tracked(&self) -> VersionResult<Vec<GlobalIndexEntry>> {
        self.index.entries().await
    }

    async fn diff_against(&self, dir: &StorageDir, id: &VersionId) -> VersionResult<DiffResult> {
        if !self.content.exists(dir, id).await {
            return Err(VersionError::version_not_found(id.as_str(), &dir.original));
        }
        let snapshot = self.content.snapshot_path(dir, id);
        self.diff(&snapshot, &dir.original).await
    }

    async fn find(&self, dir: &StorageDir, id: &VersionId) -> VersionResult<VersionRecord> {
        self.metadata
            .list(dir)
            .await?
            .into_iter()
            .find(|r| &r.id == id)
            .ok_or_else(|| VersionError::version_not_found(id.as_str(), &dir.original))
    }
}
