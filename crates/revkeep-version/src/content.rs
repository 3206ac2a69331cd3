//! Snapshot bytes: one file per version inside the storage directory.

use crate::hasher::StorageDir;
use crate::{VersionError, VersionId, VersionResult};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tokio::fs::{self, File};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};

/// Suffix of the temp file a restore writes before renaming it into place.
const RESTORE_SUFFIX: &str = ".revkeep-restore";

/// Outcome of removing every file in a storage directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RemovalSummary {
    /// Files deleted.
    pub deleted: usize,
    /// Files that could not be deleted.
    pub failed: usize,
    /// Subdirectories left alone.
    pub skipped: usize,
}

/// Stores and reads raw snapshot files.
#[derive(Debug, Clone)]
pub struct ContentStore {
    buffer_size: usize,
}

impl ContentStore {
    /// Create a content store streaming with the given buffer size.
    pub fn new(buffer_size: usize) -> Self {
        Self {
            buffer_size: buffer_size.max(1),
        }
    }

    /// Path of a snapshot file.
    pub fn snapshot_path(&self, dir: &StorageDir, id: &VersionId) -> PathBuf {
        dir.path.join(id.as_str())
    }

    /// Whether a snapshot file exists.
    pub async fn exists(&self, dir: &StorageDir, id: &VersionId) -> bool {
        fs::metadata(self.snapshot_path(dir, id))
            .await
            .map(|m| m.is_file())
            .unwrap_or(false)
    }

    /// Copy `source` into the snapshot file for `id`.
    ///
    /// Hashes while copying; returns the byte count and hex SHA-256. A
    /// partially written snapshot is removed on failure.
    pub async fn store(
        &self,
        dir: &StorageDir,
        id: &VersionId,
        source: &Path,
    ) -> VersionResult<(u64, String)> {
        let target = self.snapshot_path(dir, id);
        let mut reader = File::open(source)
            .await
            .map_err(|e| VersionError::io(source, e))?;
        let mut writer = File::create(&target)
            .await
            .map_err(|e| VersionError::io(&target, e))?;

        let result = self
            .copy_hashed(&mut reader, source, &mut writer, &target)
            .await;
        drop(writer);

        match result {
            Ok((size, checksum)) => {
                debug!(%id, size, %checksum, target = %target.display(), "Stored snapshot");
                Ok((size, checksum))
            }
            Err(e) => {
                if let Err(cleanup) = fs::remove_file(&target).await {
                    warn!(target = %target.display(), error = %cleanup, "Failed to remove partial snapshot");
                }
                Err(e)
            }
        }
    }

    /// Open a snapshot for reading.
    pub async fn open(&self, dir: &StorageDir, id: &VersionId) -> VersionResult<File> {
        let path = self.snapshot_path(dir, id);
        match File::open(&path).await {
            Ok(file) => Ok(file),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(VersionError::version_not_found(id.as_str(), &dir.original))
            }
            Err(e) => Err(VersionError::io(&path, e)),
        }
    }

    /// Verify a snapshot against `expected` and write it to `destination`.
    ///
    /// The bytes go to a temp file beside the destination while being
    /// hashed. Only a matching checksum renames it over the destination,
    /// carrying over the mode of the file it replaces. On any failure the
    /// temp file is removed and the destination is left exactly as it was.
    pub async fn restore(
        &self,
        dir: &StorageDir,
        id: &VersionId,
        expected: &str,
        destination: &Path,
    ) -> VersionResult<u64> {
        let source = self.snapshot_path(dir, id);
        let mut reader = self.open(dir, id).await?;

        let temp = revkeep_util::path::sibling_with_suffix(destination, RESTORE_SUFFIX);
        let mut writer = File::create(&temp)
            .await
            .map_err(|e| VersionError::io(&temp, e))?;

        let copied = self
            .copy_hashed(&mut reader, &source, &mut writer, &temp)
            .await;
        drop(writer);

        let outcome = match copied {
            Ok((size, actual)) if actual == expected => {
                replace_with(&temp, destination).await.map(|()| size)
            }
            Ok((_, actual)) => Err(VersionError::Integrity {
                id: id.clone(),
                expected: expected.to_string(),
                actual,
            }),
            Err(e) => Err(e),
        };

        match outcome {
            Ok(size) => {
                debug!(%id, size, destination = %destination.display(), "Restored snapshot");
                Ok(size)
            }
            Err(e) => {
                if let Err(cleanup) = fs::remove_file(&temp).await {
                    warn!(temp = %temp.display(), error = %cleanup, "Failed to remove restore temp file");
                }
                Err(e)
            }
        }
    }

    /// Delete one snapshot file.
    pub async fn remove(&self, dir: &StorageDir, id: &VersionId) -> VersionResult<()> {
        let path = self.snapshot_path(dir, id);
        if !self.exists(dir, id).await {
            return Err(VersionError::version_not_found(id.as_str(), &dir.original));
        }
        fs::remove_file(&path)
            .await
            .map_err(|e| VersionError::io(&path, e))?;
        debug!(%id, path = %path.display(), "Removed snapshot");
        Ok(())
    }

    /// Delete every top-level file in the storage directory except those
    /// named in `keep`.
    ///
    /// Best effort: a failing file is counted and the sweep goes on.
    /// Subdirectories are skipped.
    pub async fn sweep(&self, dir: &StorageDir, keep: &[&str]) -> VersionResult<RemovalSummary> {
        let mut summary = RemovalSummary::default();
        let mut entries = match fs::read_dir(&dir.path).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(summary),
            Err(e) => return Err(VersionError::io(&dir.path, e)),
        };

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| VersionError::io(&dir.path, e))?
        {
            let path = entry.path();
            let is_dir = entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false);
            if is_dir {
                debug!(path = %path.display(), "Skipping subdirectory");
                summary.skipped += 1;
                continue;
            }
            if keep.iter().any(|name| entry.file_name() == *name) {
                debug!(path = %path.display(), "Keeping");
                continue;
            }

            match fs::remove_file(&path).await {
                Ok(()) => {
                    debug!(path = %path.display(), "Deleted");
                    summary.deleted += 1;
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to delete");
                    summary.failed += 1;
                }
            }
        }

        Ok(summary)
    }

    /// Stream `path` through SHA-256 and return the hex digest.
    pub async fn checksum(&self, path: &Path) -> VersionResult<String> {
        let mut file = File::open(path)
            .await
            .map_err(|e| VersionError::io(path, e))?;
        let mut hasher = Sha256::new();
        let mut buf = vec![0u8; self.buffer_size];
        loop {
            let n = file
                .read(&mut buf)
                .await
                .map_err(|e| VersionError::io(path, e))?;
            if n == 0 {
                break;
            }
            hasher.update(&buf[..n]);
        }
        Ok(hex::encode(hasher.finalize()))
    }

    async fn copy_hashed<R, W>(
        &self,
        reader: &mut R,
        reader_path: &Path,
        writer: &mut W,
        writer_path: &Path,
    ) -> VersionResult<(u64, String)>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut hasher = Sha256::new();
        let mut buf = vec![0u8; self.buffer_size];
        let mut size = 0u64;

        loop {
            let n = reader
                .read(&mut buf)
                .await
                .map_err(|e| VersionError::io(reader_path, e))?;
            if n == 0 {
                break;
            }
            hasher.update(&buf[..n]);
            writer
                .write_all(&buf[..n])
                .await
                .map_err(|e| VersionError::io(writer_path, e))?;
            size += n as u64;
        }

        writer
            .flush()
            .await
            .map_err(|e| VersionError::io(writer_path, e))?;

        Ok((size, hex::encode(hasher.finalize())))
    }
}

/// Move a verified temp file over `destination`, keeping the permissions
/// of the file it replaces.
async fn replace_with(temp: &Path, destination: &Path) -> VersionResult<()> {
    if let Ok(existing) = fs::metadata(destination).await {
        if existing.is_file() {
            fs::set_permissions(temp, existing.permissions())
                .await
                .map_err(|e| VersionError::io(temp, e))?;
        }
    }
    fs::rename(temp, destination)
        .await
        .map_err(|e| VersionError::io(destination, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hasher::PathHasher;
    use tempfile::TempDir;

    // sha256("hello\n")
    const HELLO_SHA: &str = "5891b5b522d5df086d0ff0b110fbd9d21bb4fc7163af34d08286a2e846f6be03";

    async fn setup() -> (TempDir, StorageDir, ContentStore) {
        let root = TempDir::new().unwrap();
        let original = root.path().join("work").join("hello.txt");
        std::fs::create_dir_all(original.parent().unwrap()).unwrap();
        std::fs::write(&original, "hello\n").unwrap();
        let dir = PathHasher::new(&root.path().join("store"))
            .locate(&original)
            .await
            .unwrap();
        (root, dir, ContentStore::new(4))
    }

    #[tokio::test]
    async fn test_store_hashes_while_copying() {
        let (_root, dir, content) = setup().await;
        let id = VersionId::from_ordinal(1);

        let (size, checksum) = content.store(&dir, &id, &dir.original).await.unwrap();
        assert_eq!(size, 6);
        assert_eq!(checksum, HELLO_SHA);
        assert_eq!(
            std::fs::read(content.snapshot_path(&dir, &id)).unwrap(),
            b"hello\n"
        );
        assert_eq!(content.checksum(&dir.original).await.unwrap(), HELLO_SHA);
    }

    #[tokio::test]
    async fn test_store_missing_source_leaves_nothing() {
        let (root, dir, content) = setup().await;
        let id = VersionId::from_ordinal(1);

        let err = content
            .store(&dir, &id, &root.path().join("missing.txt"))
            .await
            .unwrap_err();
        assert!(matches!(err, VersionError::Io { .. }));
        assert!(!content.exists(&dir, &id).await);
    }

    #[tokio::test]
    async fn test_restore_verifies_before_writing() {
        let (root, dir, content) = setup().await;
        let id = VersionId::from_ordinal(1);
        content.store(&dir, &id, &dir.original).await.unwrap();

        let dest = root.path().join("restored.txt");
        std::fs::write(&dest, "keep me").unwrap();

        let err = content
            .restore(&dir, &id, "0000", &dest)
            .await
            .unwrap_err();
        assert!(matches!(err, VersionError::Integrity { .. }));
        assert_eq!(std::fs::read_to_string(&dest).unwrap(), "keep me");
        assert!(!root.path().join("restored.txt.revkeep-restore").exists());

        let size = content.restore(&dir, &id, HELLO_SHA, &dest).await.unwrap();
        assert_eq!(size, 6);
        assert_eq!(std::fs::read_to_string(&dest).unwrap(), "hello\n");
    }

    #[tokio::test]
    async fn test_open_and_remove_missing_snapshot() {
        let (_root, dir, content) = setup().await;
        let id = VersionId::from_ordinal(9);

        assert!(content.open(&dir, &id).await.unwrap_err().is_not_found());
        assert!(content.remove(&dir, &id).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_sweep_skips_directories() {
        let (_root, dir, content) = setup().await;
        content
            .store(&dir, &VersionId::from_ordinal(1), &dir.original)
            .await
            .unwrap();
        std::fs::write(dir.path.join("version.json"), "[]").unwrap();
        std::fs::create_dir(dir.path.join("nested")).unwrap();

        let summary = content.sweep(&dir, &[]).await.unwrap();
        assert_eq!(
            summary,
            RemovalSummary {
                deleted: 2,
                failed: 0,
                skipped: 1
            }
        );
        assert!(dir.path.join("nested").is_dir());
    }

    #[tokio::test]
    async fn test_sweep_keeps_named_files() {
        let (_root, dir, content) = setup().await;
        std::fs::write(dir.path.join("sequence.json"), "2").unwrap();
        std::fs::write(dir.path.join("version.json"), "[]").unwrap();

        let summary = content.sweep(&dir, &["sequence.json"]).await.unwrap();
        assert_eq!(summary.deleted, 1);
        assert!(dir.path.join("sequence.json").exists());
        assert!(!dir.path.join("version.json").exists());
    }

    #[tokio::test]
    async fn test_restore_onto_directory_cleans_temp() {
        let (root, dir, content) = setup().await;
        let id = VersionId::from_ordinal(1);
        content.store(&dir, &id, &dir.original).await.unwrap();

        let dest = root.path().join("adir");
        std::fs::create_dir(&dest).unwrap();

        let err = content.restore(&dir, &id, HELLO_SHA, &dest).await.unwrap_err();
        assert!(matches!(err, VersionError::Io { .. }));
        assert!(dest.is_dir());
        assert!(!root.path().join("adir.revkeep-restore").exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_restore_keeps_destination_mode() {
        use std::os::unix::fs::PermissionsExt;

        let (root, dir, content) = setup().await;
        let id = VersionId::from_ordinal(1);
        content.store(&dir, &id, &dir.original).await.unwrap();

        let dest = root.path().join("run.sh");
        std::fs::write(&dest, "#!/bin/sh\n").unwrap();
        std::fs::set_permissions(&dest, std::fs::Permissions::from_mode(0o755)).unwrap();

        content.restore(&dir, &id, HELLO_SHA, &dest).await.unwrap();
        let mode = std::fs::metadata(&dest).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o755);
        assert_eq!(std::fs::read_to_string(&dest).unwrap(), "hello\n");
    }
}
