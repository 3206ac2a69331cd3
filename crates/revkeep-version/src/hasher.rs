//! Mapping from original file paths to per-file storage directories.

use crate::{VersionError, VersionResult};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Name of the directory under the storage root holding one directory per file.
pub const VERSIONS_DIR: &str = "versions";

/// Key name of the per-file metadata document (`version.json`).
pub const METADATA_NAME: &str = "version";

/// Key name of the per-file id high-water mark (`sequence.json`).
pub const SEQUENCE_NAME: &str = "sequence";

/// File name of the high-water mark inside the storage directory.
pub const SEQUENCE_FILE: &str = "sequence.json";

/// The storage directory of one tracked file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageDir {
    /// Absolute, normalized path of the original file.
    pub original: PathBuf,

    /// Hex SHA-256 of the original path; the directory name.
    pub name: String,

    /// Full path of the directory.
    pub path: PathBuf,
}

impl StorageDir {
    /// Storage key of this file's metadata document.
    pub fn metadata_key(&self) -> [&str; 3] {
        [VERSIONS_DIR, &self.name, METADATA_NAME]
    }

    /// Storage key of this file's id high-water mark.
    pub fn sequence_key(&self) -> [&str; 3] {
        [VERSIONS_DIR, &self.name, SEQUENCE_NAME]
    }
}

/// Hex SHA-256 of a path's bytes.
///
/// Identity is purely textual: a renamed or moved file hashes to a
/// different directory.
pub fn storage_name(path: &Path) -> String {
    let digest = Sha256::digest(path.as_os_str().as_encoded_bytes());
    hex::encode(digest)
}

/// Resolves original paths to storage directories under a versions root.
#[derive(Debug, Clone)]
pub struct PathHasher {
    versions_root: PathBuf,
}

impl PathHasher {
    /// Create a hasher for the given storage root.
    pub fn new(root: &Path) -> Self {
        Self {
            versions_root: root.join(VERSIONS_DIR),
        }
    }

    /// Compute the storage directory for a path without touching the disk.
    pub fn resolve(&self, original: &Path) -> VersionResult<StorageDir> {
        let original =
            revkeep_util::absolute(original).map_err(|e| VersionError::io(original, e))?;
        let name = storage_name(&original);
        let path = self.versions_root.join(&name);
        Ok(StorageDir {
            original,
            name,
            path,
        })
    }

    /// Compute the storage directory for a path and make sure it exists.
    pub async fn locate(&self, original: &Path) -> VersionResult<StorageDir> {
        let dir = self.resolve(original)?;
        tokio::fs::create_dir_all(&dir.path)
            .await
            .map_err(|e| VersionError::io(&dir.path, e))?;
        debug!(original = %dir.original.display(), dir = %dir.path.display(), "Located storage directory");
        Ok(dir)
    }
}
