//! Version store error types.

use crate::VersionId;
use revkeep_storage::StorageError;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for version operations.
pub type VersionResult<T> = Result<T, VersionError>;

/// Errors that can occur during version operations.
#[derive(Debug, Error)]
pub enum VersionError {
    /// The file has never been versioned (no metadata file).
    #[error("No version currently exists of {}", path.display())]
    NoVersions { path: PathBuf },

    /// The requested version has no snapshot or no record.
    #[error("Version {id} does not exist for {}", path.display())]
    VersionNotFound { id: String, path: PathBuf },

    /// Create was attempted but the file matches its latest version.
    #[error("A version without changes already exists for {} ({latest})", path.display())]
    AlreadyUpToDate { path: PathBuf, latest: VersionId },

    /// Snapshot bytes no longer match the checksum recorded at creation.
    #[error("Checksum verification failed for {id}: file may be corrupted (expected {expected}, got {actual})")]
    Integrity {
        id: VersionId,
        expected: String,
        actual: String,
    },

    /// IO failure on a specific path.
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed JSON in a metadata, index or config document.
    #[error("Failed to decode {what}: {source}")]
    Decode {
        what: String,
        #[source]
        source: serde_json::Error,
    },

    /// Invalid argument (bad version id, not a regular file, ...).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Neither a configured root nor a user config directory is available.
    #[error("Could not determine the configuration directory")]
    ConfigDirUnavailable,

    /// Storage backend failure that carries no path.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl VersionError {
    /// Create an IO error for the given path.
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Create a version not found error.
    pub fn version_not_found(id: impl Into<String>, path: impl AsRef<Path>) -> Self {
        Self::VersionNotFound {
            id: id.into(),
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Create an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Whether this error means "nothing there" rather than a failure.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::NoVersions { .. } | Self::VersionNotFound { .. }
        )
    }
}

impl From<StorageError> for VersionError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Io { path, source } => Self::Io { path, source },
            StorageError::Decode { key, source } => Self::Decode { what: key, source },
            StorageError::Json(source) => Self::Decode {
                what: "document".to_string(),
                source,
            },
            other => Self::Storage(other.to_string()),
        }
    }
}
