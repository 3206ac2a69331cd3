//! Version data structures.

use crate::{VersionError, VersionResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Identifier of one version of a file: `"v"` followed by a positive number.
///
/// Ids are unique within one file's history only. The same id string
/// appears in the histories of many files.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionId(String);

impl VersionId {
    /// Build the id for a version ordinal, e.g. `3` -> `v3`.
    pub fn from_ordinal(ordinal: u64) -> Self {
        Self(format!("v{ordinal}"))
    }

    /// Parse user input into a version id.
    ///
    /// Only `v<N>` with `N >= 1` is accepted, which also keeps the id safe
    /// to use as a file name inside a storage directory.
    pub fn parse(s: &str) -> VersionResult<Self> {
        let id = Self(s.trim().to_string());
        match id.ordinal() {
            Some(n) if n > 0 => Ok(id),
            _ => Err(VersionError::invalid_input(format!(
                "invalid version id '{s}', expected v1, v2, ..."
            ))),
        }
    }

    /// The numeric part of the id, if it has the `v<N>` form.
    pub fn ordinal(&self) -> Option<u64> {
        let digits = self.0.strip_prefix('v')?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok()
    }

    /// Get the ID as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for VersionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(&self.0)
    }
}

/// Metadata describing one stored snapshot of a file.
///
/// Records are never edited after creation; removal filters them out of the
/// metadata list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRecord {
    /// Version id, also the snapshot file name.
    pub id: VersionId,

    /// Message supplied when the version was created.
    pub message: String,

    /// Snapshot size in bytes.
    pub size: u64,

    /// Hex-encoded SHA-256 of the snapshot bytes.
    pub checksum: String,

    /// When the version was created.
    pub created_at: DateTime<Utc>,
}

impl VersionRecord {
    /// Create a record stamped with the current time.
    pub fn new(
        id: VersionId,
        message: impl Into<String>,
        size: u64,
        checksum: impl Into<String>,
    ) -> Self {
        Self {
            id,
            message: message.into(),
            size,
            checksum: checksum.into(),
            created_at: Utc::now(),
        }
    }
}

/// Global index entry: every version id known for one original path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalIndexEntry {
    /// Absolute path of the versioned file.
    pub original_path: PathBuf,

    /// Version ids in insertion order, without duplicates.
    pub version_ids: Vec<VersionId>,

    /// Last time a version was added for this path.
    pub last_updated_at: DateTime<Utc>,
}

impl GlobalIndexEntry {
    /// Create an entry holding a single version id.
    pub fn new(original_path: impl Into<PathBuf>, id: VersionId) -> Self {
        Self {
            original_path: original_path.into(),
            version_ids: vec![id],
            last_updated_at: Utc::now(),
        }
    }

    /// Append an id unless already present, and refresh the timestamp.
    pub fn touch(&mut self, id: VersionId) {
        if !self.version_ids.contains(&id) {
            self.version_ids.push(id);
        }
        self.last_updated_at = Utc::now();
    }

    /// Drop an id. Returns whether it was present.
    pub fn forget(&mut self, id: &VersionId) -> bool {
        let before = self.version_ids.len();
        self.version_ids.retain(|v| v != id);
        self.version_ids.len() != before
    }
}
