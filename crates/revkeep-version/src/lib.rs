//! Per-file version history for revkeep.
//!
//! Every tracked file gets a storage directory named after the SHA-256 of
//! its absolute path. Each version is a full copy of the file plus a record
//! carrying its checksum, and a global index lists every tracked file.
//!
//! # Example
//!
//! ```no_run
//! use revkeep_version::{VersionConfig, VersionService};
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let (config, _) = VersionConfig::load().await?;
//! let service = VersionService::open(config).await?;
//!
//! let record = service.create(Path::new("notes.txt"), "first draft").await?;
//!
//! // ... edit the file ...
//!
//! let diff = service.diff_last(Path::new("notes.txt")).await?;
//! print!("{}", revkeep_version::format_diff(&diff));
//!
//! service.restore(Path::new("notes.txt"), &record.id).await?;
//! # Ok(())
//! # }
//! ```

mod config;
mod content;
mod diff;
mod error;
mod hasher;
mod index;
mod lock;
mod metadata;
mod record;
mod service;

pub use config::{IdPolicy, VersionConfig, DEFAULT_COPY_BUFFER_SIZE, DEFAULT_LARGE_FILE_THRESHOLD};
pub use content::{ContentStore, RemovalSummary};
pub use diff::{compare, format_diff, has_changed, DiffKind, DiffResult, LineChange, LineDiff};
pub use error::{VersionError, VersionResult};
pub use hasher::{storage_name, PathHasher, StorageDir};
pub use index::GlobalIndex;
pub use metadata::MetadataStore;
pub use record::{GlobalIndexEntry, VersionId, VersionRecord};
pub use service::VersionService;
