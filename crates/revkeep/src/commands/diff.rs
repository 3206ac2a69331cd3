//! Diff command handler.

use revkeep_version::{format_diff, VersionId, VersionService};
use std::path::{Path, PathBuf};

/// What the first file of `revkeep diff` is compared against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffTarget {
    /// Another file on disk.
    File(PathBuf),
    /// The latest version of the first file.
    Last,
    /// A specific version of the first file.
    Version(String),
}

/// Handle `revkeep diff`.
pub async fn handle_diff(service: &VersionService, file: &Path, target: DiffTarget) -> anyhow::Result<()> {
    let result = match target {
        DiffTarget::File(other) => service.diff(file, &other).await?,
        DiffTarget::Last => service.diff_last(file).await?,
        DiffTarget::Version(id) => {
            let id = VersionId::parse(&id)?;
            service.diff_version(file, &id).await?
        }
    };

    print!("{}", format_diff(&result));
    Ok(())
}
