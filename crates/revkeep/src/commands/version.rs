//! Version lifecycle command handlers.
//!
//! Handles creating, listing, restoring and removing versions, and listing
//! tracked files.

use revkeep_version::{VersionId, VersionService};
use std::path::Path;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Handle `revkeep create`.
pub async fn handle_create(service: &VersionService, file: &Path, message: &str) -> anyhow::Result<()> {
    let record = service.create(file, message).await?;
    println!(
        "Created version {} ({} bytes, sha256 {})",
        record.id, record.size, record.checksum
    );
    Ok(())
}

/// Handle `revkeep list`.
pub async fn handle_list(service: &VersionService, file: &Path) -> anyhow::Result<()> {
    let records = service.list(file).await?;

    if records.is_empty() {
        println!("No versions found.");
        return Ok(());
    }

    println!("Versions of {}:", file.display());
    println!();
    println!(
        "{:<8} {:<30} {:<20} {:>12}  {}",
        "ID", "MESSAGE", "CREATED AT", "SIZE", "CHECKSUM"
    );
    println!("{}", "-".repeat(138));

    for record in records {
        let message = if record.message.chars().count() > 30 {
            let short: String = record.message.chars().take(27).collect();
            format!("{short}...")
        } else {
            record.message.clone()
        };
        let created = record
            .created_at
            .with_timezone(&chrono::Local)
            .format(TIME_FORMAT)
            .to_string();
        println!(
            "{:<8} {:<30} {:<20} {:>12}  {}",
            record.id.as_str(), message, created, record.size, record.checksum
        );
    }

    Ok(())
}

/// Handle `revkeep restore`.
pub async fn handle_restore(
    service: &VersionService,
    file: &Path,
    id: &str,
    to: Option<&Path>,
) -> anyhow::Result<()> {
    let id = VersionId::parse(id)?;
    let record = match to {
        Some(dest) => {
            let record = service.restore_to(file, &id, dest).await?;
            println!("Restored {} of {} to {}", record.id, file.display(), dest.display());
            record
        }
        None => {
            let record = service.restore(file, &id).await?;
            println!("Restored {} to {}", file.display(), record.id);
            record
        }
    };
    tracing::debug!(checksum = %record.checksum, "Checksum verified");
    Ok(())
}

/// Handle `revkeep remove <FILE> <ID>`.
pub async fn handle_remove(service: &VersionService, file: &Path, id: &str) -> anyhow::Result<()> {
    let id = VersionId::parse(id)?;
    service.remove(file, &id).await?;
    println!("Removed version {id} of {}", file.display());
    Ok(())
}

/// Handle `revkeep remove <FILE> --all`.
pub async fn handle_remove_all(service: &VersionService, file: &Path) -> anyhow::Result<()> {
    let summary = service.remove_all(file).await?;
    println!(
        "Removed all versions of {}: {} files deleted, {} failed, {} directories skipped",
        file.display(),
        summary.deleted,
        summary.failed,
        summary.skipped
    );
    if summary.failed > 0 {
        anyhow::bail!("{} files could not be deleted", summary.failed);
    }
    Ok(())
}

/// Handle `revkeep tracked`.
pub async fn handle_tracked(service: &VersionService) -> anyhow::Result<()> {
    let entries = service.tracked().await?;

    if entries.is_empty() {
        println!("No tracked files.");
        return Ok(());
    }

    println!("{:<20} {:<24} {}", "UPDATED", "VERSIONS", "PATH");
    println!("{}", "-".repeat(78));

    for entry in entries {
        let updated = entry
            .last_updated_at
            .with_timezone(&chrono::Local)
            .format(TIME_FORMAT)
            .to_string();
        let ids: Vec<&str> = entry.version_ids.iter().map(|id| id.as_str()).collect();
        println!(
            "{:<20} {:<24} {}",
            updated,
            ids.join(","),
            entry.original_path.display()
        );
    }

    Ok(())
}
