//! revkeep - keep local versions of individual files.
//!
//! This is the main entry point for the revkeep CLI.

mod commands;

use clap::{Parser, Subcommand};
use commands::*;
use revkeep_version::{VersionConfig, VersionService};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "revkeep")]
#[command(author, version, about = "Keep local versions of individual files", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Storage root (defaults to the user config directory)
    #[arg(long, global = true, value_name = "DIR")]
    root: Option<PathBuf>,

    /// Subcommand
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Snapshot the current content of a file
    Create {
        /// File to version
        file: PathBuf,
        /// Message stored with the version
        #[arg(short, long, default_value = "commit")]
        message: String,
    },
    /// List the versions of a file
    List {
        /// Versioned file
        file: PathBuf,
    },
    /// Restore a file to a previous version
    Restore {
        /// Versioned file
        file: PathBuf,
        /// Version id (e.g. v3)
        id: String,
        /// Write the version here instead of over the file
        #[arg(long, value_name = "DEST")]
        to: Option<PathBuf>,
    },
    /// Remove one version, or every version with --all
    Remove {
        /// Versioned file
        file: PathBuf,
        /// Version id (e.g. v3)
        #[arg(required_unless_present = "all")]
        id: Option<String>,
        /// Remove every version and the file's metadata
        #[arg(long, conflicts_with = "id")]
        all: bool,
    },
    /// Show line differences
    ///
    /// With two files, compares them. With one file, compares its latest
    /// version (or --version) against the current content.
    Diff {
        /// First file, or the versioned file
        a: PathBuf,
        /// Second file
        #[arg(conflicts_with_all = ["last", "version"])]
        b: Option<PathBuf>,
        /// Compare against the latest version (default with one file)
        #[arg(long)]
        last: bool,
        /// Compare against a specific version
        #[arg(long, value_name = "ID", conflicts_with = "last")]
        version: Option<String>,
    },
    /// List every tracked file
    Tracked,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let (mut config, sources) = VersionConfig::load().await?;
    if let Some(root) = cli.root {
        config = config.with_root(root);
    }
    tracing::debug!(?sources, "Configuration sources");

    let service = VersionService::open(config).await?;
    tracing::debug!(
        root = %service.root().display(),
        config = ?service.config(),
        "Opened version store"
    );

    match cli.command {
        Commands::Create { file, message } => handle_create(&service, &file, &message).await,
        Commands::List { file } => handle_list(&service, &file).await,
        Commands::Restore { file, id, to } => {
            handle_restore(&service, &file, &id, to.as_deref()).await
        }
        Commands::Remove { file, id, all } => {
            if all {
                handle_remove_all(&service, &file).await
            } else {
                let id = id.ok_or_else(|| anyhow::anyhow!("a version id or --all is required"))?;
                handle_remove(&service, &file, &id).await
            }
        }
        Commands::Diff {
            a,
            b,
            last: _,
            version,
        } => {
            let target = match (b, version) {
                (Some(b), _) => DiffTarget::File(b),
                (None, Some(id)) => DiffTarget::Version(id),
                (None, None) => DiffTarget::Last,
            };
            handle_diff(&service, &a, target).await
        }
        Commands::Tracked => handle_tracked(&service).await,
    }
}
