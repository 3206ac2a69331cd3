//! Configuration for the version store.
//!
//! Configuration is loaded from multiple sources and merged:
//! 1. Built-in defaults
//! 2. Global config: `~/.config/revkeep/config.json`
//! 3. Environment variable: `REVKEEP_CONFIG_CONTENT` (JSON)
//! 4. Environment variable: `REVKEEP_ROOT` (storage root only)
//!
//! The CLI applies its `--root` flag on top with [`VersionConfig::with_root`].

use crate::{VersionError, VersionResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default size at which the reporting diff checks checksums first (10 MiB).
pub const DEFAULT_LARGE_FILE_THRESHOLD: u64 = 10 * 1024 * 1024;

/// Default streaming buffer size for copy and hash passes.
pub const DEFAULT_COPY_BUFFER_SIZE: usize = 64 * 1024;

const CONFIG_FILE_NAME: &str = "config.json";
const ENV_CONFIG_CONTENT: &str = "REVKEEP_CONFIG_CONTENT";
const ENV_ROOT: &str = "REVKEEP_ROOT";

/// How the next version id is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdPolicy {
    /// `max(surviving N) + 1`. Removing the newest version frees its id.
    #[default]
    Reuse,
    /// Never hand out an id twice, even after removals.
    Monotonic,
}

/// Version store configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionConfig {
    /// Storage root. Defaults to the revkeep config directory.
    pub root: Option<PathBuf>,

    /// Files at or above this size are compared by checksum first.
    pub large_file_threshold: u64,

    /// Version id assignment policy.
    pub id_policy: IdPolicy,

    /// Buffer size per read call when streaming file contents.
    pub copy_buffer_size: usize,
}

impl Default for VersionConfig {
    fn default() -> Self {
        Self {
            root: None,
            large_file_threshold: DEFAULT_LARGE_FILE_THRESHOLD,
            id_policy: IdPolicy::default(),
            copy_buffer_size: DEFAULT_COPY_BUFFER_SIZE,
        }
    }
}

/// A partial config as found in a file or environment variable.
#[derive(Debug, Clone, Default, Deserialize)]
struct ConfigLayer {
    root: Option<PathBuf>,
    large_file_threshold: Option<u64>,
    id_policy: Option<IdPolicy>,
    copy_buffer_size: Option<usize>,
}

impl VersionConfig {
    /// Load configuration from all sources.
    ///
    /// Returns the config and the files it was read from.
    pub async fn load() -> VersionResult<(Self, Vec<PathBuf>)> {
        Self::load_with(revkeep_util::config_dir().as_deref(), |key| {
            std::env::var(key).ok()
        })
        .await
    }

    /// Load configuration from an explicit config directory and environment.
    pub async fn load_with<F>(
        config_dir: Option<&Path>,
        env: F,
    ) -> VersionResult<(Self, Vec<PathBuf>)>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let mut sources = Vec::new();

        if let Some(dir) = config_dir {
            let path = dir.join(CONFIG_FILE_NAME);
            match tokio::fs::read_to_string(&path).await {
                Ok(content) => {
                    config = config.merge(parse_layer(&content, &path.display().to_string())?);
                    sources.push(path);
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(VersionError::io(&path, e)),
            }
        }

        if let Some(content) = env(ENV_CONFIG_CONTENT) {
            config = config.merge(parse_layer(&content, ENV_CONFIG_CONTENT)?);
        }

        if let Some(root) = env(ENV_ROOT).filter(|r| !r.trim().is_empty()) {
            config.root = Some(PathBuf::from(root));
        }

        config.validate()?;
        tracing::debug!(?config, ?sources, "Loaded configuration");
        Ok((config, sources))
    }

    /// Override the storage root.
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    /// Resolve the storage root directory.
    pub fn root_dir(&self) -> VersionResult<PathBuf> {
        match &self.root {
            Some(root) => revkeep_util::absolute(root).map_err(|e| VersionError::io(root, e)),
            None => revkeep_util::config_dir().ok_or(VersionError::ConfigDirUnavailable),
        }
    }

    fn merge(mut self, layer: ConfigLayer) -> Self {
        if layer.root.is_some() {
            self.root = layer.root;
        }
        if let Some(threshold) = layer.large_file_threshold {
            self.large_file_threshold = threshold;
        }
        if let Some(policy) = layer.id_policy {
            self.id_policy = policy;
        }
        if let Some(size) = layer.copy_buffer_size {
            self.copy_buffer_size = size;
        }
        self
    }

    fn validate(&self) -> VersionResult<()> {
        if self.copy_buffer_size == 0 {
            return Err(VersionError::invalid_input(
                "copy_buffer_size must be greater than zero",
            ));
        }
        Ok(())
    }
}

fn parse_layer(content: &str, source: &str) -> VersionResult<ConfigLayer> {
    serde_json::from_str(content).map_err(|e| VersionError::Decode {
        what: source.to_string(),
        source: e,
    })
}
