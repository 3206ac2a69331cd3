//! Path utilities.
//!
//! This module provides utilities for working with file paths.

use std::io;
use std::path::{Component, Path, PathBuf};

/// Get the revkeep configuration directory.
///
/// On Linux this is `$XDG_CONFIG_HOME/revkeep`, falling back to
/// `~/.config/revkeep`; other platforms use their native config directory.
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("revkeep"))
}

/// Normalize a path by removing `.` and `..` components.
///
/// Unlike `canonicalize`, this doesn't require the path to exist and
/// doesn't resolve symlinks.
pub fn normalize(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();

    for component in path.components() {
        match component {
            Component::ParentDir => {
                result.pop();
            }
            Component::CurDir => {}
            _ => {
                result.push(component);
            }
        }
    }

    result
}

/// Make a path absolute against the current directory and normalize it.
///
/// The file does not have to exist. Two spellings of the same location
/// (`./a/../b.txt` and `b.txt`) produce the same result.
pub fn absolute(path: &Path) -> io::Result<PathBuf> {
    if path.is_absolute() {
        return Ok(normalize(path));
    }
    let cwd = std::env::current_dir()?;
    Ok(normalize(&cwd.join(path)))
}

/// Build a sibling path next to `path` with `suffix` appended to its file name.
///
/// Used for temp files that get renamed over their target, so they stay on
/// the same filesystem.
pub fn sibling_with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(suffix);
    path.with_file_name(name)
}
