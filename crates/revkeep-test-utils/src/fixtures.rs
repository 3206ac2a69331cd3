//! Test fixtures for creating files to version and compare.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A temporary directory with a configurable set of files.
///
/// The directory is removed when the built fixture is dropped.
///
/// # Example
///
/// ```rust
/// use revkeep_test_utils::fixtures::TestFiles;
///
/// let files = TestFiles::new()
///     .with_file("notes/todo.txt", "buy milk\n")
///     .with_bytes("blob.bin", vec![0u8, 1, 2])
///     .build();
///
/// assert_eq!(files.read("notes/todo.txt"), "buy milk\n");
/// ```
pub struct TestFiles {
    temp_dir: TempDir,
    files: BTreeMap<PathBuf, Vec<u8>>,
}

impl TestFiles {
    /// Create a new fixture builder.
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("Failed to create temp directory"),
            files: BTreeMap::new(),
        }
    }

    /// Add a text file. Parent directories are created automatically.
    pub fn with_file(self, path: impl AsRef<Path>, contents: impl Into<String>) -> Self {
        self.with_bytes(path, contents.into().into_bytes())
    }

    /// Add a text file made of `lines`, each terminated by `\n`.
    pub fn with_lines(self, path: impl AsRef<Path>, lines: &[&str]) -> Self {
        let mut contents = String::new();
        for line in lines {
            contents.push_str(line);
            contents.push('\n');
        }
        self.with_file(path, contents)
    }

    /// Add a file with raw bytes.
    pub fn with_bytes(mut self, path: impl AsRef<Path>, contents: Vec<u8>) -> Self {
        self.files.insert(path.as_ref().to_path_buf(), contents);
        self
    }

    /// Write every file to disk.
    pub fn build(self) -> BuiltTestFiles {
        let root = self.temp_dir.path();

        for (path, contents) in &self.files {
            let full_path = root.join(path);
            if let Some(parent) = full_path.parent() {
                fs::create_dir_all(parent).unwrap_or_else(|e| {
                    panic!(
                        "Failed to create parent directory for {}: {}",
                        full_path.display(),
                        e
                    )
                });
            }
            fs::write(&full_path, contents)
                .unwrap_or_else(|e| panic!("Failed to write file {}: {}", full_path.display(), e));
        }

        BuiltTestFiles {
            temp_dir: self.temp_dir,
        }
    }
}

impl Default for TestFiles {
    fn default() -> Self {
        Self::new()
    }
}

/// Files written to disk by [`TestFiles::build`].
pub struct BuiltTestFiles {
    temp_dir: TempDir,
}

impl BuiltTestFiles {
    /// Root of the temporary directory.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Absolute path of a file in the fixture.
    pub fn file(&self, path: impl AsRef<Path>) -> PathBuf {
        self.path().join(path.as_ref())
    }

    /// Read a file as text.
    pub fn read(&self, path: impl AsRef<Path>) -> String {
        let full_path = self.file(path);
        fs::read_to_string(&full_path)
            .unwrap_or_else(|e| panic!("Failed to read file {}: {}", full_path.display(), e))
    }

    /// Read a file as bytes.
    pub fn read_bytes(&self, path: impl AsRef<Path>) -> Vec<u8> {
        let full_path = self.file(path);
        fs::read(&full_path)
            .unwrap_or_else(|e| panic!("Failed to read file {}: {}", full_path.display(), e))
    }

    /// Overwrite a file, e.g. to simulate an edit between versions.
    pub fn write(&self, path: impl AsRef<Path>, contents: impl AsRef<[u8]>) -> PathBuf {
        let full_path = self.file(path);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).ok();
        }
        fs::write(&full_path, contents.as_ref())
            .unwrap_or_else(|e| panic!("Failed to write file {}: {}", full_path.display(), e));
        full_path
    }

    /// Delete a file.
    pub fn delete(&self, path: impl AsRef<Path>) {
        let full_path = self.file(path);
        fs::remove_file(&full_path)
            .unwrap_or_else(|e| panic!("Failed to delete file {}: {}", full_path.display(), e));
    }
}
