//! CLI integration tests.
//!
//! These tests exercise the CLI commands end-to-end against a temporary
//! storage root.

use revkeep_test_utils::{BuiltTestFiles, TestFiles};
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

struct Env {
    store: TempDir,
    files: BuiltTestFiles,
}

impl Env {
    fn new(files: TestFiles) -> Self {
        Self {
            store: TempDir::new().expect("Failed to create temp directory"),
            files: files.build(),
        }
    }

    fn run(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_revkeep"))
            .args(args)
            .current_dir(self.files.path())
            .env("REVKEEP_ROOT", self.store.path().join("root"))
            .env("XDG_CONFIG_HOME", self.store.path().join("config"))
            .env_remove("REVKEEP_CONFIG_CONTENT")
            .env_remove("RUST_LOG")
            .output()
            .expect("Failed to execute command")
    }

    fn file(&self, name: &str) -> String {
        self.files.file(name).to_string_lossy().to_string()
    }
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

#[test]
fn test_help_command() {
    let env = Env::new(TestFiles::new());
    let output = env.run(&["--help"]);

    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.contains("Keep local versions of individual files"));
    assert!(out.contains("create"));
    assert!(out.contains("restore"));
    assert!(out.contains("--root"));
}

#[test]
fn test_create_list_and_duplicate() {
    let env = Env::new(TestFiles::new().with_file("notes.txt", "hello\n"));

    let output = env.run(&["create", "notes.txt", "-m", "first draft"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("Created version v1"));

    let output = env.run(&["create", "notes.txt"]);
    assert!(!output.status.success());
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("without changes"));

    let output = env.run(&["list", "notes.txt"]);
    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.contains("v1"));
    assert!(out.contains("first draft"));
    // sha256("hello\n")
    assert!(out.contains("5891b5b522d5df086d0ff0b110fbd9d21bb4fc7163af34d08286a2e846f6be03"));
    assert!(!out.contains("v2"));
}

#[test]
fn test_list_unversioned_file_fails() {
    let env = Env::new(TestFiles::new().with_file("notes.txt", "x"));
    let output = env.run(&["list", "notes.txt"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("No version currently exists"));
}

#[test]
fn test_restore_in_place_and_elsewhere() {
    let env = Env::new(TestFiles::new().with_file("notes.txt", "version one\n"));
    assert!(env.run(&["create", "notes.txt"]).status.success());

    env.files.write("notes.txt", "version two\n");
    assert!(env.run(&["create", "notes.txt"]).status.success());

    let output = env.run(&["restore", "notes.txt", "v1", "--to", "copy.txt"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(env.files.read("copy.txt"), "version one\n");
    assert_eq!(env.files.read("notes.txt"), "version two\n");

    let output = env.run(&["restore", "notes.txt", "v1"]);
    assert!(output.status.success());
    assert_eq!(env.files.read("notes.txt"), "version one\n");
}

#[test]
fn test_restore_rejects_bad_ids() {
    let env = Env::new(TestFiles::new().with_file("notes.txt", "x\n"));
    assert!(env.run(&["create", "notes.txt"]).status.success());

    let output = env.run(&["restore", "notes.txt", "latest"]);
    assert_eq!(output.status.code(), Some(1));

    let output = env.run(&["restore", "notes.txt", "v5"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("v5"));
}

#[test]
fn test_remove_and_remove_all() {
    let env = Env::new(TestFiles::new().with_file("notes.txt", "1\n"));
    assert!(env.run(&["create", "notes.txt"]).status.success());
    env.files.write("notes.txt", "2\n");
    assert!(env.run(&["create", "notes.txt"]).status.success());

    let output = env.run(&["remove", "notes.txt", "v1"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let listed = stdout(&env.run(&["list", "notes.txt"]));
    assert!(!listed.contains("v1 "));
    assert!(listed.contains("v2"));

    let output = env.run(&["remove", "notes.txt", "--all"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("2 files deleted"));

    assert_eq!(env.run(&["list", "notes.txt"]).status.code(), Some(1));
}

#[test]
fn test_remove_requires_id_or_all() {
    let env = Env::new(TestFiles::new().with_file("notes.txt", "1\n"));
    let output = env.run(&["remove", "notes.txt"]);
    assert!(!output.status.success());
}

#[test]
fn test_diff_two_files() {
    let env = Env::new(
        TestFiles::new()
            .with_lines("a.txt", &["a", "b", "c"])
            .with_lines("b.txt", &["a", "x", "c"]),
    );

    let output = env.run(&["diff", "a.txt", "b.txt"]);
    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.contains("Line 2:"));
    assert!(out.contains("- b"));
    assert!(out.contains("+ x"));
    assert!(out.contains("Total differences: 1"));

    let output = env.run(&["diff", "a.txt", "a.txt"]);
    assert!(stdout(&output).contains("Files are identical"));
}

#[test]
fn test_diff_against_versions() {
    let env = Env::new(TestFiles::new().with_lines("notes.txt", &["a", "b"]));
    assert!(env.run(&["create", "notes.txt"]).status.success());

    let output = env.run(&["diff", "notes.txt"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("Files are identical"));

    env.files.write("notes.txt", "a\nb\nc\n");
    let output = env.run(&["diff", "notes.txt", "--last"]);
    let out = stdout(&output);
    assert!(out.contains("Line 3:"));
    assert!(out.contains("+ c"));

    let output = env.run(&["diff", "notes.txt", "--version", "v1"]);
    assert!(stdout(&output).contains("Total differences: 1"));
}

#[test]
fn test_tracked_lists_every_file() {
    let env = Env::new(
        TestFiles::new()
            .with_file("a.txt", "a\n")
            .with_file("b.txt", "b\n"),
    );

    assert!(stdout(&env.run(&["tracked"])).contains("No tracked files."));

    assert!(env.run(&["create", "a.txt"]).status.success());
    assert!(env.run(&["create", "b.txt"]).status.success());

    let out = stdout(&env.run(&["tracked"]));
    assert!(out.contains(&env.file("a.txt")));
    assert!(out.contains(&env.file("b.txt")));
}

#[test]
fn test_root_flag_overrides_environment() {
    let env = Env::new(TestFiles::new().with_file("notes.txt", "x\n"));
    let other = TempDir::new().expect("Failed to create temp directory");
    let root = other.path().to_string_lossy().to_string();

    let output = env.run(&["--root", &root, "create", "notes.txt"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(Path::new(&root).join("global.json").exists());
    assert!(!env.store.path().join("root").join("global.json").exists());
}
