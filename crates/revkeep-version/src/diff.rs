//! Comparing files.
//!
//! Two separate contracts live here:
//! - [`has_changed`] decides whether a new version is warranted. It runs a
//!   Myers diff over whole contents and only reports "unchanged" when
//!   nothing but equal spans come back.
//! - [`compare`] produces the user-facing line report. It is positional:
//!   line N on the left is paired with line N on the right, so one inserted
//!   line makes every later pair differ instead of showing up as a single
//!   insertion.

use crate::content::ContentStore;
use crate::{VersionError, VersionResult};
use serde::Serialize;
use similar::{Algorithm, DiffTag};
use std::fmt::Write as _;
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};

/// How a difference was established.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffKind {
    /// No difference.
    #[default]
    None,
    /// Whole-file checksums differ (large files).
    #[serde(rename = "content")]
    WholeContent,
    /// Line-level differences.
    Line,
}

impl DiffKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiffKind::None => "none",
            DiffKind::WholeContent => "content",
            DiffKind::Line => "line",
        }
    }
}

/// One differing line position. An empty side means the line is absent there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineDiff {
    /// 1-based line number.
    pub line_number: usize,
    pub left: String,
    pub right: String,
}

/// What a [`LineDiff`] represents when rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineChange {
    Insertion,
    Deletion,
    Modification,
}

impl LineDiff {
    pub fn change(&self) -> LineChange {
        if self.left.is_empty() {
            LineChange::Insertion
        } else if self.right.is_empty() {
            LineChange::Deletion
        } else {
            LineChange::Modification
        }
    }
}

/// Result of [`compare`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffResult {
    pub identical: bool,
    pub kind: DiffKind,
    pub message: String,
    pub lines: Vec<LineDiff>,
}

impl DiffResult {
    fn identical() -> Self {
        Self {
            identical: true,
            kind: DiffKind::None,
            message: "Files are identical".to_string(),
            lines: Vec::new(),
        }
    }
}

/// Decide whether `candidate` differs from the latest stored version.
///
/// `None` for `latest` means there is no prior version, which always counts
/// as a change. Two empty files count as unchanged.
pub async fn has_changed(candidate: &Path, latest: Option<&Path>) -> VersionResult<bool> {
    let Some(latest) = latest else {
        return Ok(true);
    };

    let new = tokio::fs::read(candidate)
        .await
        .map_err(|e| VersionError::io(candidate, e))?;
    let old = tokio::fs::read(latest)
        .await
        .map_err(|e| VersionError::io(latest, e))?;

    Ok(contents_differ(&old, &new))
}

fn contents_differ(old: &[u8], new: &[u8]) -> bool {
    let old_lines: Vec<&[u8]> = old.split_inclusive(|b| *b == b'\n').collect();
    let new_lines: Vec<&[u8]> = new.split_inclusive(|b| *b == b'\n').collect();
    let ops = similar::capture_diff_slices(Algorithm::Myers, &old_lines, &new_lines);
    ops.iter().any(|op| op.tag() != DiffTag::Equal)
}

/// Line-by-line report of how `left` differs from `right`.
///
/// Files under `threshold` bytes are scanned directly. When either file is
/// at or above it, whole-file SHA-256 digests are compared first: equal
/// digests report identical without scanning, different digests still get
/// the full scan for detail.
pub async fn compare(
    left: &Path,
    right: &Path,
    threshold: u64,
    content: &ContentStore,
) -> VersionResult<DiffResult> {
    let left_size = file_size(left).await?;
    let right_size = file_size(right).await?;

    if left_size < threshold && right_size < threshold {
        return scan_lines(left, right).await;
    }

    let left_sum = content.checksum(left).await?;
    let right_sum = content.checksum(right).await?;
    if left_sum == right_sum {
        return Ok(DiffResult::identical());
    }

    let detailed = scan_lines(left, right).await?;
    Ok(DiffResult {
        identical: false,
        kind: DiffKind::WholeContent,
        message: "Files have different content (detected by checksum)".to_string(),
        lines: detailed.lines,
    })
}

async fn file_size(path: &Path) -> VersionResult<u64> {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.len())
        .map_err(|e| VersionError::io(path, e))
}

async fn scan_lines(left: &Path, right: &Path) -> VersionResult<DiffResult> {
    let mut left_lines = LineReader::open(left).await?;
    let mut right_lines = LineReader::open(right).await?;
    let mut lines = Vec::new();
    let mut line_number = 0;

    loop {
        let l = left_lines.next_line().await?;
        let r = right_lines.next_line().await?;
        line_number += 1;

        match (l, r) {
            (None, None) => break,
            (Some(l), Some(r)) if l == r => {}
            (l, r) => lines.push(LineDiff {
                line_number,
                left: l.unwrap_or_default(),
                right: r.unwrap_or_default(),
            }),
        }
    }

    if lines.is_empty() {
        return Ok(DiffResult::identical());
    }

    Ok(DiffResult {
        identical: false,
        kind: DiffKind::Line,
        message: format!("Found {} different lines", lines.len()),
        lines,
    })
}

struct LineReader<'a> {
    path: &'a Path,
    reader: BufReader<File>,
    buf: Vec<u8>,
}

impl<'a> LineReader<'a> {
    async fn open(path: &'a Path) -> VersionResult<Self> {
        let file = File::open(path)
            .await
            .map_err(|e| VersionError::io(path, e))?;
        Ok(Self {
            path,
            reader: BufReader::new(file),
            buf: Vec::new(),
        })
    }

    /// Next line without its `\n` or `\r\n` terminator.
    async fn next_line(&mut self) -> VersionResult<Option<String>> {
        self.buf.clear();
        let n = self
            .reader
            .read_until(b'\n', &mut self.buf)
            .await
            .map_err(|e| VersionError::io(self.path, e))?;
        if n == 0 {
            return Ok(None);
        }
        if self.buf.last() == Some(&b'\n') {
            self.buf.pop();
        }
        if self.buf.last() == Some(&b'\r') {
            self.buf.pop();
        }
        Ok(Some(String::from_utf8_lossy(&self.buf).into_owned()))
    }
}

/// Render a diff result for the terminal.
pub fn format_diff(result: &DiffResult) -> String {
    let mut out = String::new();

    if result.identical {
        out.push_str("Files are identical\n");
        return out;
    }

    let _ = writeln!(out, "Diff Type: {}", result.kind.as_str());
    if !result.message.is_empty() {
        let _ = writeln!(out, "Message: {}", result.message);
    }

    if result.lines.is_empty() {
        out.push_str("No line differences found\n");
        return out;
    }

    let rule = "-".repeat(43);
    out.push_str("\nDifferences:\n");
    let _ = writeln!(out, "{rule}");

    for diff in &result.lines {
        let _ = writeln!(out, "Line {}:", diff.line_number);
        match diff.change() {
            LineChange::Insertion => {
                let _ = writeln!(out, "+ {}", diff.right);
            }
            LineChange::Deletion => {
                let _ = writeln!(out, "- {}", diff.left);
            }
            LineChange::Modification => {
                let _ = writeln!(out, "- {}\n+ {}", diff.left, diff.right);
            }
        }
        let _ = writeln!(out, "{rule}");
    }

    let _ = writeln!(out, "\nTotal differences: {}", result.lines.len());
    out
}
