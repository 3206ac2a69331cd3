//! Testing fixtures for revkeep.
//!
//! - **Fixtures**: temporary directories pre-populated with text or binary
//!   files, cleaned up on drop.
//!
//! # Example Usage
//!
//! ```rust
//! use revkeep_test_utils::TestFiles;
//!
//! let files = TestFiles::new()
//!     .with_lines("before.txt", &["a", "b", "c"])
//!     .with_lines("after.txt", &["a", "x", "c"])
//!     .build();
//!
//! assert!(files.file("before.txt").exists());
//! ```

pub mod fixtures;

pub use fixtures::{BuiltTestFiles, TestFiles};
