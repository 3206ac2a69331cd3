//! Command handlers for the revkeep CLI.
//!
//! Version lifecycle commands live in `version`, comparison in `diff`.

pub mod diff;
pub mod logging;
pub mod version;

pub use diff::*;
pub use logging::*;
pub use version::*;
