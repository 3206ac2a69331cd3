//! Logging initialization.
//!
//! Logs go to stderr so command output on stdout stays clean. `RUST_LOG`
//! overrides the level chosen here.

use revkeep_util::log::{self, LogConfig};
use std::io::IsTerminal;

/// Initialize logging: warnings only by default, debug with `--verbose`.
pub fn init_logging(verbose: bool) {
    let config = if verbose {
        LogConfig::verbose()
    } else {
        LogConfig::default()
    };

    log::init(LogConfig {
        ansi: std::io::stderr().is_terminal(),
        ..config
    });
}
