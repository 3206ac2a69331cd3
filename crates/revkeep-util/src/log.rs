//! Logging setup using tracing.
//!
//! The CLI prints its results on stdout, so diagnostics go to stderr and
//! stay quiet unless asked for.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Log level configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    #[default]
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Log level, used when `RUST_LOG` is not set.
    pub level: LogLevel,
    /// Whether to include file/line info in logs.
    pub include_location: bool,
    /// Whether to colorize output.
    pub ansi: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Warn,
            include_location: false,
            ansi: true,
        }
    }
}

impl LogConfig {
    /// Configuration for `--verbose` runs.
    pub fn verbose() -> Self {
        Self {
            level: LogLevel::Debug,
            include_location: true,
            ..Self::default()
        }
    }
}

/// Build the filter for a config. `RUST_LOG` wins when present.
pub fn filter(config: &LogConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "revkeep={level},revkeep_version={level},revkeep_storage={level}",
            level = config.level.as_str()
        ))
    })
}

/// Initialize logging with the given configuration.
///
/// This should be called once at application startup. Calling it again is
/// a no-op.
pub fn init(config: LogConfig) {
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(config.include_location)
        .with_level(true)
        .with_ansi(config.ansi)
        .with_file(config.include_location)
        .with_line_number(config.include_location);

    let _ = tracing_subscriber::registry()
        .with(filter(&config))
        .with(fmt_layer)
        .try_init();
}
