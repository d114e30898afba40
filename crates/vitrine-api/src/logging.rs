//! Logging configuration for Vitrine
//!
//! Query execution emits `tracing` events (`vitrine.query`, `vitrine.write.*`
//! at debug, `vitrine.query.failed` at warn). [`LogConfig`] installs a
//! subscriber that prints them to stdout, a daily-rotated file, or both.

use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_LOG_FILE: &str = "vitrine.log";

/// Log output destination
#[derive(Debug, Clone)]
pub enum LogOutput {
    /// Output to stdout
    Stdout,
    /// Output to a file with daily rotation
    File(PathBuf),
    /// Output to both stdout and file
    Both(PathBuf),
}

impl LogOutput {
    fn file_path(&self) -> Option<&Path> {
        match self {
            LogOutput::Stdout => None,
            LogOutput::File(path) | LogOutput::Both(path) => Some(path),
        }
    }

    fn to_stdout(&self) -> bool {
        !matches!(self, LogOutput::File(_))
    }
}

/// Log format style
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable multi-line format with colors (default)
    Pretty,
    /// Compact single-line format
    Compact,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Filter directive, e.g. `info` or `vitrine=debug`; `RUST_LOG` wins when set
    pub level: String,
    /// Output destination
    pub output: LogOutput,
    /// Format of stdout output; file output is always compact
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            output: LogOutput::Stdout,
            format: LogFormat::Pretty,
        }
    }
}

impl LogConfig {
    /// Info level to stdout
    pub fn info() -> Self {
        Self::default()
    }

    /// Debug level, which includes every executed query plan
    pub fn debug() -> Self {
        Self {
            level: "debug".to_string(),
            ..Default::default()
        }
    }

    /// Warn level: failed queries only
    pub fn warn() -> Self {
        Self {
            level: "warn".to_string(),
            ..Default::default()
        }
    }

    /// Set log output to file with rotation
    pub fn with_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.output = LogOutput::File(path.into());
        self
    }

    /// Set log output to both stdout and file
    pub fn with_both<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.output = LogOutput::Both(path.into());
        self
    }

    /// Set log format
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Set log level filter
    pub fn with_level<S: Into<String>>(mut self, level: S) -> Self {
        self.level = level.into();
        self
    }

    /// Install the global subscriber.
    ///
    /// Returns the file writer's guard when logging to a file; keep it alive
    /// for as long as logs should be flushed. If a global subscriber is
    /// already installed this is a no-op.
    ///
    /// ```rust,no_run
    /// use vitrine::logging::LogConfig;
    ///
    /// let _guard = LogConfig::debug().with_file("/var/log/shop/vitrine.log").init();
    /// ```
    pub fn init(self) -> Option<WorkerGuard> {
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&self.level))
            .unwrap_or_else(|_| EnvFilter::new("info"));

        let (file_writer, guard) = match self.output.file_path() {
            Some(path) => {
                let appender = tracing_appender::rolling::daily(
                    path.parent().unwrap_or_else(|| Path::new(".")),
                    path.file_name()
                        .and_then(|n| n.to_str())
                        .unwrap_or(DEFAULT_LOG_FILE),
                );
                let (writer, guard) = tracing_appender::non_blocking(appender);
                (Some(writer), Some(guard))
            }
            None => (None, None),
        };

        let stdout = self.output.to_stdout();
        let pretty = self.format == LogFormat::Pretty;

        let _ = tracing_subscriber::registry()
            .with(filter)
            .with((stdout && pretty).then(|| fmt::layer().pretty()))
            .with((stdout && !pretty).then(|| fmt::layer().compact()))
            .with(file_writer.map(|w| fmt::layer().with_writer(w).with_ansi(false).compact()))
            .try_init();

        guard
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_config_defaults() {
        let config = LogConfig::default();
        assert_eq!(config.level, "info");
        assert!(config.output.to_stdout());
        assert!(config.output.file_path().is_none());
    }

    #[test]
    fn test_log_config_builders() {
        let config = LogConfig::debug()
            .with_file("/tmp/vitrine-test.log")
            .with_format(LogFormat::Compact);
        assert_eq!(config.level, "debug");
        assert!(matches!(config.output, LogOutput::File(_)));
        assert!(!config.output.to_stdout());
        assert_eq!(config.format, LogFormat::Compact);

        let both = LogConfig::warn().with_both("/tmp/vitrine-test.log");
        assert!(both.output.to_stdout());
        assert!(both.output.file_path().is_some());
    }

    #[test]
    fn test_init_twice_is_harmless() {
        let dir = tempfile::tempdir().unwrap();
        let guard = LogConfig::warn().with_file(dir.path().join("vitrine.log")).init();
        assert!(guard.is_some());
        assert!(LogConfig::warn().init().is_none());
    }
}
