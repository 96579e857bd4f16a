//! Logging setup for the command-line driver.
//!
//! Library code only emits `tracing` events; the binary decides where they
//! go. Events are written compactly to stderr so stdout stays free for
//! notices and piped output.
//!
//! # Log Levels
//!
//! - `error`: a file could not be read or written
//! - `warn`: dispatch misses, export fallbacks, render failures
//! - `info`: dataset loaded, shape changes
//! - `debug`: navigation, normalization details

use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub level: Level,
    /// Whether `RUST_LOG` may override `level`
    pub use_env_filter: bool,
    pub with_ansi: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::WARN,
            use_env_filter: true,
            with_ansi: false,
        }
    }
}

impl LogConfig {
    /// Level from `-v` count and `-q`.
    ///
    /// - `-q`: error
    /// - none: warn
    /// - `-v`: info, `-vv`: debug, `-vvv`: trace
    ///
    /// Explicit flags take precedence over `RUST_LOG`.
    #[must_use]
    pub fn from_verbosity(verbose: u8, quiet: bool) -> Self {
        let level = match (quiet, verbose) {
            (true, _) => Level::ERROR,
            (false, 0) => Level::WARN,
            (false, 1) => Level::INFO,
            (false, 2) => Level::DEBUG,
            (false, _) => Level::TRACE,
        };
        Self {
            level,
            use_env_filter: !quiet && verbose == 0,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_ansi(mut self, enable: bool) -> Self {
        self.with_ansi = enable;
        self
    }

    fn env_filter(&self) -> EnvFilter {
        let level = self.level.as_str().to_lowercase();
        let fallback = || EnvFilter::new(format!("warn,tabwork={level}"));
        if self.use_env_filter {
            EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback())
        } else {
            fallback()
        }
    }
}

/// Install the global subscriber. Call once, at startup.
pub fn init_logging(config: &LogConfig) {
    let layer = fmt::layer()
        .compact()
        .with_writer(std::io::stderr)
        .with_ansi(config.with_ansi)
        .with_target(false)
        .without_time();

    tracing_subscriber::registry()
        .with(config.env_filter())
        .with(layer)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(LogConfig::from_verbosity(0, false).level, Level::WARN);
        assert_eq!(LogConfig::from_verbosity(1, false).level, Level::INFO);
        assert_eq!(LogConfig::from_verbosity(2, false).level, Level::DEBUG);
        assert_eq!(LogConfig::from_verbosity(5, false).level, Level::TRACE);
        assert_eq!(LogConfig::from_verbosity(3, true).level, Level::ERROR);
    }

    #[test]
    fn test_explicit_flags_ignore_env() {
        assert!(LogConfig::from_verbosity(0, false).use_env_filter);
        assert!(!LogConfig::from_verbosity(1, false).use_env_filter);
        assert!(!LogConfig::from_verbosity(0, true).use_env_filter);
    }
}
