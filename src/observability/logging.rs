//! Structured logging configuration.

use crate::config::LoggingSettings;
use std::path::PathBuf;

/// Filter used when nothing else is configured.
pub const DEFAULT_FILTER: &str = "paperlens=warn";

/// Filter used with `--verbose`.
pub const VERBOSE_FILTER: &str = "paperlens=debug";

/// Log line format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable output.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

impl LogFormat {
    /// Parses a format string, returning `None` for unknown values.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "pretty" | "text" => Some(Self::Pretty),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Resolved logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Output format.
    pub format: LogFormat,
    /// `EnvFilter` directive.
    pub filter: String,
    /// Log file; stderr when `None`.
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            filter: DEFAULT_FILTER.to_string(),
            file: None,
        }
    }
}

impl LoggingConfig {
    /// Builds logging configuration from config settings with env overrides.
    #[must_use]
    pub fn from_settings(settings: &LoggingSettings, verbose: bool) -> Self {
        Self::from_settings_with(settings, verbose, |key| std::env::var(key).ok())
    }

    /// Like [`Self::from_settings`], resolving environment variables through `lookup`.
    ///
    /// Filter precedence: `PAPERLENS_LOG`, `RUST_LOG`, `--verbose`, the config
    /// file, then [`DEFAULT_FILTER`]. `PAPERLENS_LOG_FORMAT` overrides the
    /// configured format; unknown formats fall back to pretty.
    #[must_use]
    pub fn from_settings_with(
        settings: &LoggingSettings,
        verbose: bool,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Self {
        let format = lookup("PAPERLENS_LOG_FORMAT")
            .or_else(|| settings.format.clone())
            .and_then(|value| LogFormat::parse(&value))
            .unwrap_or_default();

        let filter = lookup("PAPERLENS_LOG")
            .or_else(|| lookup("RUST_LOG"))
            .filter(|value| !value.trim().is_empty())
            .or_else(|| verbose.then(|| VERBOSE_FILTER.to_string()))
            .or_else(|| settings.filter.clone())
            .unwrap_or_else(|| DEFAULT_FILTER.to_string());

        Self {
            format,
            filter,
            file: settings.file.clone(),
        }
    }
}
