// Copyright (C) 2026  winnyboy5
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.
//! Configuration for structured logging.
//!
//! Output format, level filter and destination for the tracing subscriber.

use std::io;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur during logging configuration
#[derive(Error, Debug)]
pub enum LogError {
    /// Unknown format or unparsable level filter
    #[error("Invalid log level: {0}")]
    InvalidLogLevel(String),

    /// Writing log output failed
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    /// Subscriber could not be installed
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Output format for logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Pretty-printed logs with colors and human-readable formatting
    #[default]
    Pretty,

    /// Compact single-line format
    Compact,

    /// JSON format for machine-readable logs
    Json,
}

impl FromStr for LogFormat {
    type Err = LogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "compact" => Ok(LogFormat::Compact),
            "json" => Ok(LogFormat::Json),
            _ => Err(LogError::InvalidLogLevel(format!(
                "Unknown format: {}. Expected one of: pretty, compact, json",
                s
            ))),
        }
    }
}

/// Log output destination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogOutput {
    /// Write to standard error
    #[default]
    Stderr,

    /// Write to standard output
    Stdout,

    /// Write through the test harness so output is shown only for failing
    /// tests
    TestCapture,
}

/// Configuration for logging
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Output format for logs
    pub format: LogFormat,

    /// Log level filter (e.g., "info", "chunkgrid_storage=debug")
    /// If None, will be determined from RUST_LOG environment variable
    pub level: Option<String>,

    /// Whether to use colored output
    pub use_color: bool,

    /// Whether to include timestamps in output
    pub use_timestamps: bool,

    /// Whether to include thread IDs in output
    pub include_thread_ids: bool,

    /// Whether to include target module names
    pub include_targets: bool,

    /// Output destination (stderr by default)
    pub output: LogOutput,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            format: LogFormat::Pretty,
            level: None,
            use_color: true,
            use_timestamps: true,
            include_thread_ids: false,
            include_targets: true,
            output: LogOutput::Stderr,
        }
    }
}

impl LogConfig {
    /// Create a new default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration for test runs: compact, uncoloured, captured by the
    /// test harness
    pub fn for_tests() -> Self {
        Self::new()
            .with_format(LogFormat::Compact)
            .with_color(false)
            .with_output(LogOutput::TestCapture)
    }

    /// Set the output format
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Set the log level
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = Some(level.into());
        self
    }

    /// Enable or disable color output
    pub fn with_color(mut self, use_color: bool) -> Self {
        self.use_color = use_color;
        self
    }

    /// Enable or disable timestamps
    pub fn with_timestamps(mut self, use_timestamps: bool) -> Self {
        self.use_timestamps = use_timestamps;
        self
    }

    /// Enable or disable thread IDs
    pub fn with_thread_ids(mut self, include_thread_ids: bool) -> Self {
        self.include_thread_ids = include_thread_ids;
        self
    }

    /// Enable or disable target module names
    pub fn with_targets(mut self, include_targets: bool) -> Self {
        self.include_targets = include_targets;
        self
    }

    /// Set the output destination
    pub fn with_output(mut self, output: LogOutput) -> Self {
        self.output = output;
        self
    }

    /// Get the effective log level from config or environment
    pub fn get_effective_level(&self) -> String {
        self.level
            .clone()
            .or_else(|| std::env::var("RUST_LOG").ok())
            .unwrap_or_else(|| "info".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_parsing() {
        assert_eq!("pretty".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert_eq!("COMPACT".parse::<LogFormat>().unwrap(), LogFormat::Compact);
        assert_eq!("Json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert!(matches!(
            "xml".parse::<LogFormat>(),
            Err(LogError::InvalidLogLevel(_))
        ));
    }

    #[test]
    fn test_test_config() {
        let config = LogConfig::for_tests();
        assert_eq!(config.format, LogFormat::Compact);
        assert_eq!(config.output, LogOutput::TestCapture);
        assert!(!config.use_color);
    }

    #[test]
    fn test_effective_level_from_config() {
        let config = LogConfig::new().with_level("debug");
        assert_eq!(config.get_effective_level(), "debug");
    }
}
