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
//! Logging initialization and setup.
//!
//! Installs a global tracing subscriber built from a [`LogConfig`].

use crate::config::{LogConfig, LogError, LogFormat, LogOutput};
use std::io;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::fmt::TestWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Initialize tracing with the specified format and optional log level.
///
/// If `level` is None, the `RUST_LOG` environment variable decides, falling
/// back to `info`.
///
/// # Example
///
/// ```ignore
/// use chunkgrid_observability::{init_tracing, LogFormat};
///
/// init_tracing(LogFormat::Pretty, Some("debug")).unwrap();
/// tracing::info!("Harness started");
/// ```
pub fn init_tracing(format: LogFormat, level: Option<&str>) -> Result<(), LogError> {
    let mut config = LogConfig::new().with_format(format);
    if let Some(level) = level {
        config = config.with_level(level);
    }
    init_tracing_with_config(&config)
}

/// Initialize tracing with a detailed configuration.
///
/// # Errors
///
/// Fails if the level filter does not parse or a global subscriber is
/// already installed.
pub fn init_tracing_with_config(config: &LogConfig) -> Result<(), LogError> {
    let env_filter = build_env_filter(config)?;
    Registry::default()
        .with(build_layer(config))
        .with(env_filter)
        .try_init()
        .map_err(|e| LogError::ConfigError(format!("Failed to install subscriber: {}", e)))
}

/// Route logs through the test harness, once per process.
///
/// Returns whether this call installed the subscriber. Later calls, or calls
/// after another subscriber was installed, do nothing.
pub fn try_init_test_tracing() -> bool {
    init_tracing_with_config(&LogConfig::for_tests()).is_ok()
}

fn build_layer(config: &LogConfig) -> BoxedLayer {
    let writer = make_writer(config.output);
    let ansi = config.use_color && config.output != LogOutput::TestCapture;

    match config.format {
        LogFormat::Pretty => {
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(ansi)
                .with_target(config.include_targets)
                .with_thread_ids(config.include_thread_ids)
                .with_thread_names(true)
                .with_span_events(FmtSpan::ACTIVE)
                .pretty();
            if config.use_timestamps {
                layer.boxed()
            } else {
                layer.without_time().boxed()
            }
        }
        LogFormat::Compact => {
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(ansi)
                .with_target(config.include_targets)
                .with_thread_ids(config.include_thread_ids)
                .with_thread_names(false)
                .with_span_events(FmtSpan::CLOSE)
                .compact();
            if config.use_timestamps {
                layer.boxed()
            } else {
                layer.without_time().boxed()
            }
        }
        LogFormat::Json => {
            let layer = fmt::layer()
                .with_writer(writer)
                .json()
                .with_target(config.include_targets)
                .with_thread_ids(config.include_thread_ids)
                .with_thread_names(true)
                .with_span_events(FmtSpan::FULL);
            if config.use_timestamps {
                layer.boxed()
            } else {
                layer.without_time().boxed()
            }
        }
    }
}

/// Get the writer for the specified output
fn make_writer(output: LogOutput) -> BoxMakeWriter {
    match output {
        LogOutput::Stderr => BoxMakeWriter::new(io::stderr),
        LogOutput::Stdout => BoxMakeWriter::new(io::stdout),
        LogOutput::TestCapture => BoxMakeWriter::new(TestWriter::new()),
    }
}

/// Build an environment filter for the given configuration
fn build_env_filter(config: &LogConfig) -> Result<EnvFilter, LogError> {
    let level_str = config.get_effective_level();

    EnvFilter::try_new(&level_str).map_err(|e| {
        LogError::InvalidLogLevel(format!("Failed to parse log filter '{}': {}", level_str, e))
    })
}
