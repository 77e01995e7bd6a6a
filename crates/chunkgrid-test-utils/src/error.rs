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
//! Fixture and harness configuration errors

use chunkgrid_storage::StorageError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for fixture activation
pub type FixtureResult<T> = Result<T, FixtureError>;

/// Result type alias for harness configuration loading
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Why a fixture could not be activated
///
/// Every variant names the fixture so a failing case is identifiable from
/// the error alone.
#[derive(Error, Debug)]
pub enum FixtureError {
    /// An emulator could not bind or did not start in time
    #[error("{fixture}: emulator unavailable: {reason}")]
    ResourceUnavailable {
        /// Fixture name
        fixture: String,
        /// Bind error or timeout description
        reason: String,
    },

    /// Connecting a client to an emulator failed
    #[error("{fixture}: connection failed: {source}")]
    ConnectionError {
        /// Fixture name
        fixture: String,
        /// Underlying client error
        #[source]
        source: StorageError,
    },

    /// A bucket or table required before the clients can run was not created
    #[error("{fixture}: setup failed: {reason}")]
    SetupError {
        /// Fixture name
        fixture: String,
        /// What could not be created, and why
        reason: String,
    },

    /// The client factory rejected the fixture's configuration
    #[error("{fixture}: configuration rejected: {source}")]
    ConfigurationError {
        /// Fixture name
        fixture: String,
        /// Factory error
        #[source]
        source: StorageError,
    },
}

impl FixtureError {
    /// Create a ResourceUnavailable error
    pub fn resource_unavailable(fixture: impl Into<String>, reason: impl Into<String>) -> Self {
        FixtureError::ResourceUnavailable {
            fixture: fixture.into(),
            reason: reason.into(),
        }
    }

    /// Create a ConnectionError
    pub fn connection(fixture: impl Into<String>, source: StorageError) -> Self {
        FixtureError::ConnectionError {
            fixture: fixture.into(),
            source,
        }
    }

    /// Create a SetupError
    pub fn setup(fixture: impl Into<String>, reason: impl Into<String>) -> Self {
        FixtureError::SetupError {
            fixture: fixture.into(),
            reason: reason.into(),
        }
    }

    /// Create a ConfigurationError
    pub fn configuration(fixture: impl Into<String>, source: StorageError) -> Self {
        FixtureError::ConfigurationError {
            fixture: fixture.into(),
            source,
        }
    }

    /// Name of the fixture whose activation failed
    pub fn fixture(&self) -> &str {
        match self {
            FixtureError::ResourceUnavailable { fixture, .. }
            | FixtureError::ConnectionError { fixture, .. }
            | FixtureError::SetupError { fixture, .. }
            | FixtureError::ConfigurationError { fixture, .. } => fixture,
        }
    }
}

/// Errors loading [`FixtureOptions`](crate::config::FixtureOptions)
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Reading the options file failed
    #[error("IO error reading fixture options: {0}")]
    IoError(#[from] std::io::Error),

    /// The options file is not valid TOML for this schema
    #[error("Failed to parse TOML fixture options: {0}")]
    TomlParseError(#[from] toml::de::Error),

    /// No file at the given path
    #[error("Fixture options file not found at path: {}", .0.display())]
    FileNotFound(PathBuf),

    /// An override variable holds an unusable value
    #[error("Environment variable parsing error: {variable_name}={value}. {reason}")]
    EnvVarParsingError {
        /// Variable name
        variable_name: String,
        /// Raw value
        value: String,
        /// Expected form
        reason: String,
    },

    /// Options parsed but are not usable
    #[error("Fixture options validation failed: {0}")]
    ValidationError(String),
}

impl ConfigError {
    /// Create a ValidationError
    pub fn validation_error(message: impl Into<String>) -> Self {
        ConfigError::ValidationError(message.into())
    }

    /// Create an EnvVarParsingError
    pub fn env_var_parsing_error(
        variable_name: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        ConfigError::EnvVarParsingError {
            variable_name: variable_name.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }
}
