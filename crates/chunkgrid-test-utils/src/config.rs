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
//! Harness options
//!
//! Options come from defaults, an optional TOML file and `CHUNKGRID_FIXTURE_*`
//! environment variables, in that order of precedence (last wins).
//!
//! ```toml
//! listen_addr = "127.0.0.1:0"
//! object_store_addr = "127.0.0.1:0"
//! startup_timeout_ms = 5000
//! bucket_name = "chunks"
//! object_store_retries = 2
//!
//! [hedging]
//! at_ms = 50
//! up_to = 3
//! ```

use crate::error::{ConfigError, ConfigResult};
use chunkgrid_emulator::objectstore::validate_bucket_name;
use chunkgrid_emulator::EPHEMERAL_ADDR;
use chunkgrid_storage::HedgingConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tokio::fs;
use tracing::{debug, info};

/// Override for [`FixtureOptions::listen_addr`]
pub const ENV_LISTEN_ADDR: &str = "CHUNKGRID_FIXTURE_LISTEN_ADDR";
/// Override for [`FixtureOptions::object_store_addr`]
pub const ENV_OBJECT_STORE_ADDR: &str = "CHUNKGRID_FIXTURE_OBJECT_STORE_ADDR";
/// Override for [`FixtureOptions::startup_timeout_ms`]
pub const ENV_STARTUP_TIMEOUT_MS: &str = "CHUNKGRID_FIXTURE_STARTUP_TIMEOUT_MS";
/// Override for [`FixtureOptions::bucket_name`]
pub const ENV_BUCKET: &str = "CHUNKGRID_FIXTURE_BUCKET";

/// Settings shared by every fixture in a matrix
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FixtureOptions {
    /// Address the wide-column emulator binds; port 0 picks a free port
    /// per activation
    pub listen_addr: String,

    /// Address the object-store emulator binds
    pub object_store_addr: String,

    /// How long one emulator may take to start
    pub startup_timeout_ms: u64,

    /// Bucket pre-created in the object-store emulator
    pub bucket_name: String,

    /// Read hedging for the object-store chunk client
    pub hedging: HedgingConfig,

    /// Retries for object-store requests
    pub object_store_retries: u32,
}

impl Default for FixtureOptions {
    fn default() -> Self {
        Self {
            listen_addr: EPHEMERAL_ADDR.to_string(),
            object_store_addr: EPHEMERAL_ADDR.to_string(),
            startup_timeout_ms: 10_000,
            bucket_name: "chunks".to_string(),
            hedging: HedgingConfig::default(),
            object_store_retries: 3,
        }
    }
}

impl FixtureOptions {
    /// Defaults with environment overrides applied
    pub fn from_env() -> ConfigResult<Self> {
        let mut options = Self::default();
        options.apply_env_overrides()?;
        options.validate()?;
        Ok(options)
    }

    /// Load options from a TOML file, then apply environment overrides
    pub async fn load_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        debug!("Loading fixture options from: {}", path.display());

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).await?;
        let mut options: Self = toml::from_str(&content)?;
        options.apply_env_overrides()?;
        options.validate()?;

        info!("Loaded fixture options: {}", path.display());
        Ok(options)
    }

    /// Parse options from TOML text without consulting the environment
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        let options: Self = toml::from_str(content)?;
        options.validate()?;
        Ok(options)
    }

    /// Apply `CHUNKGRID_FIXTURE_*` variables from the process environment
    pub fn apply_env_overrides(&mut self) -> ConfigResult<()> {
        self.apply_overrides_from(|name| std::env::var(name).ok())
    }

    /// Apply overrides read through `lookup`
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> ConfigResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_LISTEN_ADDR) {
            self.listen_addr = value;
        }
        if let Some(value) = lookup(ENV_OBJECT_STORE_ADDR) {
            self.object_store_addr = value;
        }
        if let Some(value) = lookup(ENV_STARTUP_TIMEOUT_MS) {
            self.startup_timeout_ms = value.parse().map_err(|_| {
                ConfigError::env_var_parsing_error(
                    ENV_STARTUP_TIMEOUT_MS,
                    &value,
                    "expected a whole number of milliseconds",
                )
            })?;
        }
        if let Some(value) = lookup(ENV_BUCKET) {
            self.bucket_name = value;
        }
        Ok(())
    }

    /// Reject options no fixture could activate with
    pub fn validate(&self) -> ConfigResult<()> {
        if self.listen_addr.trim().is_empty() {
            return Err(ConfigError::validation_error("listen_addr cannot be empty"));
        }
        if self.object_store_addr.trim().is_empty() {
            return Err(ConfigError::validation_error("object_store_addr cannot be empty"));
        }
        if let Some(addr) = self.shared_fixed_addr() {
            return Err(ConfigError::validation_error(format!(
                "listen_addr and object_store_addr both bind {}",
                addr
            )));
        }
        if self.startup_timeout_ms == 0 {
            return Err(ConfigError::validation_error(
                "startup_timeout_ms must be greater than zero",
            ));
        }
        validate_bucket_name(&self.bucket_name)
            .map_err(|e| ConfigError::validation_error(format!("bucket_name: {}", e)))?;
        Ok(())
    }

    /// Emulator startup timeout
    pub fn startup_timeout(&self) -> Duration {
        Duration::from_millis(self.startup_timeout_ms)
    }

    /// The fixed address both emulators would bind, if any
    pub fn shared_fixed_addr(&self) -> Option<&str> {
        (self.listen_addr == self.object_store_addr && !is_ephemeral(&self.listen_addr))
            .then_some(self.listen_addr.as_str())
    }
}

/// Whether `addr` asks for an OS-assigned port
pub fn is_ephemeral(addr: &str) -> bool {
    addr.rsplit_once(':').is_some_and(|(_, port)| port == "0")
}
