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
//! Loading fixture options from files

use chunkgrid_test_utils::{ConfigError, FixtureOptions};
use std::time::Duration;
use tempfile::TempDir;

#[tokio::test]
async fn test_load_toml_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("fixtures.toml");
    std::fs::write(
        &path,
        r#"
listen_addr = "127.0.0.1:0"
startup_timeout_ms = 2500
bucket_name = "fixture-chunks"
object_store_retries = 1

[hedging]
at_ms = 10
up_to = 2
"#,
    )
    .unwrap();

    let options = FixtureOptions::load_file(&path).await.unwrap();
    assert_eq!(options.startup_timeout(), Duration::from_millis(2500));
    assert_eq!(options.object_store_retries, 1);
    assert!(options.hedging.is_enabled());
}

#[tokio::test]
async fn test_missing_file() {
    let dir = TempDir::new().unwrap();
    let err = FixtureOptions::load_file(dir.path().join("absent.toml"))
        .await
        .unwrap_err();
    assert!(matches!(err, ConfigError::FileNotFound(_)));
}

#[tokio::test]
async fn test_malformed_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.toml");
    std::fs::write(&path, "startup_timeout_ms = \"fast\"").unwrap();

    let err = FixtureOptions::load_file(&path).await.unwrap_err();
    assert!(matches!(err, ConfigError::TomlParseError(_)));
}

#[tokio::test]
async fn test_invalid_values_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("zero.toml");
    std::fs::write(&path, "startup_timeout_ms = 0").unwrap();

    let err = FixtureOptions::load_file(&path).await.unwrap_err();
    assert!(matches!(err, ConfigError::ValidationError(_)));
}
