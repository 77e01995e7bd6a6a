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
//! # Chunkgrid Test Utilities
//!
//! A fixture matrix for the chunkgrid storage clients:
//! - [`Configuration`]: one point in the cross-product of the client axes
//! - [`Fixture`]: a named configuration that activates into a client triad
//! - [`ReleaseHandle`]: idempotent teardown of everything an activation opened
//! - [`widecolumn::fixtures`]: every wide-column fixture, built without I/O
//! - Conformance assertions run against any activated triad
//!
//! # Example
//!
//! ```no_run
//! use chunkgrid_test_utils::{assert_conformance, widecolumn, Fixture};
//!
//! # async fn run() -> Result<(), chunkgrid_test_utils::FixtureError> {
//! for fixture in widecolumn::fixtures() {
//!     let clients = fixture.clients().await?;
//!     assert_conformance(&clients).await;
//!     clients.release();
//! }
//! # Ok(())
//! # }
//! ```

pub mod assertions;
pub mod config;
pub mod error;
pub mod fixture;
pub mod matrix;
pub mod release;
pub mod testdata;
pub mod widecolumn;

pub use assertions::*;
pub use config::FixtureOptions;
pub use error::{ConfigError, ConfigResult, FixtureError, FixtureResult};
pub use fixture::{Clients, Fixture};
pub use matrix::Configuration;
pub use release::ReleaseHandle;
pub use testdata::default_schema_config;
pub use widecolumn::{fixtures, WideColumnFixture};

/// Route `tracing` output through the test harness
///
/// Safe to call from every test; only the first call installs a subscriber.
pub fn init_test_logging() {
    chunkgrid_observability::try_init_test_tracing();
}
