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
//! In-process storage emulators
//!
//! Two stand-ins for remote storage services, used so that tests never need
//! a real network dependency:
//!
//! - [`WideColumnServer`]: tables of key-ordered rows with `(family, qualifier)` cells
//! - [`ObjectStoreServer`]: buckets of named byte objects
//!
//! Every `start` call binds its own listener and owns its own state, so any
//! number of emulators can run side by side in one test process. Binding to
//! `127.0.0.1:0` picks a free port.
//!
//! # Examples
//!
//! ```rust,no_run
//! use chunkgrid_emulator::ObjectStoreServer;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), chunkgrid_emulator::EmulatorError> {
//! let server = ObjectStoreServer::start("127.0.0.1:0").await?;
//! server.create_bucket("chunks").await?;
//! println!("object store listening on {}", server.url());
//! server.close();
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod objectstore;
pub mod server;
pub mod widecolumn;

pub use error::{EmulatorError, EmulatorResult};
pub use objectstore::ObjectStoreServer;
pub use server::ServerHandle;
pub use widecolumn::WideColumnServer;

/// Address that lets the OS pick a free loopback port
pub const EPHEMERAL_ADDR: &str = "127.0.0.1:0";
