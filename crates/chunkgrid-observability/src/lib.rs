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
//! Chunkgrid Observability Module
//!
//! Structured logging setup shared by the chunkgrid crates.
//!
//! # Features
//!
//! - **Multiple Output Formats**: Pretty, JSON, and compact output formats
//! - **Environment-based Filtering**: Dynamic log level control via `RUST_LOG`
//! - **Test Capture**: Log output routed through the test harness
//!
//! # Example
//!
//! ```ignore
//! use chunkgrid_observability::{init_tracing, LogFormat};
//!
//! init_tracing(LogFormat::Compact, None)?;
//! tracing::info!("Harness started");
//! ```

pub mod config;
pub mod initialization;

pub use config::{LogConfig, LogError, LogFormat, LogOutput};
pub use initialization::{init_tracing, init_tracing_with_config, try_init_test_tracing};
