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
//! The fixture seam used by conformance suites

use crate::error::FixtureResult;
use crate::release::ReleaseHandle;
use async_trait::async_trait;
use chunkgrid_storage::{ChunkClient, IndexClient, SchemaConfig, TableClient};
use std::fmt::Debug;
use std::sync::Arc;

/// A named, independently activated source of a client triad
#[async_trait]
pub trait Fixture: Send + Sync + Debug {
    /// Stable name encoding the fixture's configuration
    fn name(&self) -> &str;

    /// Start what the fixture needs and build its clients
    ///
    /// Each call opens fresh resources. On error, anything opened so far has
    /// already been released.
    async fn clients(&self) -> FixtureResult<Clients>;
}

/// Clients from one activation, sharing one backend connection
///
/// Writes through one client are visible through the others. The clients
/// stay usable until `closer` is closed or dropped.
#[derive(Debug)]
pub struct Clients {
    /// Index client
    pub index: Arc<dyn IndexClient>,
    /// Chunk client
    pub chunk: Arc<dyn ChunkClient>,
    /// Table client
    pub table: Arc<dyn TableClient>,
    /// Schema the clients were built with
    pub schema: SchemaConfig,
    /// Releases everything the activation opened
    pub closer: ReleaseHandle,
}

impl Clients {
    /// Release the activation's resources
    pub fn release(self) {
        self.closer.close();
    }
}
