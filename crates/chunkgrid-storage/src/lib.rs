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
//! Storage clients for chunkgrid
//!
//! A storage configuration is a triad of clients sharing one backend
//! connection:
//!
//! - [`IndexClient`]: writes and queries index entries
//! - [`ChunkClient`]: stores and fetches chunk data
//! - [`TableClient`]: creates, lists and removes tables
//!
//! Two backends are supported: a wide-column store (see [`widecolumn`]) and an
//! object store reached through the [`StorageBackend`] trait (see
//! [`http_object`] and [`objectclient`]). The [`factory`] module assembles a
//! triad from a layout selection.
//!
//! # Examples
//!
//! Storing chunks in an in-memory object store:
//!
//! ```no_run
//! use std::sync::Arc;
//! use chunkgrid_storage::{Chunk, ChunkClient, mock::MockBackend, objectclient::ObjectClient};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = ObjectClient::new(Arc::new(MockBackend::new()));
//!
//!     let chunk = Chunk::new("tenant-1", 42, 1_000, 2_000, b"samples".to_vec());
//!     client.put_chunks(std::slice::from_ref(&chunk)).await?;
//!
//!     let fetched = client.get_chunks(&[chunk.descriptor()]).await?;
//!     assert_eq!(fetched[0].data, b"samples");
//!     Ok(())
//! }
//! ```

pub mod chunk;
pub mod error;
pub mod factory;
pub mod hedging;
pub mod http_object;
pub mod index;
pub mod mock;
pub mod objectclient;
pub mod schema;
pub mod table;
pub mod widecolumn;

use async_trait::async_trait;
use std::fmt::Debug;

pub use chunk::{Chunk, ChunkClient};
pub use error::{StorageError, StorageResult};
pub use factory::{ChunkBackend, IndexLayout, KeyDistribution, ObjectStoreOptions};
pub use hedging::HedgingConfig;
pub use http_object::{HttpObjectStore, ObjectStoreConfig, ObjectStoreSession};
pub use index::{IndexClient, IndexEntry, IndexQuery, WriteBatch};
pub use objectclient::ObjectClient;
pub use schema::{PeriodConfig, PeriodicTableConfig, SchemaConfig};
pub use table::{TableClient, TableDesc};

/// Object storage operations used by [`ObjectClient`]
///
/// All operations return `anyhow::Result<T>` so implementations can attach
/// context freely. Callers that need typed errors recover them with
/// [`StorageError::from_backend`].
///
/// Implementations must:
/// - return an error containing "object not found" from `get` for a missing key
/// - treat `delete` of a missing key as success
/// - return sorted keys from `list_objects`
/// - reject empty keys
#[async_trait]
pub trait StorageBackend: Send + Sync + Debug {
    /// Retrieve an object by its key
    async fn get(&self, key: &str) -> anyhow::Result<Vec<u8>>;

    /// Store an object, overwriting any previous data under `key`
    async fn put(&self, key: &str, data: &[u8]) -> anyhow::Result<()>;

    /// Check if an object exists
    async fn exists(&self, key: &str) -> anyhow::Result<bool>;

    /// Delete an object. Deleting a missing object succeeds.
    async fn delete(&self, key: &str) -> anyhow::Result<()>;

    /// Sorted keys starting with `prefix`; an empty prefix lists everything
    async fn list_objects(&self, prefix: &str) -> anyhow::Result<Vec<String>>;
}
