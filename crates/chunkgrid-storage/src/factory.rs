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
//! Client construction
//!
//! Each configuration axis is an enum, so choosing a client variant is an
//! exhaustive `match` rather than a set of flags. The factory only wires
//! clients together; it performs no I/O.

use crate::chunk::ChunkClient;
use crate::error::{StorageError, StorageResult};
use crate::hedging::HedgingConfig;
use crate::http_object::{HttpObjectStore, ObjectStoreConfig, ObjectStoreSession};
use crate::index::IndexClient;
use crate::objectclient::ObjectClient;
use crate::schema::SchemaConfig;
use crate::table::TableClient;
use crate::widecolumn::{
    AdminClient, CellChunkClient, ColumnKeyIndex, Connection, DataClient, RowPerEntryIndex,
    WideColumnConfig, WideColumnTableClient,
};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::debug;

/// How index entries are laid out in wide-column rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexLayout {
    /// One row per entry
    RowPerEntry,
    /// One row per hash value, one cell per entry
    ColumnKey,
}

impl IndexLayout {
    /// Every layout, column key first
    pub const ALL: [IndexLayout; 2] = [IndexLayout::ColumnKey, IndexLayout::RowPerEntry];

    /// Whether this is the column-key layout
    pub fn is_column_key(self) -> bool {
        self == IndexLayout::ColumnKey
    }
}

impl fmt::Display for IndexLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexLayout::RowPerEntry => write!(f, "row-per-entry"),
            IndexLayout::ColumnKey => write!(f, "column-key"),
        }
    }
}

impl FromStr for IndexLayout {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "row-per-entry" => Ok(IndexLayout::RowPerEntry),
            "column-key" => Ok(IndexLayout::ColumnKey),
            _ => Err(StorageError::configuration(format!("unknown index layout: {}", s))),
        }
    }
}

/// Where chunk data is stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChunkBackend {
    /// As cells of the wide-column store
    WideColumn,
    /// As objects in the object store
    ObjectStore,
}

impl ChunkBackend {
    /// Every backend, object store first
    pub const ALL: [ChunkBackend; 2] = [ChunkBackend::ObjectStore, ChunkBackend::WideColumn];

    /// Whether chunks go to the object store
    pub fn is_object_store(self) -> bool {
        self == ChunkBackend::ObjectStore
    }
}

impl fmt::Display for ChunkBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChunkBackend::WideColumn => write!(f, "wide-column"),
            ChunkBackend::ObjectStore => write!(f, "object-store"),
        }
    }
}

impl FromStr for ChunkBackend {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "wide-column" => Ok(ChunkBackend::WideColumn),
            "object-store" => Ok(ChunkBackend::ObjectStore),
            _ => Err(StorageError::configuration(format!("unknown chunk backend: {}", s))),
        }
    }
}

/// Whether index row keys carry a digest prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyDistribution {
    /// Row keys are the hash values themselves
    Plain,
    /// Row keys are prefixed with a digest of the hash value
    HashPrefixed,
}

impl KeyDistribution {
    /// Every distribution, hash-prefixed first
    pub const ALL: [KeyDistribution; 2] = [KeyDistribution::HashPrefixed, KeyDistribution::Plain];

    /// Whether keys are hash-prefixed
    pub fn is_hash_prefixed(self) -> bool {
        self == KeyDistribution::HashPrefixed
    }

    /// Wide-column key layout for this distribution
    pub fn wide_column_config(self) -> WideColumnConfig {
        WideColumnConfig {
            distribute_keys: self.is_hash_prefixed(),
        }
    }
}

impl fmt::Display for KeyDistribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyDistribution::Plain => write!(f, "plain"),
            KeyDistribution::HashPrefixed => write!(f, "hash-prefixed"),
        }
    }
}

impl FromStr for KeyDistribution {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "plain" => Ok(KeyDistribution::Plain),
            "hash-prefixed" => Ok(KeyDistribution::HashPrefixed),
            _ => Err(StorageError::configuration(format!("unknown key distribution: {}", s))),
        }
    }
}

/// Object store access for [`ChunkBackend::ObjectStore`]
#[derive(Debug, Clone)]
pub struct ObjectStoreOptions {
    /// Client bound to the object store endpoint
    pub session: ObjectStoreSession,
    /// Bucket and retry settings
    pub config: ObjectStoreConfig,
    /// Read hedging policy
    pub hedging: HedgingConfig,
}

/// Build the index client for `layout`
///
/// # Errors
///
/// Returns `Configuration` if `schema` is invalid.
pub fn new_index_client(
    layout: IndexLayout,
    distribution: KeyDistribution,
    schema: &SchemaConfig,
    conn: &Connection,
) -> StorageResult<Arc<dyn IndexClient>> {
    schema.validate()?;
    let config = distribution.wide_column_config();
    let data = DataClient::new(conn);
    debug!(%layout, %distribution, "Building index client");
    Ok(match layout {
        IndexLayout::RowPerEntry => Arc::new(RowPerEntryIndex::new(config, schema.clone(), data)),
        IndexLayout::ColumnKey => Arc::new(ColumnKeyIndex::new(config, schema.clone(), data)),
    })
}

/// Build the chunk client for `backend`
///
/// Cell-backed chunks always use plain row keys.
///
/// # Errors
///
/// Returns `Configuration` if the object store is selected without
/// `object_store` options, or if `schema` is invalid.
pub fn new_chunk_client(
    backend: ChunkBackend,
    schema: &SchemaConfig,
    conn: &Connection,
    object_store: Option<ObjectStoreOptions>,
) -> StorageResult<Arc<dyn ChunkClient>> {
    schema.validate()?;
    debug!(%backend, "Building chunk client");
    match backend {
        ChunkBackend::WideColumn => Ok(Arc::new(CellChunkClient::new(
            WideColumnConfig::default(),
            schema.clone(),
            DataClient::new(conn),
        ))),
        ChunkBackend::ObjectStore => {
            let options = object_store.ok_or_else(|| {
                StorageError::configuration("object store chunk backend needs an object store session")
            })?;
            let store = HttpObjectStore::new(options.session, options.config)?
                .with_hedging(options.hedging);
            Ok(Arc::new(ObjectClient::new(Arc::new(store))))
        }
    }
}

/// Build the table client
pub fn new_table_client(conn: &Connection) -> Arc<dyn TableClient> {
    Arc::new(WideColumnTableClient::new(AdminClient::new(conn)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axis_parsing() {
        for layout in IndexLayout::ALL {
            assert_eq!(layout.to_string().parse::<IndexLayout>().unwrap(), layout);
        }
        for backend in ChunkBackend::ALL {
            assert_eq!(backend.to_string().parse::<ChunkBackend>().unwrap(), backend);
        }
        for distribution in KeyDistribution::ALL {
            assert_eq!(
                distribution.to_string().parse::<KeyDistribution>().unwrap(),
                distribution
            );
        }
        assert!(matches!(
            "sideways".parse::<IndexLayout>(),
            Err(StorageError::Configuration(_))
        ));
    }

    #[test]
    fn test_axis_order_is_true_first() {
        assert!(IndexLayout::ALL[0].is_column_key());
        assert!(ChunkBackend::ALL[0].is_object_store());
        assert!(KeyDistribution::ALL[0].is_hash_prefixed());
        assert!(!KeyDistribution::Plain.wide_column_config().distribute_keys);
    }
}
