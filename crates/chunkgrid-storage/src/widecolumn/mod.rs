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
//! Wide-column store clients
//!
//! Every client in this module talks to the wide-column emulator through one
//! shared [`Connection`]:
//!
//! - [`RowPerEntryIndex`]: one row per index entry
//! - [`ColumnKeyIndex`]: one row per hash value, one cell per entry
//! - [`CellChunkClient`]: one row per chunk
//! - [`WideColumnTableClient`]: table administration
//!
//! All data lives in the single column family [`COLUMN_FAMILY`].

pub mod chunks;
pub mod conn;
pub mod index;
pub mod table;

use serde::{Deserialize, Serialize};

pub use chunks::CellChunkClient;
pub use conn::{AdminClient, Connection, DataClient};
pub use index::{ColumnKeyIndex, RowPerEntryIndex};
pub use table::WideColumnTableClient;

/// Column family holding every cell
pub const COLUMN_FAMILY: &str = "f";

/// Qualifier used when a row holds a single value
pub const VALUE_COLUMN: &str = "c";

/// Separates the hash and range parts of a row-per-entry row key
pub const KEY_SEPARATOR: char = '\0';

/// Length of the digest prefix added by key distribution
const HASH_PREFIX_LEN: usize = 8;

/// Row key layout options shared by the wide-column clients
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WideColumnConfig {
    /// Prefix row keys with a digest of the hash value so that consecutive
    /// hashes spread across the key space
    pub distribute_keys: bool,
}

impl WideColumnConfig {
    /// Row hash for `hash_value` under this configuration
    pub fn row_hash(&self, hash_value: &str) -> String {
        if self.distribute_keys {
            format!("{}-{}", hash_prefix(hash_value), hash_value)
        } else {
            hash_value.to_string()
        }
    }
}

/// First eight hex characters of the BLAKE3 digest of `value`
pub fn hash_prefix(value: &str) -> String {
    let digest = blake3::hash(value.as_bytes()).to_hex();
    digest[..HASH_PREFIX_LEN].to_string()
}
