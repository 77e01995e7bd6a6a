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
//! Index entries, write batches and queries
//!
//! An index entry is identified by `(table, hash value, range value)`.
//! Queries always pin the table and hash value and may narrow the range
//! values by prefix or lower bound, or require an exact value.

use crate::error::StorageResult;
use async_trait::async_trait;
use std::fmt::Debug;

/// A single index entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    /// Table the entry lives in
    pub table_name: String,
    /// Partition key
    pub hash_value: String,
    /// Sort key within the partition
    pub range_value: String,
    /// Payload
    pub value: Vec<u8>,
}

/// Adds and deletes applied together by [`IndexClient::batch_write`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteBatch {
    /// Entries to write
    pub adds: Vec<IndexEntry>,
    /// Entries to remove (only the identity fields are used)
    pub deletes: Vec<IndexEntry>,
}

impl WriteBatch {
    /// Create an empty batch
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an entry for writing
    pub fn add(
        &mut self,
        table_name: impl Into<String>,
        hash_value: impl Into<String>,
        range_value: impl Into<String>,
        value: impl Into<Vec<u8>>,
    ) {
        self.adds.push(IndexEntry {
            table_name: table_name.into(),
            hash_value: hash_value.into(),
            range_value: range_value.into(),
            value: value.into(),
        });
    }

    /// Queue an entry for removal
    pub fn delete(
        &mut self,
        table_name: impl Into<String>,
        hash_value: impl Into<String>,
        range_value: impl Into<String>,
    ) {
        self.deletes.push(IndexEntry {
            table_name: table_name.into(),
            hash_value: hash_value.into(),
            range_value: range_value.into(),
            value: Vec::new(),
        });
    }

    /// Total number of queued operations
    pub fn len(&self) -> usize {
        self.adds.len() + self.deletes.len()
    }

    /// Whether nothing is queued
    pub fn is_empty(&self) -> bool {
        self.adds.is_empty() && self.deletes.is_empty()
    }
}

/// A lookup against one partition of an index table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexQuery {
    /// Table to read
    pub table_name: String,
    /// Partition key
    pub hash_value: String,
    /// Only range values starting with this prefix
    pub range_value_prefix: Option<String>,
    /// Only range values greater than or equal to this
    pub range_value_start: Option<String>,
    /// Only entries whose value equals this
    pub value_equal: Option<Vec<u8>>,
}

impl IndexQuery {
    /// Query every entry of one partition
    pub fn new(table_name: impl Into<String>, hash_value: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            hash_value: hash_value.into(),
            ..Default::default()
        }
    }

    /// Restrict to range values starting with `prefix`
    pub fn with_range_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.range_value_prefix = Some(prefix.into());
        self
    }

    /// Restrict to range values `>= start`
    pub fn with_range_start(mut self, start: impl Into<String>) -> Self {
        self.range_value_start = Some(start.into());
        self
    }

    /// Restrict to entries whose value equals `value`
    pub fn with_value_equal(mut self, value: impl Into<Vec<u8>>) -> Self {
        self.value_equal = Some(value.into());
        self
    }

    /// Whether an entry of this query's partition passes the filters
    pub fn matches(&self, range_value: &str, value: &[u8]) -> bool {
        if let Some(prefix) = &self.range_value_prefix {
            if !range_value.starts_with(prefix.as_str()) {
                return false;
            }
        }
        if let Some(start) = &self.range_value_start {
            if range_value < start.as_str() {
                return false;
            }
        }
        if let Some(expected) = &self.value_equal {
            if value != expected.as_slice() {
                return false;
            }
        }
        true
    }
}

/// Receives one page of results per query; return `false` to stop
pub type QueryPageCallback<'a> = dyn FnMut(&IndexQuery, &[IndexEntry]) -> bool + Send + 'a;

/// Read and write access to index entries
///
/// Implementations differ in how entries are laid out in the backing store;
/// callers only see this interface.
#[async_trait]
pub trait IndexClient: Send + Sync + Debug {
    /// Start a new, empty batch
    fn new_write_batch(&self) -> WriteBatch {
        WriteBatch::new()
    }

    /// Apply all adds, then all deletes, of `batch`
    ///
    /// # Errors
    ///
    /// Returns `InvalidKey` for an entry with an empty hash value, and
    /// backend errors if a table does not exist.
    async fn batch_write(&self, batch: WriteBatch) -> StorageResult<()>;

    /// Run each query and hand its matching entries, ordered by range value,
    /// to `callback`
    async fn query_pages(
        &self,
        queries: &[IndexQuery],
        callback: &mut QueryPageCallback<'_>,
    ) -> StorageResult<()>;
}

/// Run a single query and collect its entries
pub async fn query_all(
    client: &dyn IndexClient,
    query: IndexQuery,
) -> StorageResult<Vec<IndexEntry>> {
    let mut found = Vec::new();
    client
        .query_pages(std::slice::from_ref(&query), &mut |_, entries| {
            found.extend_from_slice(entries);
            true
        })
        .await?;
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_batch_counts() {
        let mut batch = WriteBatch::new();
        assert!(batch.is_empty());
        batch.add("t", "h", "r1", b"v".to_vec());
        batch.delete("t", "h", "r0");
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.deletes[0].value, Vec::<u8>::new());
    }

    #[test]
    fn test_query_filters() {
        let q = IndexQuery::new("t", "h");
        assert!(q.matches("anything", b""));

        let q = IndexQuery::new("t", "h").with_range_prefix("ab");
        assert!(q.matches("abc", b""));
        assert!(!q.matches("b", b""));

        let q = IndexQuery::new("t", "h").with_range_start("m");
        assert!(q.matches("m", b""));
        assert!(q.matches("z", b""));
        assert!(!q.matches("a", b""));

        let q = IndexQuery::new("t", "h").with_value_equal(b"x".to_vec());
        assert!(q.matches("r", b"x"));
        assert!(!q.matches("r", b"y"));
    }
}
