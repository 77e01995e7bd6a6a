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
//! Index clients over the wide-column store
//!
//! Two layouts are supported:
//!
//! ```text
//! row per entry:   <row-hash>\0<range>   f:c = value
//! column key:      <row-hash>            f:<range> = value
//! ```
//!
//! `<row-hash>` is the hash value, optionally prefixed with a digest when
//! key distribution is enabled (see [`WideColumnConfig`]).

use super::conn::DataClient;
use super::{WideColumnConfig, COLUMN_FAMILY, KEY_SEPARATOR, VALUE_COLUMN};
use crate::error::{StorageError, StorageResult};
use crate::index::{IndexClient, IndexEntry, IndexQuery, QueryPageCallback, WriteBatch};
use crate::schema::SchemaConfig;
use async_trait::async_trait;
use chunkgrid_protocol::{Mutation, Row, RowSet};
use futures::future::try_join_all;
use std::collections::BTreeMap;
use tracing::debug;

fn check_hash(entry: &IndexEntry) -> StorageResult<()> {
    if entry.hash_value.is_empty() {
        return Err(StorageError::invalid_key(format!(
            "empty hash value for table {}",
            entry.table_name
        )));
    }
    Ok(())
}

/// Group mutations by table, adds before deletes
fn group_by_table<F>(batch: WriteBatch, mut to_mutation: F) -> StorageResult<BTreeMap<String, Vec<Mutation>>>
where
    F: FnMut(IndexEntry, bool) -> Mutation,
{
    let mut tables: BTreeMap<String, Vec<Mutation>> = BTreeMap::new();
    let adds = batch.adds.into_iter().map(|e| (e, true));
    let deletes = batch.deletes.into_iter().map(|e| (e, false));
    for (entry, is_add) in adds.chain(deletes) {
        check_hash(&entry)?;
        let table = entry.table_name.clone();
        tables.entry(table).or_default().push(to_mutation(entry, is_add));
    }
    Ok(tables)
}

async fn apply(client: &DataClient, tables: BTreeMap<String, Vec<Mutation>>) -> StorageResult<()> {
    try_join_all(
        tables
            .into_iter()
            .map(|(table, mutations)| async move { client.mutate_rows(&table, mutations).await }),
    )
    .await?;
    Ok(())
}

/// Run every query concurrently, then hand pages to `callback` in query order
async fn run_queries<'q, F, Fut>(
    queries: &'q [IndexQuery],
    callback: &mut QueryPageCallback<'_>,
    query_one: F,
) -> StorageResult<()>
where
    F: Fn(&'q IndexQuery) -> Fut,
    Fut: std::future::Future<Output = StorageResult<Vec<IndexEntry>>>,
{
    for query in queries {
        if query.hash_value.is_empty() {
            return Err(StorageError::invalid_key(format!(
                "empty hash value in query on {}",
                query.table_name
            )));
        }
    }

    let pages = try_join_all(queries.iter().map(query_one)).await?;
    for (query, entries) in queries.iter().zip(pages) {
        if !callback(query, &entries) {
            break;
        }
    }
    Ok(())
}

/// Index with one row per entry
#[derive(Debug, Clone)]
pub struct RowPerEntryIndex {
    config: WideColumnConfig,
    schema: SchemaConfig,
    client: DataClient,
}

impl RowPerEntryIndex {
    /// Build over `client` with the given key layout
    pub fn new(config: WideColumnConfig, schema: SchemaConfig, client: DataClient) -> Self {
        Self {
            config,
            schema,
            client,
        }
    }

    /// Schema the index tables were created from
    pub fn schema(&self) -> &SchemaConfig {
        &self.schema
    }

    fn row_prefix(&self, hash_value: &str) -> String {
        format!("{}{}", self.config.row_hash(hash_value), KEY_SEPARATOR)
    }

    async fn query_one(&self, query: &IndexQuery) -> StorageResult<Vec<IndexEntry>> {
        let row_prefix = self.row_prefix(&query.hash_value);
        let prefix = match &query.range_value_prefix {
            Some(range_prefix) => format!("{}{}", row_prefix, range_prefix),
            None => row_prefix.clone(),
        };
        let rows = self
            .client
            .read_rows(&query.table_name, RowSet::Prefix { prefix })
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|row| {
                let range_value = row.key.strip_prefix(row_prefix.as_str())?.to_string();
                let value = row.cell(COLUMN_FAMILY, VALUE_COLUMN)?.to_vec();
                query.matches(&range_value, &value).then(|| IndexEntry {
                    table_name: query.table_name.clone(),
                    hash_value: query.hash_value.clone(),
                    range_value,
                    value,
                })
            })
            .collect())
    }
}

#[async_trait]
impl IndexClient for RowPerEntryIndex {
    async fn batch_write(&self, batch: WriteBatch) -> StorageResult<()> {
        debug!(
            adds = batch.adds.len(),
            deletes = batch.deletes.len(),
            "Writing row-per-entry index batch"
        );
        let tables = group_by_table(batch, |entry, is_add| {
            let row_key = format!("{}{}", self.row_prefix(&entry.hash_value), entry.range_value);
            if is_add {
                Mutation::SetCell {
                    row_key,
                    family: COLUMN_FAMILY.to_string(),
                    qualifier: VALUE_COLUMN.to_string(),
                    value: entry.value,
                }
            } else {
                Mutation::DeleteRow { row_key }
            }
        })?;
        apply(&self.client, tables).await
    }

    async fn query_pages(
        &self,
        queries: &[IndexQuery],
        callback: &mut QueryPageCallback<'_>,
    ) -> StorageResult<()> {
        debug!(queries = queries.len(), "Querying row-per-entry index");
        run_queries(queries, callback, |q| self.query_one(q)).await
    }
}

/// Index with one row per hash value and one cell per entry
#[derive(Debug, Clone)]
pub struct ColumnKeyIndex {
    config: WideColumnConfig,
    schema: SchemaConfig,
    client: DataClient,
}

impl ColumnKeyIndex {
    /// Build over `client` with the given key layout
    pub fn new(config: WideColumnConfig, schema: SchemaConfig, client: DataClient) -> Self {
        Self {
            config,
            schema,
            client,
        }
    }

    /// Schema the index tables were created from
    pub fn schema(&self) -> &SchemaConfig {
        &self.schema
    }

    fn entries(query: &IndexQuery, row: Row) -> Vec<IndexEntry> {
        let mut entries: Vec<IndexEntry> = row
            .cells
            .into_iter()
            .filter(|cell| cell.family == COLUMN_FAMILY && query.matches(&cell.qualifier, &cell.value))
            .map(|cell| IndexEntry {
                table_name: query.table_name.clone(),
                hash_value: query.hash_value.clone(),
                range_value: cell.qualifier,
                value: cell.value,
            })
            .collect();
        entries.sort_by(|a, b| a.range_value.cmp(&b.range_value));
        entries
    }

    async fn query_one(&self, query: &IndexQuery) -> StorageResult<Vec<IndexEntry>> {
        let keys = vec![self.config.row_hash(&query.hash_value)];
        let rows = self
            .client
            .read_rows(&query.table_name, RowSet::Keys { keys })
            .await?;
        Ok(rows
            .into_iter()
            .flat_map(|row| Self::entries(query, row))
            .collect())
    }
}

#[async_trait]
impl IndexClient for ColumnKeyIndex {
    async fn batch_write(&self, batch: WriteBatch) -> StorageResult<()> {
        debug!(
            adds = batch.adds.len(),
            deletes = batch.deletes.len(),
            "Writing column-key index batch"
        );
        let tables = group_by_table(batch, |entry, is_add| {
            let row_key = self.config.row_hash(&entry.hash_value);
            let family = COLUMN_FAMILY.to_string();
            if is_add {
                Mutation::SetCell {
                    row_key,
                    family,
                    qualifier: entry.range_value,
                    value: entry.value,
                }
            } else {
                Mutation::DeleteCell {
                    row_key,
                    family,
                    qualifier: entry.range_value,
                }
            }
        })?;
        apply(&self.client, tables).await
    }

    async fn query_pages(
        &self,
        queries: &[IndexQuery],
        callback: &mut QueryPageCallback<'_>,
    ) -> StorageResult<()> {
        debug!(queries = queries.len(), "Querying column-key index");
        run_queries(queries, callback, |q| self.query_one(q)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chunkgrid_protocol::Cell;

    fn cell(family: &str, qualifier: &str, value: &[u8]) -> Cell {
        Cell {
            family: family.to_string(),
            qualifier: qualifier.to_string(),
            value: value.to_vec(),
        }
    }

    #[test]
    fn test_group_by_table_orders_adds_before_deletes() {
        let mut batch = WriteBatch::new();
        batch.delete("t1", "h", "old");
        batch.add("t1", "h", "new", b"v".to_vec());
        batch.add("t2", "h", "other", b"v".to_vec());

        let tables = group_by_table(batch, |entry, is_add| {
            if is_add {
                Mutation::DeleteRow {
                    row_key: format!("add:{}", entry.range_value),
                }
            } else {
                Mutation::DeleteRow {
                    row_key: format!("del:{}", entry.range_value),
                }
            }
        })
        .unwrap();

        assert_eq!(tables.len(), 2);
        let keys: Vec<_> = tables["t1"]
            .iter()
            .map(|m| match m {
                Mutation::DeleteRow { row_key } => row_key.as_str(),
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(keys, vec!["add:new", "del:old"]);
    }

    #[test]
    fn test_group_by_table_rejects_empty_hash() {
        let mut batch = WriteBatch::new();
        batch.add("t", "", "r", b"v".to_vec());
        let err = group_by_table(batch, |_, _| Mutation::DeleteRow {
            row_key: String::new(),
        })
        .unwrap_err();
        assert!(err.is_invalid_key());
    }

    #[test]
    fn test_column_key_entries_filter_and_sort() {
        let row = Row {
            key: "h".to_string(),
            cells: vec![
                cell(COLUMN_FAMILY, "b", b"2"),
                cell("other", "a", b"x"),
                cell(COLUMN_FAMILY, "a", b"1"),
                cell(COLUMN_FAMILY, "c", b"3"),
            ],
        };
        let query = IndexQuery::new("t", "h").with_range_start("b");
        let entries = ColumnKeyIndex::entries(&query, row);
        let ranges: Vec<_> = entries.iter().map(|e| e.range_value.as_str()).collect();
        assert_eq!(ranges, vec!["b", "c"]);
        assert_eq!(entries[0].hash_value, "h");
        assert_eq!(entries[0].value, b"2");
    }
}
