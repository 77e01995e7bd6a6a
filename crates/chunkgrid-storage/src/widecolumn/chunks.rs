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
//! Chunk client storing chunks as wide-column cells
//!
//! Each chunk is one row of the chunk table covering its `from` time, keyed
//! by its external key, with the data in `f:c`.

use super::conn::DataClient;
use super::{WideColumnConfig, COLUMN_FAMILY, VALUE_COLUMN};
use crate::chunk::{Chunk, ChunkClient};
use crate::error::{StorageError, StorageResult};
use crate::schema::SchemaConfig;
use async_trait::async_trait;
use chunkgrid_protocol::{Mutation, RowSet};
use futures::future::try_join_all;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// [`ChunkClient`] writing chunks into wide-column rows
#[derive(Debug, Clone)]
pub struct CellChunkClient {
    config: WideColumnConfig,
    schema: SchemaConfig,
    client: DataClient,
}

impl CellChunkClient {
    /// Build over `client`, placing chunks according to `schema`
    pub fn new(config: WideColumnConfig, schema: SchemaConfig, client: DataClient) -> Self {
        Self {
            config,
            schema,
            client,
        }
    }

    fn row_key(&self, external_key: &str) -> String {
        self.config.row_hash(external_key)
    }

    async fn fetch_table(
        &self,
        table: &str,
        keys: Vec<String>,
    ) -> StorageResult<HashMap<String, Vec<u8>>> {
        let rows = self
            .client
            .read_rows(table, RowSet::Keys { keys })
            .await?;
        Ok(rows
            .into_iter()
            .filter_map(|row| {
                let value = row.cell(COLUMN_FAMILY, VALUE_COLUMN)?.to_vec();
                Some((row.key, value))
            })
            .collect())
    }
}

#[async_trait]
impl ChunkClient for CellChunkClient {
    async fn put_chunks(&self, chunks: &[Chunk]) -> StorageResult<()> {
        debug!(count = chunks.len(), "Putting chunks into wide-column store");
        let mut tables: BTreeMap<String, Vec<Mutation>> = BTreeMap::new();
        for chunk in chunks {
            let table = self.schema.chunk_table_for(chunk.from)?;
            tables.entry(table).or_default().push(Mutation::SetCell {
                row_key: self.row_key(&chunk.external_key()),
                family: COLUMN_FAMILY.to_string(),
                qualifier: VALUE_COLUMN.to_string(),
                value: chunk.data.clone(),
            });
        }

        try_join_all(
            tables
                .into_iter()
                .map(|(table, mutations)| async move { self.client.mutate_rows(&table, mutations).await }),
        )
        .await?;
        Ok(())
    }

    async fn get_chunks(&self, chunks: &[Chunk]) -> StorageResult<Vec<Chunk>> {
        debug!(count = chunks.len(), "Getting chunks from wide-column store");
        let mut wanted: BTreeMap<String, Vec<String>> = BTreeMap::new();
        let mut placement = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            let table = self.schema.chunk_table_for(chunk.from)?;
            let row_key = self.row_key(&chunk.external_key());
            wanted.entry(table.clone()).or_default().push(row_key.clone());
            placement.push((table, row_key));
        }

        let fetched: HashMap<String, HashMap<String, Vec<u8>>> = try_join_all(
            wanted
                .into_iter()
                .map(|(table, keys)| async move {
                    let rows = self.fetch_table(&table, keys).await?;
                    Ok::<_, StorageError>((table, rows))
                }),
        )
        .await?
        .into_iter()
        .collect();

        chunks
            .iter()
            .zip(placement)
            .map(|(chunk, (table, row_key))| {
                let data = fetched
                    .get(&table)
                    .and_then(|rows| rows.get(&row_key))
                    .ok_or_else(|| StorageError::not_found(chunk.external_key()))?;
                chunk.descriptor().with_data(data.clone())
            })
            .collect()
    }

    async fn delete_chunk(&self, user_id: &str, external_key: &str) -> StorageResult<()> {
        let chunk = Chunk::parse_external_key(external_key)?;
        let table = self.schema.chunk_table_for(chunk.from)?;
        debug!(user_id, external_key, table = %table, "Deleting chunk from wide-column store");
        self.client
            .mutate_rows(
                &table,
                vec![Mutation::DeleteRow {
                    row_key: self.row_key(external_key),
                }],
            )
            .await
    }
}
