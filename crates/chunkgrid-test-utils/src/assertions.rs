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
//! Conformance assertions over a client triad
//!
//! Each helper panics with the fixture name on the first violation, so a
//! failing matrix entry is identified by its message.

use crate::fixture::Clients;
use crate::testdata::{current_index_table, sample_chunks, sample_index_batch};
use chunkgrid_storage::index::query_all;
use chunkgrid_storage::{IndexQuery, TableDesc};

/// Entries written through the index client read back unchanged and in
/// range order, and deletes remove them
pub async fn assert_index_roundtrip(clients: &Clients, hash_value: &str) {
    let fixture = clients.closer.fixture();
    let table = current_index_table(&clients.schema)
        .unwrap_or_else(|| panic!("{fixture}: schema has no index table for now"));

    let written = sample_index_batch(&table, hash_value, 3);
    clients
        .index
        .batch_write(written.clone())
        .await
        .unwrap_or_else(|e| panic!("{fixture}: batch_write failed: {e}"));

    let read = query_all(clients.index.as_ref(), IndexQuery::new(&table, hash_value))
        .await
        .unwrap_or_else(|e| panic!("{fixture}: query failed: {e}"));
    assert_eq!(read, written.adds, "{fixture}: index entries differ");

    let mut removal = clients.index.new_write_batch();
    for entry in &written.adds {
        removal.delete(&table, hash_value, entry.range_value.clone());
    }
    clients
        .index
        .batch_write(removal)
        .await
        .unwrap_or_else(|e| panic!("{fixture}: delete failed: {e}"));

    let left = query_all(clients.index.as_ref(), IndexQuery::new(&table, hash_value))
        .await
        .unwrap_or_else(|e| panic!("{fixture}: query failed: {e}"));
    assert!(left.is_empty(), "{fixture}: deleted entries still visible");
}

/// Chunks written through the chunk client read back byte-identical, and a
/// deleted chunk is reported as not found
pub async fn assert_chunk_roundtrip(clients: &Clients, user_id: &str) {
    let fixture = clients.closer.fixture();
    let chunks = sample_chunks(user_id, 3);

    clients
        .chunk
        .put_chunks(&chunks)
        .await
        .unwrap_or_else(|e| panic!("{fixture}: put_chunks failed: {e}"));

    let descriptors: Vec<_> = chunks.iter().map(|c| c.descriptor()).collect();
    let fetched = clients
        .chunk
        .get_chunks(&descriptors)
        .await
        .unwrap_or_else(|e| panic!("{fixture}: get_chunks failed: {e}"));
    assert_eq!(fetched, chunks, "{fixture}: chunk data differs");

    let gone = &chunks[0];
    clients
        .chunk
        .delete_chunk(user_id, &gone.external_key())
        .await
        .unwrap_or_else(|e| panic!("{fixture}: delete_chunk failed: {e}"));

    match clients.chunk.get_chunks(&[gone.descriptor()]).await {
        Ok(_) => panic!("{fixture}: deleted chunk still readable"),
        Err(e) => assert!(
            clients.chunk.is_chunk_not_found_err(&e),
            "{fixture}: expected not found, got {e}"
        ),
    }
}

/// Every table the schema needs now was pre-created, and the table client
/// can create, describe and delete a table of its own
pub async fn assert_table_lifecycle(clients: &Clients, name: &str) {
    let fixture = clients.closer.fixture();
    let listed = clients
        .table
        .list_tables()
        .await
        .unwrap_or_else(|e| panic!("{fixture}: list_tables failed: {e}"));
    let table = current_index_table(&clients.schema)
        .unwrap_or_else(|| panic!("{fixture}: schema has no index table for now"));
    assert!(listed.contains(&table), "{fixture}: {table} not pre-created");

    clients
        .table
        .create_table(TableDesc::new(name))
        .await
        .unwrap_or_else(|e| panic!("{fixture}: create_table failed: {e}"));
    let (desc, active) = clients
        .table
        .describe_table(name)
        .await
        .unwrap_or_else(|e| panic!("{fixture}: describe_table failed: {e}"));
    assert_eq!(desc.name, name, "{fixture}: wrong table described");
    assert!(active, "{fixture}: new table not active");

    clients
        .table
        .delete_table(name)
        .await
        .unwrap_or_else(|e| panic!("{fixture}: delete_table failed: {e}"));
    let listed = clients
        .table
        .list_tables()
        .await
        .unwrap_or_else(|e| panic!("{fixture}: list_tables failed: {e}"));
    assert!(!listed.iter().any(|t| t == name), "{fixture}: {name} not deleted");
}

/// Run every conformance assertion against one activation
pub async fn assert_conformance(clients: &Clients) {
    assert_index_roundtrip(clients, "conformance-series").await;
    assert_chunk_roundtrip(clients, "conformance-user").await;
    assert_table_lifecycle(clients, "conformance_table").await;
}
