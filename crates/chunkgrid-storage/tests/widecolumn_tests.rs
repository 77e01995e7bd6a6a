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
//! Storage clients against live emulators
//!
//! Each test starts its own emulator on an ephemeral port.

use chrono::{Duration as ChronoDuration, Utc};
use chunkgrid_emulator::{ObjectStoreServer, WideColumnServer, EPHEMERAL_ADDR};
use chunkgrid_storage::factory::{new_chunk_client, new_index_client, new_table_client};
use chunkgrid_storage::index::query_all;
use chunkgrid_storage::{
    Chunk, ChunkBackend, HttpObjectStore, IndexLayout, IndexQuery, KeyDistribution,
    ObjectStoreConfig, ObjectStoreOptions, ObjectStoreSession, SchemaConfig, StorageBackend,
    StorageError, TableDesc,
};
use chunkgrid_storage::widecolumn::{ColumnKeyIndex, Connection, DataClient, WideColumnConfig};

const INDEX_TABLE: &str = "index_test";

async fn connect() -> (WideColumnServer, Connection) {
    let server = WideColumnServer::start(EPHEMERAL_ADDR).await.unwrap();
    let conn = Connection::dial(&server.url()).await.unwrap();
    (server, conn)
}

fn schema() -> SchemaConfig {
    SchemaConfig::single_period("widecolumn", "v1", Utc::now() - ChronoDuration::hours(2))
}

async fn create_active_tables(conn: &Connection, schema: &SchemaConfig) {
    let tables = new_table_client(conn);
    for name in schema.active_tables(Utc::now()) {
        tables.create_table(TableDesc::new(name)).await.unwrap();
    }
    tables.create_table(TableDesc::new(INDEX_TABLE)).await.unwrap();
}

#[tokio::test]
async fn test_dial_checks_service_kind() {
    let objects = ObjectStoreServer::start(EPHEMERAL_ADDR).await.unwrap();
    let err = Connection::dial(&objects.url()).await.unwrap_err();
    assert!(err.is_connection(), "unexpected error: {err}");
}

#[tokio::test]
async fn test_index_layouts_roundtrip() {
    for layout in IndexLayout::ALL {
        for distribution in KeyDistribution::ALL {
            let (_server, conn) = connect().await;
            let schema = schema();
            create_active_tables(&conn, &schema).await;
            let index = new_index_client(layout, distribution, &schema, &conn).unwrap();

            let mut batch = index.new_write_batch();
            batch.add(INDEX_TABLE, "series-a", "b", b"2".to_vec());
            batch.add(INDEX_TABLE, "series-a", "a", b"1".to_vec());
            batch.add(INDEX_TABLE, "series-a", "ab", b"1".to_vec());
            batch.add(INDEX_TABLE, "series-b", "a", b"other".to_vec());
            index.batch_write(batch).await.unwrap();

            let all = query_all(index.as_ref(), IndexQuery::new(INDEX_TABLE, "series-a"))
                .await
                .unwrap();
            let ranges: Vec<_> = all.iter().map(|e| e.range_value.as_str()).collect();
            assert_eq!(ranges, vec!["a", "ab", "b"], "{layout}/{distribution}");
            assert!(all.iter().all(|e| e.hash_value == "series-a"));

            let prefixed = query_all(
                index.as_ref(),
                IndexQuery::new(INDEX_TABLE, "series-a").with_range_prefix("a"),
            )
            .await
            .unwrap();
            assert_eq!(prefixed.len(), 2, "{layout}/{distribution}");

            let from_b = query_all(
                index.as_ref(),
                IndexQuery::new(INDEX_TABLE, "series-a").with_range_start("ab"),
            )
            .await
            .unwrap();
            assert_eq!(from_b.len(), 2, "{layout}/{distribution}");

            let ones = query_all(
                index.as_ref(),
                IndexQuery::new(INDEX_TABLE, "series-a").with_value_equal(b"1".to_vec()),
            )
            .await
            .unwrap();
            assert_eq!(ones.len(), 2, "{layout}/{distribution}");

            let mut batch = index.new_write_batch();
            batch.delete(INDEX_TABLE, "series-a", "a");
            index.batch_write(batch).await.unwrap();
            let left = query_all(index.as_ref(), IndexQuery::new(INDEX_TABLE, "series-a"))
                .await
                .unwrap();
            assert_eq!(left.len(), 2, "{layout}/{distribution}");
        }
    }
}

#[tokio::test]
async fn test_query_pages_stops_when_callback_declines() {
    let (_server, conn) = connect().await;
    let schema = schema();
    create_active_tables(&conn, &schema).await;
    let index =
        new_index_client(IndexLayout::RowPerEntry, KeyDistribution::Plain, &schema, &conn).unwrap();

    let mut batch = index.new_write_batch();
    batch.add(INDEX_TABLE, "h1", "r", b"v".to_vec());
    batch.add(INDEX_TABLE, "h2", "r", b"v".to_vec());
    index.batch_write(batch).await.unwrap();

    let queries = vec![IndexQuery::new(INDEX_TABLE, "h1"), IndexQuery::new(INDEX_TABLE, "h2")];
    let mut seen = Vec::new();
    index
        .query_pages(&queries, &mut |query, entries| {
            seen.push((query.hash_value.clone(), entries.len()));
            false
        })
        .await
        .unwrap();
    assert_eq!(seen, vec![("h1".to_string(), 1)]);
}

#[tokio::test]
async fn test_index_write_to_missing_table_fails() {
    let (_server, conn) = connect().await;
    let index =
        new_index_client(IndexLayout::ColumnKey, KeyDistribution::Plain, &schema(), &conn).unwrap();

    let mut batch = index.new_write_batch();
    batch.add("no_such_table", "h", "r", b"v".to_vec());
    let err = index.batch_write(batch).await.unwrap_err();
    assert!(err.is_not_found(), "unexpected error: {err}");

    let mut batch = index.new_write_batch();
    batch.add(INDEX_TABLE, "", "r", b"v".to_vec());
    assert!(index.batch_write(batch).await.unwrap_err().is_invalid_key());
}

#[tokio::test]
async fn test_cell_chunk_client() {
    let (server, conn) = connect().await;
    let schema = schema();
    create_active_tables(&conn, &schema).await;
    let chunks = new_chunk_client(ChunkBackend::WideColumn, &schema, &conn, None).unwrap();

    let now = Utc::now().timestamp_millis();
    let chunk = Chunk::new("tenant", 7, now, now + 1_000, b"cell bytes".to_vec());
    let missing = Chunk::new("tenant", 8, now, now + 1_000, b"never stored".to_vec());

    chunks.put_chunks(std::slice::from_ref(&chunk)).await.unwrap();
    let table = schema.chunk_table_for(now).unwrap();
    assert_eq!(server.row_count(&table).await, 1);

    let fetched = chunks.get_chunks(&[chunk.descriptor()]).await.unwrap();
    assert_eq!(fetched, vec![chunk.clone()]);

    let err = chunks
        .get_chunks(&[chunk.descriptor(), missing.descriptor()])
        .await
        .unwrap_err();
    assert!(chunks.is_chunk_not_found_err(&err));

    chunks
        .delete_chunk("tenant", &chunk.external_key())
        .await
        .unwrap();
    assert_eq!(server.row_count(&table).await, 0);
}

#[tokio::test]
async fn test_table_client() {
    let (_server, conn) = connect().await;
    let tables = new_table_client(&conn);

    tables.create_table(TableDesc::new("b_table")).await.unwrap();
    tables.create_table(TableDesc::new("a_table")).await.unwrap();
    tables.create_table(TableDesc::new("a_table")).await.unwrap();
    assert_eq!(tables.list_tables().await.unwrap(), vec!["a_table", "b_table"]);

    let (desc, active) = tables.describe_table("a_table").await.unwrap();
    assert_eq!(desc.name, "a_table");
    assert!(active);

    tables
        .update_table(desc.clone(), TableDesc::new("a_table"))
        .await
        .unwrap();

    tables.delete_table("a_table").await.unwrap();
    assert!(tables.delete_table("a_table").await.unwrap_err().is_not_found());
    assert!(tables.describe_table("a_table").await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_closed_connection_fails_requests() {
    let (_server, conn) = connect().await;
    let tables = new_table_client(&conn);

    assert!(conn.close());
    assert!(!conn.close());
    assert!(conn.is_closed());

    let err = tables.list_tables().await.unwrap_err();
    assert!(err.is_connection(), "unexpected error: {err}");
}

async fn object_store() -> (ObjectStoreServer, HttpObjectStore) {
    let server = ObjectStoreServer::start(EPHEMERAL_ADDR).await.unwrap();
    server.create_bucket("chunks").await.unwrap();
    let session = ObjectStoreSession::new(server.client().unwrap(), &server.url()).unwrap();
    let store = HttpObjectStore::new(session, ObjectStoreConfig::new("chunks")).unwrap();
    (server, store)
}

#[tokio::test]
async fn test_http_object_store_operations() {
    let (server, store) = object_store().await;

    store.put("tenant/b", b"two").await.unwrap();
    store.put("tenant/a", b"one").await.unwrap();
    store.put("other/c", b"three").await.unwrap();
    assert_eq!(server.object_count("chunks").await, 3);

    assert_eq!(store.get("tenant/a").await.unwrap(), b"one");
    assert!(store.exists("tenant/b").await.unwrap());
    assert!(!store.exists("tenant/zzz").await.unwrap());
    assert_eq!(
        store.list_objects("tenant/").await.unwrap(),
        vec!["tenant/a", "tenant/b"]
    );

    store.delete("tenant/a").await.unwrap();
    store.delete("tenant/a").await.unwrap();

    let err = StorageError::from_backend(store.get("tenant/a").await.unwrap_err());
    assert!(err.is_not_found(), "unexpected error: {err}");
}

#[tokio::test]
async fn test_object_chunk_client_through_factory() {
    let (wide, conn) = connect().await;
    let (server, _) = object_store().await;
    let schema = schema();

    let err = new_chunk_client(ChunkBackend::ObjectStore, &schema, &conn, None).unwrap_err();
    assert!(matches!(err, StorageError::Configuration(_)));

    let options = ObjectStoreOptions {
        session: ObjectStoreSession::new(server.client().unwrap(), &server.url()).unwrap(),
        config: ObjectStoreConfig::new("chunks").with_max_retries(1),
        hedging: Default::default(),
    };
    let chunks = new_chunk_client(ChunkBackend::ObjectStore, &schema, &conn, Some(options)).unwrap();

    let now = Utc::now().timestamp_millis();
    let chunk = Chunk::new("tenant", 1, now, now + 10, b"object bytes".to_vec());
    chunks.put_chunks(std::slice::from_ref(&chunk)).await.unwrap();
    assert_eq!(server.object_count("chunks").await, 1);
    assert!(wide.table_names().await.is_empty());

    let fetched = chunks.get_chunks(&[chunk.descriptor()]).await.unwrap();
    assert_eq!(fetched[0].data, b"object bytes");
}

#[tokio::test]
async fn test_factory_rejects_invalid_schema_for_every_client() {
    let (_server, conn) = connect().await;
    let empty = SchemaConfig::default();

    for layout in IndexLayout::ALL {
        let err = new_index_client(layout, KeyDistribution::Plain, &empty, &conn).unwrap_err();
        assert!(matches!(err, StorageError::Configuration(_)), "{layout}: {err}");
    }
    let err = new_chunk_client(ChunkBackend::WideColumn, &empty, &conn, None).unwrap_err();
    assert!(matches!(err, StorageError::Configuration(_)));

    let valid = schema();
    let index = new_index_client(IndexLayout::ColumnKey, KeyDistribution::HashPrefixed, &valid, &conn);
    assert!(index.is_ok());

    let direct = ColumnKeyIndex::new(
        WideColumnConfig::default(),
        valid.clone(),
        DataClient::new(&conn),
    );
    assert_eq!(direct.schema(), &valid);
}

#[tokio::test]
async fn test_http_object_store_unreachable_is_not_not_found() {
    let session = ObjectStoreSession::connect("http://127.0.0.1:9").unwrap();
    let store = HttpObjectStore::new(session, ObjectStoreConfig::new("chunks").with_max_retries(2))
        .unwrap();

    let err = StorageError::from_backend(store.get("k").await.unwrap_err());
    assert!(err.is_connection(), "unexpected error: {err}");
}
