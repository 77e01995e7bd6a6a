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
//! Schema and sample data for fixture tests

use chrono::{Duration, Utc};
use chunkgrid_storage::{Chunk, SchemaConfig, WriteBatch};

/// Schema every fixture builds its clients with
///
/// One `v1` period that started two hours ago, so the current time falls
/// inside it.
pub fn default_schema_config(kind: &str) -> SchemaConfig {
    SchemaConfig::single_period(kind, "v1", Utc::now() - Duration::hours(2))
}

/// Index table covering the current time under `schema`
pub fn current_index_table(schema: &SchemaConfig) -> Option<String> {
    schema.index_table_for(Utc::now().timestamp_millis()).ok()
}

/// Predictable bytes of the given length
pub fn chunk_data(size: usize) -> Vec<u8> {
    (0..size).map(|i| (i % 256) as u8).collect()
}

/// `count` chunks for `user_id`, each one hour long and ending now
///
/// Fingerprints are `0..count` and the data of each chunk differs.
pub fn sample_chunks(user_id: &str, count: usize) -> Vec<Chunk> {
    let through = Utc::now().timestamp_millis();
    let from = through - Duration::hours(1).num_milliseconds();
    (0..count)
        .map(|i| {
            let mut data = chunk_data(64 + i);
            data.extend_from_slice(format!("chunk-{i}").as_bytes());
            Chunk::new(user_id, i as u64, from, through, data)
        })
        .collect()
}

/// Batch adding `count` entries under `hash_value`
///
/// Range values are `range-000`, `range-001` and so on, so their order
/// matches insertion order. Each value is the range value's bytes.
pub fn sample_index_batch(table: &str, hash_value: &str, count: usize) -> WriteBatch {
    let mut batch = WriteBatch::new();
    for i in 0..count {
        let range = format!("range-{i:03}");
        batch.add(table, hash_value, range.clone(), range.into_bytes());
    }
    batch
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_schema_covers_now() {
        let schema = default_schema_config("widecolumn");
        schema.validate().unwrap();
        let table = current_index_table(&schema).unwrap();
        assert!(table.starts_with("index_"));
        assert!(schema.active_tables(Utc::now()).contains(&table));
    }

    #[test]
    fn test_sample_chunks_have_distinct_keys() {
        let chunks = sample_chunks("tenant", 4);
        let mut keys: Vec<_> = chunks.iter().map(Chunk::external_key).collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), 4);
    }

    #[test]
    fn test_sample_batch_is_ordered() {
        let batch = sample_index_batch("t", "h", 3);
        assert_eq!(batch.len(), 3);
        let ranges: Vec<_> = batch.adds.iter().map(|e| e.range_value.as_str()).collect();
        assert_eq!(ranges, vec!["range-000", "range-001", "range-002"]);
    }
}
