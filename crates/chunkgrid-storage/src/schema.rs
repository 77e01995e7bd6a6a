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
//! Schema configuration
//!
//! The schema decides which tables index entries and chunks land in. It is a
//! list of periods, each starting at `from` and lasting until the next one.
//! Within a period, tables rotate every `period` (or never, for a zero period).

use crate::error::{StorageError, StorageResult};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::collections::BTreeSet;
use std::time::Duration;

/// Default table rotation: one table per week
pub const DEFAULT_TABLE_PERIOD: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Naming scheme for a family of rotating tables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodicTableConfig {
    /// Table name prefix
    pub prefix: String,
    /// Rotation period; zero means a single table named `prefix`
    pub period: Duration,
}

impl PeriodicTableConfig {
    /// Create a table scheme
    pub fn new(prefix: impl Into<String>, period: Duration) -> Self {
        Self {
            prefix: prefix.into(),
            period,
        }
    }

    fn period_ms(&self) -> i64 {
        i64::try_from(self.period.as_millis()).unwrap_or(i64::MAX)
    }

    /// Table holding data for timestamp `ts_ms`
    pub fn table_for(&self, ts_ms: i64) -> String {
        match self.period_ms() {
            0 => self.prefix.clone(),
            period => format!("{}{}", self.prefix, ts_ms.div_euclid(period)),
        }
    }

    /// Every table touched by `[from_ms, through_ms]`
    pub fn tables_between(&self, from_ms: i64, through_ms: i64) -> Vec<String> {
        match self.period_ms() {
            0 => vec![self.prefix.clone()],
            period => (from_ms.div_euclid(period)..=through_ms.div_euclid(period))
                .map(|n| format!("{}{}", self.prefix, n))
                .collect(),
        }
    }
}

/// One period of the schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodConfig {
    /// When this period starts
    pub from: DateTime<Utc>,
    /// Which index store serves this period
    pub index_type: String,
    /// Which chunk store serves this period
    pub object_type: String,
    /// Schema version
    pub schema: String,
    /// Index table naming
    pub index_tables: PeriodicTableConfig,
    /// Chunk table naming
    pub chunk_tables: PeriodicTableConfig,
}

/// The full schema: periods ordered by start time
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SchemaConfig {
    /// Periods, oldest first
    pub configs: Vec<PeriodConfig>,
}

impl SchemaConfig {
    /// Single-period schema with weekly `index_` and `chunks_` tables
    pub fn single_period(store: &str, schema: &str, from: DateTime<Utc>) -> Self {
        Self {
            configs: vec![PeriodConfig {
                from,
                index_type: store.to_string(),
                object_type: store.to_string(),
                schema: schema.to_string(),
                index_tables: PeriodicTableConfig::new("index_", DEFAULT_TABLE_PERIOD),
                chunk_tables: PeriodicTableConfig::new("chunks_", DEFAULT_TABLE_PERIOD),
            }],
        }
    }

    /// Check the periods are non-empty, ordered and fully named
    pub fn validate(&self) -> StorageResult<()> {
        if self.configs.is_empty() {
            return Err(StorageError::configuration("schema has no periods"));
        }
        if self.configs.windows(2).any(|w| w[0].from >= w[1].from) {
            return Err(StorageError::configuration(
                "schema periods must be in strictly increasing order",
            ));
        }
        if self
            .configs
            .iter()
            .any(|c| c.index_tables.prefix.is_empty() || c.chunk_tables.prefix.is_empty())
        {
            return Err(StorageError::configuration("table prefixes cannot be empty"));
        }
        Ok(())
    }

    /// Period in force at `ts_ms`. Times before the first period map to it.
    pub fn period_for(&self, ts_ms: i64) -> StorageResult<&PeriodConfig> {
        self.configs
            .iter()
            .rev()
            .find(|c| c.from.timestamp_millis() <= ts_ms)
            .or_else(|| self.configs.first())
            .ok_or_else(|| StorageError::configuration("schema has no periods"))
    }

    /// Index table for entries written at `ts_ms`
    pub fn index_table_for(&self, ts_ms: i64) -> StorageResult<String> {
        Ok(self.period_for(ts_ms)?.index_tables.table_for(ts_ms))
    }

    /// Chunk table for chunks starting at `ts_ms`
    pub fn chunk_table_for(&self, ts_ms: i64) -> StorageResult<String> {
        Ok(self.period_for(ts_ms)?.chunk_tables.table_for(ts_ms))
    }

    /// Index and chunk tables needed from the first period up to one
    /// rotation past `now`, sorted
    pub fn active_tables(&self, now: DateTime<Utc>) -> Vec<String> {
        let mut tables = BTreeSet::new();
        for (i, config) in self.configs.iter().enumerate() {
            let start = config.from.timestamp_millis();
            let end = match self.configs.get(i + 1) {
                Some(next) => next.from.timestamp_millis() - 1,
                None => {
                    let lookahead = ChronoDuration::from_std(config.index_tables.period)
                        .unwrap_or_else(|_| ChronoDuration::zero());
                    (now + lookahead).timestamp_millis()
                }
            };
            if end < start {
                continue;
            }
            tables.extend(config.index_tables.tables_between(start, end));
            tables.extend(config.chunk_tables.tables_between(start, end));
        }
        tables.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WEEK_MS: i64 = 7 * 24 * 60 * 60 * 1000;

    #[test]
    fn test_zero_period_is_single_table() {
        let tables = PeriodicTableConfig::new("static", Duration::ZERO);
        assert_eq!(tables.table_for(123_456), "static");
        assert_eq!(tables.tables_between(0, i64::MAX), vec!["static"]);
    }

    #[test]
    fn test_weekly_rotation() {
        let tables = PeriodicTableConfig::new("index_", DEFAULT_TABLE_PERIOD);
        assert_eq!(tables.table_for(0), "index_0");
        assert_eq!(tables.table_for(WEEK_MS - 1), "index_0");
        assert_eq!(tables.table_for(WEEK_MS), "index_1");
        assert_eq!(
            tables.tables_between(WEEK_MS - 1, 2 * WEEK_MS),
            vec!["index_0", "index_1", "index_2"]
        );
    }

    #[test]
    fn test_active_tables_cover_now() {
        let now = Utc::now();
        let schema = SchemaConfig::single_period("widecolumn", "v1", now - ChronoDuration::hours(2));
        schema.validate().unwrap();

        let active = schema.active_tables(now);
        let now_ms = now.timestamp_millis();
        assert!(active.contains(&schema.index_table_for(now_ms).unwrap()));
        assert!(active.contains(&schema.chunk_table_for(now_ms).unwrap()));

        let mut sorted = active.clone();
        sorted.sort();
        assert_eq!(active, sorted);
    }

    #[test]
    fn test_period_for_picks_latest_started() {
        let t0 = DateTime::<Utc>::UNIX_EPOCH;
        let t1 = t0 + ChronoDuration::days(30);
        let mut schema = SchemaConfig::single_period("a", "v1", t0);
        let mut second = schema.configs[0].clone();
        second.from = t1;
        second.index_type = "b".to_string();
        schema.configs.push(second);
        schema.validate().unwrap();

        assert_eq!(schema.period_for(0).unwrap().index_type, "a");
        assert_eq!(schema.period_for(-5).unwrap().index_type, "a");
        assert_eq!(
            schema.period_for(t1.timestamp_millis()).unwrap().index_type,
            "b"
        );
    }

    #[test]
    fn test_validate_rejects_bad_schemas() {
        assert!(SchemaConfig::default().validate().is_err());

        let now = Utc::now();
        let mut schema = SchemaConfig::single_period("a", "v1", now);
        schema.configs.push(schema.configs[0].clone());
        assert!(schema.validate().is_err());

        let mut schema = SchemaConfig::single_period("a", "v1", now);
        schema.configs[0].chunk_tables.prefix.clear();
        assert!(schema.validate().is_err());
    }
}
