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
//! Table administration

use crate::error::StorageResult;
use async_trait::async_trait;
use std::fmt::Debug;

/// Description of a table-like resource
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TableDesc {
    /// Table name
    pub name: String,
}

impl TableDesc {
    /// Describe a table by name
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Create, list and remove tables
#[async_trait]
pub trait TableClient: Send + Sync + Debug {
    /// All table names, sorted
    async fn list_tables(&self) -> StorageResult<Vec<String>>;

    /// Create a table. Creating an existing table succeeds.
    async fn create_table(&self, desc: TableDesc) -> StorageResult<()>;

    /// Remove a table
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the table does not exist.
    async fn delete_table(&self, name: &str) -> StorageResult<()>;

    /// Current description of a table and whether it is ready for use
    async fn describe_table(&self, name: &str) -> StorageResult<(TableDesc, bool)>;

    /// Bring `current` in line with `expected`
    async fn update_table(&self, current: TableDesc, expected: TableDesc) -> StorageResult<()>;
}
