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
//! Table administration over the wide-column store

use super::conn::AdminClient;
use super::COLUMN_FAMILY;
use crate::error::StorageResult;
use crate::table::{TableClient, TableDesc};
use async_trait::async_trait;
use tracing::debug;

/// [`TableClient`] for the wide-column store
///
/// Every table is created with the single column family the data clients use.
#[derive(Debug, Clone)]
pub struct WideColumnTableClient {
    admin: AdminClient,
}

impl WideColumnTableClient {
    /// Build over `admin`
    pub fn new(admin: AdminClient) -> Self {
        Self { admin }
    }
}

#[async_trait]
impl TableClient for WideColumnTableClient {
    async fn list_tables(&self) -> StorageResult<Vec<String>> {
        self.admin.list_tables().await
    }

    async fn create_table(&self, desc: TableDesc) -> StorageResult<()> {
        match self.admin.create_table(&desc.name, &[COLUMN_FAMILY]).await {
            Err(e) if e.is_already_exists() => {
                debug!(table = %desc.name, "Table already exists");
                Ok(())
            }
            Err(e) => Err(e),
            Ok(()) => {
                debug!(table = %desc.name, "Created table");
                Ok(())
            }
        }
    }

    async fn delete_table(&self, name: &str) -> StorageResult<()> {
        self.admin.delete_table(name).await?;
        debug!(table = name, "Deleted table");
        Ok(())
    }

    async fn describe_table(&self, name: &str) -> StorageResult<(TableDesc, bool)> {
        let info = self.admin.table_info(name).await?;
        Ok((TableDesc::new(info.name), true))
    }

    async fn update_table(&self, current: TableDesc, expected: TableDesc) -> StorageResult<()> {
        debug!(
            current = %current.name,
            expected = %expected.name,
            "Table updates are a no-op for the wide-column store"
        );
        Ok(())
    }
}
