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
//! Wire types for the chunkgrid emulators
//!
//! Both emulators speak JSON over HTTP. The request and response bodies live
//! here so that the emulator crate and the storage clients agree on one
//! definition without depending on each other.

pub mod objectstore;
pub mod widecolumn;

use serde::{Deserialize, Serialize};

pub use objectstore::{CreateBucketRequest, ListBucketsResponse, ListObjectsResponse};
pub use widecolumn::{
    Cell, CreateTableRequest, ListTablesResponse, MutateRowsRequest, Mutation, ReadRowsRequest,
    ReadRowsResponse, Row, RowSet, TableInfo,
};

/// Service name reported by the wide-column emulator health endpoint
pub const WIDE_COLUMN_SERVICE: &str = "widecolumn";

/// Service name reported by the object-store emulator health endpoint
pub const OBJECT_STORE_SERVICE: &str = "objectstore";

/// Response for GET /health
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct HealthResponse {
    /// Always "ok" while the server accepts requests
    pub status: String,
    /// Which emulator answered
    pub service: String,
}

impl HealthResponse {
    /// Healthy response for the named service
    pub fn ok(service: impl Into<String>) -> Self {
        Self {
            status: "ok".to_string(),
            service: service.into(),
        }
    }
}

/// Body of every non-2xx response
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ErrorResponse {
    /// Human readable reason
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_ok() {
        let health = HealthResponse::ok(WIDE_COLUMN_SERVICE);
        assert_eq!(health.status, "ok");
        assert_eq!(health.service, "widecolumn");
    }
}
