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
//! Object-store emulator wire types
//!
//! Object bodies travel as raw bytes; only bucket and listing calls use JSON.

use serde::{Deserialize, Serialize};

/// Request for POST /b
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CreateBucketRequest {
    /// Bucket name
    pub name: String,
}

/// Response for GET /b
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ListBucketsResponse {
    /// Bucket names, sorted
    pub buckets: Vec<String>,
}

/// Response for GET /b/{bucket}/o
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ListObjectsResponse {
    /// Object names matching the prefix, sorted
    pub names: Vec<String>,
}
