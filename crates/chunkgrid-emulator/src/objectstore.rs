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
//! Object-store emulator
//!
//! Buckets of named byte objects, in memory. Object names may contain `/`,
//! so object routes use a wildcard segment.
//!
//! Buckets can be created in-process with [`ObjectStoreServer::create_bucket`]
//! (the usual way to seed a namespace before a test) or over HTTP.
//! [`ObjectStoreServer::client`] hands out HTTP clients for in-process callers;
//! the emulator performs no authentication.

use crate::error::{EmulatorError, EmulatorResult};
use crate::server::ServerHandle;
use axum::extract::{DefaultBodyLimit, Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use bytes::Bytes;
use chunkgrid_protocol::{
    CreateBucketRequest, HealthResponse, ListBucketsResponse, ListObjectsResponse,
    OBJECT_STORE_SERVICE,
};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;

type Bucket = BTreeMap<String, Vec<u8>>;

#[derive(Debug, Default)]
struct ObjectStoreState {
    buckets: RwLock<BTreeMap<String, Bucket>>,
}

impl ObjectStoreState {
    async fn create_bucket(&self, name: &str) -> EmulatorResult<()> {
        validate_bucket_name(name)?;
        let mut buckets = self.buckets.write().await;
        if buckets.contains_key(name) {
            return Err(EmulatorError::AlreadyExists(format!("bucket {}", name)));
        }
        buckets.insert(name.to_string(), Bucket::new());
        debug!(bucket = %name, "Created bucket");
        Ok(())
    }
}

/// A running object-store emulator
///
/// Cloning shares the same server; the listener stops when [`close`](Self::close)
/// is called or the last clone is dropped.
#[derive(Clone)]
pub struct ObjectStoreServer {
    server: Arc<ServerHandle>,
    state: Arc<ObjectStoreState>,
}

impl ObjectStoreServer {
    /// Start a fresh emulator with no buckets, listening on `addr`
    pub async fn start(addr: &str) -> EmulatorResult<Self> {
        let state = Arc::new(ObjectStoreState::default());
        let server = ServerHandle::spawn("objectstore", addr, router(Arc::clone(&state))).await?;
        Ok(Self {
            server: Arc::new(server),
            state,
        })
    }

    /// Bound address
    pub fn addr(&self) -> std::net::SocketAddr {
        self.server.addr()
    }

    /// Base URL for clients
    pub fn url(&self) -> String {
        self.server.url()
    }

    /// Whether the server still accepts connections
    pub fn is_running(&self) -> bool {
        self.server.is_running()
    }

    /// Stop the server; returns `false` if it was already stopped
    pub fn close(&self) -> bool {
        self.server.close()
    }

    /// Create a bucket directly in the emulator's state
    pub async fn create_bucket(&self, name: &str) -> EmulatorResult<()> {
        self.state.create_bucket(name).await
    }

    /// Names of all buckets, sorted
    pub async fn bucket_names(&self) -> Vec<String> {
        self.state.buckets.read().await.keys().cloned().collect()
    }

    /// Number of objects in `bucket` (0 if it does not exist)
    pub async fn object_count(&self, bucket: &str) -> usize {
        self.state
            .buckets
            .read()
            .await
            .get(bucket)
            .map_or(0, |b| b.len())
    }

    /// A new HTTP client suitable for talking to this emulator
    ///
    /// Proxies are bypassed since the emulator only listens on a local address.
    pub fn client(&self) -> reqwest::Result<reqwest::Client> {
        reqwest::Client::builder()
            .no_proxy()
            .connect_timeout(Duration::from_secs(5))
            .build()
    }
}

impl fmt::Debug for ObjectStoreServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectStoreServer")
            .field("addr", &self.server.addr())
            .finish()
    }
}

/// Bucket names: 3 to 63 characters of lowercase letters, digits, `-`, `_` and `.`,
/// starting and ending with a letter or digit
pub fn validate_bucket_name(name: &str) -> EmulatorResult<()> {
    let valid_len = (3..=63).contains(&name.len());
    let valid_chars = name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '-' | '_' | '.'));
    let valid_ends = name
        .chars()
        .next()
        .zip(name.chars().last())
        .is_some_and(|(first, last)| first.is_ascii_alphanumeric() && last.is_ascii_alphanumeric());

    if valid_len && valid_chars && valid_ends {
        Ok(())
    } else {
        Err(EmulatorError::invalid(format!(
            "invalid bucket name {:?}",
            name
        )))
    }
}

fn router(state: Arc<ObjectStoreState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/b", get(list_buckets).post(create_bucket))
        .route("/b/{bucket}/o", get(list_objects))
        .route(
            "/b/{bucket}/o/{*name}",
            get(get_object).put(put_object).delete(delete_object),
        )
        .layer(DefaultBodyLimit::max(64 * 1024 * 1024))
        .with_state(state)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::ok(OBJECT_STORE_SERVICE))
}

/// GET /b
async fn list_buckets(State(state): State<Arc<ObjectStoreState>>) -> Json<ListBucketsResponse> {
    let buckets = state.buckets.read().await.keys().cloned().collect();
    Json(ListBucketsResponse { buckets })
}

/// POST /b
async fn create_bucket(
    State(state): State<Arc<ObjectStoreState>>,
    Json(req): Json<CreateBucketRequest>,
) -> EmulatorResult<StatusCode> {
    state.create_bucket(&req.name).await?;
    Ok(StatusCode::CREATED)
}

#[derive(Debug, Deserialize)]
struct ListParams {
    prefix: Option<String>,
}

/// GET /b/{bucket}/o?prefix=
async fn list_objects(
    Path(bucket): Path<String>,
    Query(params): Query<ListParams>,
    State(state): State<Arc<ObjectStoreState>>,
) -> EmulatorResult<Json<ListObjectsResponse>> {
    let buckets = state.buckets.read().await;
    let objects = buckets
        .get(&bucket)
        .ok_or_else(|| EmulatorError::not_found(format!("bucket {}", bucket)))?;

    let prefix = params.prefix.unwrap_or_default();
    let names = objects
        .keys()
        .filter(|k| k.starts_with(&prefix))
        .cloned()
        .collect();
    Ok(Json(ListObjectsResponse { names }))
}

/// GET (and HEAD) /b/{bucket}/o/{name}
async fn get_object(
    Path((bucket, name)): Path<(String, String)>,
    State(state): State<Arc<ObjectStoreState>>,
) -> EmulatorResult<Vec<u8>> {
    let buckets = state.buckets.read().await;
    let objects = buckets
        .get(&bucket)
        .ok_or_else(|| EmulatorError::not_found(format!("bucket {}", bucket)))?;

    objects
        .get(&name)
        .cloned()
        .ok_or_else(|| EmulatorError::not_found(format!("object {}/{}", bucket, name)))
}

/// PUT /b/{bucket}/o/{name}
async fn put_object(
    Path((bucket, name)): Path<(String, String)>,
    State(state): State<Arc<ObjectStoreState>>,
    body: Bytes,
) -> EmulatorResult<StatusCode> {
    let mut buckets = state.buckets.write().await;
    let objects = buckets
        .get_mut(&bucket)
        .ok_or_else(|| EmulatorError::not_found(format!("bucket {}", bucket)))?;

    debug!(bucket = %bucket, object = %name, size = body.len(), "Stored object");
    objects.insert(name, body.to_vec());
    Ok(StatusCode::OK)
}

/// DELETE /b/{bucket}/o/{name}
async fn delete_object(
    Path((bucket, name)): Path<(String, String)>,
    State(state): State<Arc<ObjectStoreState>>,
) -> EmulatorResult<StatusCode> {
    let mut buckets = state.buckets.write().await;
    let objects = buckets
        .get_mut(&bucket)
        .ok_or_else(|| EmulatorError::not_found(format!("bucket {}", bucket)))?;

    match objects.remove(&name) {
        Some(_) => Ok(StatusCode::NO_CONTENT),
        None => Err(EmulatorError::not_found(format!(
            "object {}/{}",
            bucket, name
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_name_rules() {
        assert!(validate_bucket_name("chunks").is_ok());
        assert!(validate_bucket_name("my-bucket.v2").is_ok());
        assert!(validate_bucket_name("").is_err());
        assert!(validate_bucket_name("ab").is_err());
        assert!(validate_bucket_name("Upper").is_err());
        assert!(validate_bucket_name("-leading").is_err());
        assert!(validate_bucket_name(&"a".repeat(64)).is_err());
    }

    #[tokio::test]
    async fn test_create_bucket_in_process() {
        let server = ObjectStoreServer::start("127.0.0.1:0").await.unwrap();
        server.create_bucket("chunks").await.unwrap();
        assert_eq!(server.bucket_names().await, vec!["chunks".to_string()]);
        assert_eq!(server.object_count("chunks").await, 0);

        let err = server.create_bucket("chunks").await.unwrap_err();
        assert!(matches!(err, EmulatorError::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn test_client_builds() {
        let server = ObjectStoreServer::start("127.0.0.1:0").await.unwrap();
        assert!(server.client().is_ok());
        server.close();
        assert!(!server.is_running());
    }
}
