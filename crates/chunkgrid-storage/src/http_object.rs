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
//! Object store backend over HTTP
//!
//! Implements [`StorageBackend`] against the object-store emulator's JSON/HTTP
//! API (`/b/{bucket}/o/{object}`) with:
//! - Per-request timeouts
//! - Retry with exponential backoff for transient failures
//! - Optional hedged reads (see [`HedgingConfig`])
//! - "object not found" errors for missing keys, as the trait requires
//!
//! # Examples
//!
//! ```rust,no_run
//! use chunkgrid_storage::{HttpObjectStore, ObjectStoreConfig, ObjectStoreSession, StorageBackend};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let session = ObjectStoreSession::connect("http://127.0.0.1:9023")?;
//!     let store = HttpObjectStore::new(session, ObjectStoreConfig::new("chunks"))?;
//!
//!     store.put("tenant/abc", b"data").await?;
//!     assert_eq!(store.get("tenant/abc").await?, b"data");
//!     Ok(())
//! }
//! ```

use crate::error::{StorageError, StorageResult};
use crate::hedging::HedgingConfig;
use crate::StorageBackend;
use async_trait::async_trait;
use chunkgrid_protocol::ListObjectsResponse;
use reqwest::{Method, StatusCode, Url};
use std::fmt;
use std::time::Duration;
use tracing::{debug, warn};

/// Configuration for the HTTP object store
#[derive(Clone, Debug)]
pub struct ObjectStoreConfig {
    /// Bucket holding every object
    pub bucket_name: String,
    /// Maximum number of attempts for transient failures
    /// Default: 3
    pub max_retries: u32,
    /// Timeout applied to each request
    /// Default: 30s
    pub request_timeout: Duration,
}

impl Default for ObjectStoreConfig {
    fn default() -> Self {
        ObjectStoreConfig {
            bucket_name: String::new(),
            max_retries: 3,
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl ObjectStoreConfig {
    /// Configuration for `bucket_name` with default retry settings
    pub fn new(bucket_name: impl Into<String>) -> Self {
        ObjectStoreConfig {
            bucket_name: bucket_name.into(),
            ..Default::default()
        }
    }

    /// Set the maximum number of attempts
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Set the per-request timeout
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

/// An HTTP client bound to one object-store endpoint
#[derive(Clone, Debug)]
pub struct ObjectStoreSession {
    http: reqwest::Client,
    base_url: Url,
}

impl ObjectStoreSession {
    /// Wrap an existing client
    pub fn new(http: reqwest::Client, base_url: &str) -> StorageResult<Self> {
        let base_url = Url::parse(base_url).map_err(|e| {
            StorageError::configuration(format!("invalid object store url {:?}: {}", base_url, e))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(StorageError::configuration(format!(
                "object store url {} cannot be a base",
                base_url
            )));
        }
        Ok(Self { http, base_url })
    }

    /// Build a client for `base_url` that bypasses proxies
    pub fn connect(base_url: &str) -> StorageResult<Self> {
        let http = reqwest::Client::builder()
            .no_proxy()
            .connect_timeout(Duration::from_secs(5))
            .build()?;
        Self::new(http, base_url)
    }

    /// Endpoint this session talks to
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

/// Object store backend talking HTTP to a single bucket
#[derive(Clone)]
pub struct HttpObjectStore {
    session: ObjectStoreSession,
    config: ObjectStoreConfig,
    hedging: HedgingConfig,
}

impl HttpObjectStore {
    /// Create a backend for `config.bucket_name` on `session`
    pub fn new(session: ObjectStoreSession, config: ObjectStoreConfig) -> StorageResult<Self> {
        if config.bucket_name.is_empty() {
            return Err(StorageError::configuration("bucket_name cannot be empty"));
        }

        debug!(
            endpoint = %session.base_url,
            bucket_name = %config.bucket_name,
            max_retries = config.max_retries,
            "Initialized HTTP object store"
        );

        Ok(Self {
            session,
            config,
            hedging: HedgingConfig::default(),
        })
    }

    /// Hedge reads with `hedging`
    pub fn with_hedging(mut self, hedging: HedgingConfig) -> Self {
        self.hedging = hedging;
        self
    }

    /// Get the configuration for this backend
    pub fn config(&self) -> &ObjectStoreConfig {
        &self.config
    }

    fn object_url(&self, key: &str) -> Url {
        let mut segments = vec!["b", self.config.bucket_name.as_str(), "o"];
        segments.extend(key.split('/'));
        self.session.url(&segments)
    }

    fn list_url(&self, prefix: &str) -> Url {
        let mut url = self
            .session
            .url(&["b", self.config.bucket_name.as_str(), "o"]);
        url.query_pairs_mut().append_pair("prefix", prefix);
        url
    }

    async fn send(
        &self,
        method: Method,
        url: Url,
        body: Option<&[u8]>,
    ) -> StorageResult<reqwest::Response> {
        let mut request = self
            .session
            .http
            .request(method, url)
            .timeout(self.config.request_timeout);
        if let Some(body) = body {
            request = request.body(body.to_vec());
        }
        Ok(request.send().await?)
    }

    async fn fetch(&self, key: &str) -> anyhow::Result<Vec<u8>> {
        let response = self.send(Method::GET, self.object_url(key), None).await?;
        match response.status() {
            status if status.is_success() => {
                let body = response.bytes().await.map_err(StorageError::from)?;
                Ok(body.to_vec())
            }
            StatusCode::NOT_FOUND => Err(StorageError::not_found(key).into()),
            _ => Err(rejected(response).await.into()),
        }
    }

    /// Retry logic with exponential backoff for transient failures
    async fn retry<F, Fut, T>(&self, mut f: F) -> anyhow::Result<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = anyhow::Result<T>>,
    {
        let mut retry_count = 0;
        let mut delay_ms = 100u64;

        loop {
            match f().await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    retry_count += 1;
                    if retry_count >= self.config.max_retries || !is_transient(&e) {
                        return Err(e);
                    }

                    warn!(
                        retry_count,
                        delay_ms,
                        error = %e,
                        "Retrying failed object store operation"
                    );

                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                    delay_ms = std::cmp::min(delay_ms * 2, 32000); // Cap at 32s
                }
            }
        }
    }
}

/// Whether an operation error is worth retrying
fn is_transient(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<StorageError>(),
        Some(StorageError::Connection(_) | StorageError::Timeout(_) | StorageError::Backend(_))
    )
}

/// Turn an unexpected response into an error. Server errors are transient;
/// client errors are not.
async fn rejected(response: reqwest::Response) -> StorageError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = format!("object store answered {}: {}", status, body);
    if status.is_server_error() {
        StorageError::backend(message)
    } else if status == StatusCode::CONFLICT {
        StorageError::AlreadyExists(message)
    } else {
        StorageError::Other(anyhow::anyhow!(message))
    }
}

impl fmt::Debug for HttpObjectStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpObjectStore")
            .field("endpoint", &self.session.base_url.as_str())
            .field("bucket_name", &self.config.bucket_name)
            .field("max_retries", &self.config.max_retries)
            .field("hedging", &self.hedging.is_enabled())
            .finish()
    }
}

#[async_trait]
impl StorageBackend for HttpObjectStore {
    async fn get(&self, key: &str) -> anyhow::Result<Vec<u8>> {
        if key.is_empty() {
            return Err(anyhow::anyhow!("key cannot be empty"));
        }

        debug!(key, "GET object");
        self.retry(move || self.hedging.execute(move || self.fetch(key)))
            .await
    }

    async fn put(&self, key: &str, data: &[u8]) -> anyhow::Result<()> {
        if key.is_empty() {
            return Err(anyhow::anyhow!("key cannot be empty"));
        }

        debug!(key, size = data.len(), "PUT object");
        self.retry(|| async move {
            let response = self.send(Method::PUT, self.object_url(key), Some(data)).await?;
            match response.status() {
                status if status.is_success() => Ok(()),
                StatusCode::NOT_FOUND => Err(StorageError::not_found(format!(
                    "bucket {}",
                    self.config.bucket_name
                ))
                .into()),
                _ => Err(rejected(response).await.into()),
            }
        })
        .await
    }

    async fn exists(&self, key: &str) -> anyhow::Result<bool> {
        if key.is_empty() {
            return Err(anyhow::anyhow!("key cannot be empty"));
        }

        self.retry(|| async move {
            let response = self.send(Method::HEAD, self.object_url(key), None).await?;
            match response.status() {
                status if status.is_success() => Ok(true),
                StatusCode::NOT_FOUND => Ok(false),
                _ => Err(rejected(response).await.into()),
            }
        })
        .await
    }

    async fn delete(&self, key: &str) -> anyhow::Result<()> {
        if key.is_empty() {
            return Err(anyhow::anyhow!("key cannot be empty"));
        }

        debug!(key, "DELETE object");
        self.retry(|| async move {
            let response = self.send(Method::DELETE, self.object_url(key), None).await?;
            match response.status() {
                status if status.is_success() => Ok(()),
                StatusCode::NOT_FOUND => Ok(()),
                _ => Err(rejected(response).await.into()),
            }
        })
        .await
    }

    async fn list_objects(&self, prefix: &str) -> anyhow::Result<Vec<String>> {
        self.retry(|| async move {
            let response = self.send(Method::GET, self.list_url(prefix), None).await?;
            if !response.status().is_success() {
                return Err(rejected(response).await.into());
            }
            let listing: ListObjectsResponse = response.json().await.map_err(StorageError::from)?;
            let mut names = listing.names;
            names.sort();
            Ok(names)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> HttpObjectStore {
        let session = ObjectStoreSession::connect("http://127.0.0.1:9/").unwrap();
        HttpObjectStore::new(session, ObjectStoreConfig::new("chunks")).unwrap()
    }

    #[test]
    fn test_config_builder() {
        let config = ObjectStoreConfig::new("bucket")
            .with_max_retries(5)
            .with_request_timeout(Duration::from_secs(1));
        assert_eq!(config.bucket_name, "bucket");
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.request_timeout, Duration::from_secs(1));
    }

    #[test]
    fn test_empty_bucket_rejected() {
        let session = ObjectStoreSession::connect("http://127.0.0.1:9").unwrap();
        let err = HttpObjectStore::new(session, ObjectStoreConfig::default()).unwrap_err();
        assert!(matches!(err, StorageError::Configuration(_)));
    }

    #[test]
    fn test_invalid_url_rejected() {
        let err = ObjectStoreSession::connect("not a url").unwrap_err();
        assert!(matches!(err, StorageError::Configuration(_)));
    }

    #[test]
    fn test_object_url_escapes_segments() {
        let store = store();
        let url = store.object_url("tenant/a b:1");
        assert_eq!(url.path(), "/b/chunks/o/tenant/a%20b:1");

        let url = store.list_url("tenant/");
        assert_eq!(url.path(), "/b/chunks/o");
        assert_eq!(url.query(), Some("prefix=tenant%2F"));
    }

    #[test]
    fn test_transient_classification() {
        assert!(is_transient(&StorageError::connection("refused").into()));
        assert!(is_transient(&StorageError::backend("500").into()));
        assert!(!is_transient(&StorageError::not_found("k").into()));
        assert!(!is_transient(&anyhow::anyhow!("untyped")));
    }

    #[tokio::test]
    async fn test_empty_keys_rejected() {
        let store = store();
        assert!(store.get("").await.is_err());
        assert!(store.put("", b"x").await.is_err());
        assert!(store.exists("").await.is_err());
        assert!(store.delete("").await.is_err());
    }
}
