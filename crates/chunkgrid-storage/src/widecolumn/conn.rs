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
//! Connection to the wide-column emulator
//!
//! [`Connection::dial`] performs a health handshake before handing out a
//! connection, so a wrong or dead endpoint fails early with
//! [`StorageError::Connection`]. [`AdminClient`] and [`DataClient`] are thin
//! typed views over a shared connection. Closing the connection makes every
//! client built on it fail with `Connection` errors.

use crate::error::{StorageError, StorageResult};
use chunkgrid_protocol::{
    CreateTableRequest, ErrorResponse, HealthResponse, ListTablesResponse, MutateRowsRequest,
    Mutation, ReadRowsRequest, ReadRowsResponse, Row, RowSet, TableInfo, WIDE_COLUMN_SERVICE,
};
use reqwest::{Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tracing::debug;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

struct ConnectionInner {
    endpoint: Url,
    http: RwLock<Option<reqwest::Client>>,
}

/// A shared, closable connection to one wide-column endpoint
#[derive(Clone)]
pub struct Connection {
    inner: Arc<ConnectionInner>,
}

impl Connection {
    /// Connect to `endpoint` and check that a wide-column service answers
    ///
    /// # Errors
    ///
    /// Returns `Configuration` for a malformed endpoint and `Connection` if
    /// the endpoint is unreachable or is not a wide-column service.
    pub async fn dial(endpoint: &str) -> StorageResult<Self> {
        let endpoint = Url::parse(endpoint).map_err(|e| {
            StorageError::configuration(format!("invalid endpoint {:?}: {}", endpoint, e))
        })?;
        if endpoint.cannot_be_a_base() {
            return Err(StorageError::configuration(format!(
                "endpoint {} cannot be a base",
                endpoint
            )));
        }

        let http = reqwest::Client::builder()
            .no_proxy()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        let conn = Self {
            inner: Arc::new(ConnectionInner {
                endpoint,
                http: RwLock::new(Some(http)),
            }),
        };

        let health: HealthResponse = conn.get_json(&["health"]).await.map_err(|e| {
            StorageError::connection(format!("handshake with {} failed: {}", conn.endpoint(), e))
        })?;
        if health.service != WIDE_COLUMN_SERVICE {
            return Err(StorageError::connection(format!(
                "{} is a {} service, expected {}",
                conn.endpoint(),
                health.service,
                WIDE_COLUMN_SERVICE
            )));
        }

        debug!(endpoint = %conn.endpoint(), "Connected to wide-column store");
        Ok(conn)
    }

    /// Endpoint this connection talks to
    pub fn endpoint(&self) -> &Url {
        &self.inner.endpoint
    }

    /// Close the connection. Returns `false` if it was already closed.
    pub fn close(&self) -> bool {
        let closed = self
            .inner
            .http
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .is_some();
        if closed {
            debug!(endpoint = %self.endpoint(), "Closed wide-column connection");
        }
        closed
    }

    /// Whether [`close`](Self::close) has been called
    pub fn is_closed(&self) -> bool {
        self.inner
            .http
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }

    fn client(&self) -> StorageResult<reqwest::Client> {
        self.inner
            .http
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or_else(|| StorageError::connection(format!("connection to {} is closed", self.endpoint())))
    }

    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.inner.endpoint.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<&B>,
    ) -> StorageResult<reqwest::Response> {
        let mut request = self.client()?.request(method, self.url(segments));
        if let Some(body) = body {
            request = request.json(body);
        }
        check(request.send().await?).await
    }

    async fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> StorageResult<T> {
        let response = self.send::<()>(Method::GET, segments, None).await?;
        Ok(response.json().await?)
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> StorageResult<T> {
        let response = self.send(Method::POST, segments, Some(body)).await?;
        Ok(response.json().await?)
    }
}

/// Map an error status to a typed error, passing successes through
async fn check(response: reqwest::Response) -> StorageResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorResponse>(&text)
        .map(|e| e.error)
        .unwrap_or(text);
    Err(match status {
        StatusCode::NOT_FOUND => StorageError::NotFound(message),
        StatusCode::CONFLICT => StorageError::AlreadyExists(message),
        StatusCode::BAD_REQUEST => StorageError::InvalidKey(message),
        _ => StorageError::backend(format!("{}: {}", status, message)),
    })
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("endpoint", &self.inner.endpoint.as_str())
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Table administration over a [`Connection`]
#[derive(Debug, Clone)]
pub struct AdminClient {
    conn: Connection,
}

impl AdminClient {
    /// Administrative view of `conn`
    pub fn new(conn: &Connection) -> Self {
        Self { conn: conn.clone() }
    }

    /// Create a table with the given column families
    pub async fn create_table(&self, name: &str, column_families: &[&str]) -> StorageResult<()> {
        let request = CreateTableRequest {
            name: name.to_string(),
            column_families: column_families.iter().map(|f| f.to_string()).collect(),
        };
        self.conn
            .send(Method::POST, &["tables"], Some(&request))
            .await?;
        Ok(())
    }

    /// All table names, sorted
    pub async fn list_tables(&self) -> StorageResult<Vec<String>> {
        let response: ListTablesResponse = self.conn.get_json(&["tables"]).await?;
        let mut tables = response.tables;
        tables.sort();
        Ok(tables)
    }

    /// Describe one table
    pub async fn table_info(&self, name: &str) -> StorageResult<TableInfo> {
        self.conn.get_json(&["tables", name]).await
    }

    /// Remove a table and all its rows
    pub async fn delete_table(&self, name: &str) -> StorageResult<()> {
        self.conn
            .send::<()>(Method::DELETE, &["tables", name], None)
            .await?;
        Ok(())
    }
}

/// Row reads and writes over a [`Connection`]
#[derive(Debug, Clone)]
pub struct DataClient {
    conn: Connection,
}

impl DataClient {
    /// Data view of `conn`
    pub fn new(conn: &Connection) -> Self {
        Self { conn: conn.clone() }
    }

    /// Apply `mutations` to `table` as one batch
    pub async fn mutate_rows(&self, table: &str, mutations: Vec<Mutation>) -> StorageResult<()> {
        if mutations.is_empty() {
            return Ok(());
        }
        debug!(table, count = mutations.len(), "Mutating rows");
        let request = MutateRowsRequest { mutations };
        self.conn
            .send(Method::POST, &["tables", table, "mutate"], Some(&request))
            .await?;
        Ok(())
    }

    /// Read the rows of `table` selected by `rows`, in key order
    pub async fn read_rows(&self, table: &str, rows: RowSet) -> StorageResult<Vec<Row>> {
        debug!(table, ?rows, "Reading rows");
        let response: ReadRowsResponse = self
            .conn
            .post_json(&["tables", table, "read"], &ReadRowsRequest { rows })
            .await?;
        Ok(response.rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_dial_rejects_malformed_endpoint() {
        let err = Connection::dial("not a url").await.unwrap_err();
        assert!(matches!(err, StorageError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_dial_unreachable_is_connection_error() {
        // Port 9 (discard) is not served on loopback in test environments
        let err = Connection::dial("http://127.0.0.1:9").await.unwrap_err();
        assert!(err.is_connection(), "unexpected error: {err}");
    }
}
