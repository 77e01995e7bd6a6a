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
//! Wide-column database emulator
//!
//! Keeps every table in memory behind a tokio `RwLock`. Rows are stored in a
//! `BTreeMap` so prefix and range reads come back in key order, and cells are
//! keyed by `(family, qualifier)` so they come back in column order.
//!
//! Like the real service, writes are rejected for tables or column families
//! that were never created.

use crate::error::{EmulatorError, EmulatorResult};
use crate::server::ServerHandle;
use axum::extract::{DefaultBodyLimit, Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chunkgrid_protocol::{
    Cell, CreateTableRequest, HealthResponse, ListTablesResponse, MutateRowsRequest, Mutation,
    ReadRowsRequest, ReadRowsResponse, Row, RowSet, TableInfo, WIDE_COLUMN_SERVICE,
};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::ops::Bound;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

type Cells = BTreeMap<(String, String), Vec<u8>>;

#[derive(Debug, Default)]
struct Table {
    families: BTreeSet<String>,
    rows: BTreeMap<String, Cells>,
}

#[derive(Debug, Default)]
struct WideColumnState {
    tables: RwLock<BTreeMap<String, Table>>,
}

/// A running wide-column emulator
///
/// Cloning shares the same server; the listener stops when [`close`](Self::close)
/// is called or the last clone is dropped.
#[derive(Clone)]
pub struct WideColumnServer {
    server: Arc<ServerHandle>,
    state: Arc<WideColumnState>,
}

impl WideColumnServer {
    /// Start a fresh, empty emulator listening on `addr`
    pub async fn start(addr: &str) -> EmulatorResult<Self> {
        let state = Arc::new(WideColumnState::default());
        let server = ServerHandle::spawn("widecolumn", addr, router(Arc::clone(&state))).await?;
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

    /// Names of all tables, sorted
    pub async fn table_names(&self) -> Vec<String> {
        self.state.tables.read().await.keys().cloned().collect()
    }

    /// Number of rows currently stored in `table` (0 if it does not exist)
    pub async fn row_count(&self, table: &str) -> usize {
        self.state
            .tables
            .read()
            .await
            .get(table)
            .map_or(0, |t| t.rows.len())
    }
}

impl fmt::Debug for WideColumnServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WideColumnServer")
            .field("addr", &self.server.addr())
            .finish()
    }
}

fn router(state: Arc<WideColumnState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/tables", get(list_tables).post(create_table))
        .route("/tables/{name}", get(get_table).delete(delete_table))
        .route("/tables/{name}/mutate", post(mutate_rows))
        .route("/tables/{name}/read", post(read_rows))
        .layer(DefaultBodyLimit::max(64 * 1024 * 1024))
        .with_state(state)
}

fn validate_table_name(name: &str) -> EmulatorResult<()> {
    if name.is_empty() {
        return Err(EmulatorError::invalid("table name cannot be empty"));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
    {
        return Err(EmulatorError::invalid(format!(
            "table name {:?} contains invalid characters",
            name
        )));
    }
    Ok(())
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::ok(WIDE_COLUMN_SERVICE))
}

/// GET /tables
async fn list_tables(State(state): State<Arc<WideColumnState>>) -> Json<ListTablesResponse> {
    let tables = state.tables.read().await.keys().cloned().collect();
    Json(ListTablesResponse { tables })
}

/// POST /tables
async fn create_table(
    State(state): State<Arc<WideColumnState>>,
    Json(req): Json<CreateTableRequest>,
) -> EmulatorResult<StatusCode> {
    validate_table_name(&req.name)?;

    let mut tables = state.tables.write().await;
    if tables.contains_key(&req.name) {
        return Err(EmulatorError::AlreadyExists(format!("table {}", req.name)));
    }

    debug!(table = %req.name, families = ?req.column_families, "Creating table");
    tables.insert(
        req.name,
        Table {
            families: req.column_families.into_iter().collect(),
            rows: BTreeMap::new(),
        },
    );
    Ok(StatusCode::CREATED)
}

/// GET /tables/{name}
async fn get_table(
    Path(name): Path<String>,
    State(state): State<Arc<WideColumnState>>,
) -> EmulatorResult<Json<TableInfo>> {
    let tables = state.tables.read().await;
    let table = tables
        .get(&name)
        .ok_or_else(|| EmulatorError::not_found(format!("table {}", name)))?;

    Ok(Json(TableInfo {
        column_families: table.families.iter().cloned().collect(),
        name,
    }))
}

/// DELETE /tables/{name}
async fn delete_table(
    Path(name): Path<String>,
    State(state): State<Arc<WideColumnState>>,
) -> EmulatorResult<StatusCode> {
    let mut tables = state.tables.write().await;
    match tables.remove(&name) {
        Some(_) => {
            debug!(table = %name, "Deleted table");
            Ok(StatusCode::NO_CONTENT)
        }
        None => Err(EmulatorError::not_found(format!("table {}", name))),
    }
}

/// POST /tables/{name}/mutate
///
/// The whole batch is validated before anything is applied.
async fn mutate_rows(
    Path(name): Path<String>,
    State(state): State<Arc<WideColumnState>>,
    Json(req): Json<MutateRowsRequest>,
) -> EmulatorResult<StatusCode> {
    let mut tables = state.tables.write().await;
    let table = tables
        .get_mut(&name)
        .ok_or_else(|| EmulatorError::not_found(format!("table {}", name)))?;

    for mutation in &req.mutations {
        let (row_key, family) = match mutation {
            Mutation::SetCell {
                row_key, family, ..
            }
            | Mutation::DeleteCell {
                row_key, family, ..
            } => (row_key, Some(family)),
            Mutation::DeleteRow { row_key } => (row_key, None),
        };
        if row_key.is_empty() {
            return Err(EmulatorError::invalid("row key cannot be empty"));
        }
        if let Some(family) = family {
            if !table.families.contains(family) {
                return Err(EmulatorError::not_found(format!(
                    "column family {} in table {}",
                    family, name
                )));
            }
        }
    }

    let count = req.mutations.len();
    for mutation in req.mutations {
        match mutation {
            Mutation::SetCell {
                row_key,
                family,
                qualifier,
                value,
            } => {
                table
                    .rows
                    .entry(row_key)
                    .or_default()
                    .insert((family, qualifier), value);
            }
            Mutation::DeleteCell {
                row_key,
                family,
                qualifier,
            } => {
                if let Some(cells) = table.rows.get_mut(&row_key) {
                    cells.remove(&(family, qualifier));
                    if cells.is_empty() {
                        table.rows.remove(&row_key);
                    }
                }
            }
            Mutation::DeleteRow { row_key } => {
                table.rows.remove(&row_key);
            }
        }
    }

    debug!(table = %name, count, "Applied mutations");
    Ok(StatusCode::OK)
}

/// POST /tables/{name}/read
async fn read_rows(
    Path(name): Path<String>,
    State(state): State<Arc<WideColumnState>>,
    Json(req): Json<ReadRowsRequest>,
) -> EmulatorResult<Json<ReadRowsResponse>> {
    let tables = state.tables.read().await;
    let table = tables
        .get(&name)
        .ok_or_else(|| EmulatorError::not_found(format!("table {}", name)))?;

    let rows = match req.rows {
        RowSet::Keys { keys } => {
            let wanted: BTreeSet<String> = keys.into_iter().collect();
            wanted
                .into_iter()
                .filter_map(|k| table.rows.get(&k).map(|cells| to_row(&k, cells)))
                .collect()
        }
        RowSet::Prefix { prefix } => table
            .rows
            .range::<String, _>((Bound::Included(&prefix), Bound::Unbounded))
            .take_while(|(k, _)| k.starts_with(&prefix))
            .map(|(k, cells)| to_row(k, cells))
            .collect(),
        RowSet::Range { start, end } => match end {
            Some(end) if end <= start => Vec::new(),
            Some(end) => table
                .rows
                .range::<String, _>((Bound::Included(&start), Bound::Excluded(&end)))
                .map(|(k, cells)| to_row(k, cells))
                .collect(),
            None => table
                .rows
                .range::<String, _>((Bound::Included(&start), Bound::Unbounded))
                .map(|(k, cells)| to_row(k, cells))
                .collect(),
        },
    };

    Ok(Json(ReadRowsResponse { rows }))
}

fn to_row(key: &str, cells: &Cells) -> Row {
    Row {
        key: key.to_string(),
        cells: cells
            .iter()
            .map(|((family, qualifier), value)| Cell {
                family: family.clone(),
                qualifier: qualifier.clone(),
                value: value.clone(),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_name_validation() {
        assert!(validate_table_name("index_2900").is_ok());
        assert!(validate_table_name("").is_err());
        assert!(validate_table_name("bad/name").is_err());
    }

    #[tokio::test]
    async fn test_start_is_empty() {
        let server = WideColumnServer::start("127.0.0.1:0").await.unwrap();
        assert!(server.table_names().await.is_empty());
        assert_eq!(server.row_count("missing").await, 0);
        assert!(server.is_running());
        assert!(server.close());
    }

    #[tokio::test]
    async fn test_two_servers_do_not_share_state() {
        let a = WideColumnServer::start("127.0.0.1:0").await.unwrap();
        let b = WideColumnServer::start("127.0.0.1:0").await.unwrap();
        assert_ne!(a.addr(), b.addr());

        a.state.tables.write().await.insert("t".into(), Table::default());
        assert_eq!(a.table_names().await, vec!["t".to_string()]);
        assert!(b.table_names().await.is_empty());
    }
}
