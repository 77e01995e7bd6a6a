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
//! Fixtures backed by the wide-column emulator
//!
//! The index and table clients always run against a wide-column emulator.
//! Chunks go either to the same emulator or, for `objectClient:true`
//! fixtures, to an object-store emulator of their own.

use crate::config::FixtureOptions;
use crate::error::{FixtureError, FixtureResult};
use crate::fixture::{Clients, Fixture};
use crate::matrix::Configuration;
use crate::release::ReleaseHandle;
use crate::testdata::default_schema_config;
use async_trait::async_trait;
use chrono::Utc;
use chunkgrid_emulator::{EmulatorResult, ObjectStoreServer, WideColumnServer};
use chunkgrid_storage::factory::{new_chunk_client, new_index_client, new_table_client};
use chunkgrid_storage::widecolumn::Connection;
use chunkgrid_storage::{
    ChunkClient, IndexClient, ObjectStoreConfig, ObjectStoreOptions, ObjectStoreSession,
    SchemaConfig, StorageError, TableClient, TableDesc,
};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info};

type Triad = (
    Arc<dyn IndexClient>,
    Arc<dyn ChunkClient>,
    Arc<dyn TableClient>,
    SchemaConfig,
);

/// Family token at the start of every fixture name
pub const FAMILY: &str = "widecolumn";

/// All wide-column fixtures with default options
pub fn fixtures() -> Vec<WideColumnFixture> {
    fixtures_with(&FixtureOptions::default())
}

/// All wide-column fixtures sharing `options`
///
/// Building the list does no I/O.
pub fn fixtures_with(options: &FixtureOptions) -> Vec<WideColumnFixture> {
    Configuration::all()
        .into_iter()
        .map(|config| WideColumnFixture::new(config, options.clone()))
        .collect()
}

/// One configuration of the wide-column family
#[derive(Debug, Clone)]
pub struct WideColumnFixture {
    name: String,
    config: Configuration,
    options: FixtureOptions,
}

impl WideColumnFixture {
    /// Fixture for `config`
    pub fn new(config: Configuration, options: FixtureOptions) -> Self {
        Self {
            name: config.name(FAMILY),
            config,
            options,
        }
    }

    /// Axis values of this fixture
    pub fn configuration(&self) -> Configuration {
        self.config
    }

    /// Harness options this fixture activates with
    pub fn options(&self) -> &FixtureOptions {
        &self.options
    }

    async fn start<T, F>(&self, kind: &str, start: F) -> FixtureResult<T>
    where
        F: Future<Output = EmulatorResult<T>>,
    {
        let timeout = self.options.startup_timeout();
        match tokio::time::timeout(timeout, start).await {
            Ok(Ok(server)) => Ok(server),
            Ok(Err(e)) => Err(FixtureError::resource_unavailable(
                &self.name,
                format!("{} emulator: {}", kind, e),
            )),
            Err(_) => Err(FixtureError::resource_unavailable(
                &self.name,
                format!("{} emulator did not start within {:?}", kind, timeout),
            )),
        }
    }

    async fn start_object_store(
        &self,
        closer: &ReleaseHandle,
    ) -> FixtureResult<Option<ObjectStoreServer>> {
        if !self.config.chunk_backend.is_object_store() {
            return Ok(None);
        }

        let server = self
            .start("object-store", ObjectStoreServer::start(&self.options.object_store_addr))
            .await?;
        let emulator = server.clone();
        closer.register("object-store emulator", move || {
            emulator.close();
            Ok(())
        });
        Ok(Some(server))
    }

    async fn object_store_options(
        &self,
        server: &ObjectStoreServer,
    ) -> FixtureResult<ObjectStoreOptions> {
        let bucket = &self.options.bucket_name;
        server
            .create_bucket(bucket)
            .await
            .map_err(|e| FixtureError::setup(&self.name, format!("bucket {}: {}", bucket, e)))?;

        let http = server.client().map_err(|e| {
            FixtureError::connection(&self.name, StorageError::connection(e.to_string()))
        })?;
        let session = ObjectStoreSession::new(http, &server.url())
            .map_err(|e| FixtureError::connection(&self.name, e))?;

        Ok(ObjectStoreOptions {
            session,
            config: ObjectStoreConfig::new(bucket.clone())
                .with_max_retries(self.options.object_store_retries),
            hedging: self.options.hedging,
        })
    }

    async fn activate(&self, closer: &ReleaseHandle) -> FixtureResult<Triad> {
        if self.config.chunk_backend.is_object_store() {
            if let Some(addr) = self.options.shared_fixed_addr() {
                return Err(FixtureError::resource_unavailable(
                    &self.name,
                    format!("both emulators would bind {}", addr),
                ));
            }
        }

        let server = self
            .start("wide-column", WideColumnServer::start(&self.options.listen_addr))
            .await?;
        let emulator = server.clone();
        closer.register("wide-column emulator", move || {
            emulator.close();
            Ok(())
        });
        let objects = self.start_object_store(closer).await?;

        let conn = Connection::dial(&server.url())
            .await
            .map_err(|e| FixtureError::connection(&self.name, e))?;
        let shared = conn.clone();
        closer.register("wide-column connection", move || {
            shared.close();
            Ok(())
        });

        let schema = default_schema_config(FAMILY);

        let object_store = match &objects {
            Some(server) => Some(self.object_store_options(server).await?),
            None => None,
        };
        let table = new_table_client(&conn);
        for name in schema.active_tables(Utc::now()) {
            table
                .create_table(TableDesc::new(name.clone()))
                .await
                .map_err(|e| FixtureError::setup(&self.name, format!("table {}: {}", name, e)))?;
        }

        let index = new_index_client(
            self.config.index_layout,
            self.config.key_distribution,
            &schema,
            &conn,
        )
        .map_err(|e| FixtureError::configuration(&self.name, e))?;
        let chunk = new_chunk_client(self.config.chunk_backend, &schema, &conn, object_store)
            .map_err(|e| FixtureError::configuration(&self.name, e))?;

        Ok((index, chunk, table, schema))
    }
}

#[async_trait]
impl Fixture for WideColumnFixture {
    fn name(&self) -> &str {
        &self.name
    }

    async fn clients(&self) -> FixtureResult<Clients> {
        debug!(fixture = %self.name, "Activating fixture");
        let closer = ReleaseHandle::new(&self.name);
        match self.activate(&closer).await {
            Ok((index, chunk, table, schema)) => {
                info!(fixture = %self.name, resources = closer.pending(), "Fixture activated");
                Ok(Clients {
                    index,
                    chunk,
                    table,
                    schema,
                    closer,
                })
            }
            Err(e) => {
                closer.close();
                Err(e)
            }
        }
    }
}
