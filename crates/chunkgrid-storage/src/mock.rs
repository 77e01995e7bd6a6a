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
//! In-memory storage backend for testing
//!
//! [`MockBackend`] keeps objects in an `Arc<RwLock<BTreeMap>>`, so clones share
//! state and listing comes back sorted. Writes and reads can be made to fail
//! on demand to exercise error paths of [`ObjectClient`](crate::ObjectClient).

use crate::StorageBackend;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct Inner {
    store: RwLock<BTreeMap<String, Vec<u8>>>,
    fail_puts: AtomicBool,
    fail_gets: AtomicBool,
    gets: AtomicUsize,
}

/// In-memory mock storage backend
#[derive(Clone, Default)]
pub struct MockBackend {
    inner: Arc<Inner>,
}

impl MockBackend {
    /// Create a new empty backend
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored objects
    pub async fn len(&self) -> usize {
        self.inner.store.read().await.len()
    }

    /// Whether nothing is stored
    pub async fn is_empty(&self) -> bool {
        self.inner.store.read().await.is_empty()
    }

    /// Overwrite an object's bytes directly, bypassing the trait
    pub async fn corrupt(&self, key: &str, data: &[u8]) {
        self.inner
            .store
            .write()
            .await
            .insert(key.to_string(), data.to_vec());
    }

    /// Make every subsequent `put` fail
    pub fn fail_puts(&self, fail: bool) {
        self.inner.fail_puts.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent `get` fail with a transient error
    pub fn fail_gets(&self, fail: bool) {
        self.inner.fail_gets.store(fail, Ordering::SeqCst);
    }

    /// Number of `get` calls served so far, failed ones included
    pub fn get_count(&self) -> usize {
        self.inner.gets.load(Ordering::SeqCst)
    }
}

impl fmt::Debug for MockBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockBackend").finish()
    }
}

#[async_trait]
impl StorageBackend for MockBackend {
    async fn get(&self, key: &str) -> anyhow::Result<Vec<u8>> {
        if key.is_empty() {
            return Err(anyhow::anyhow!("key cannot be empty"));
        }
        self.inner.gets.fetch_add(1, Ordering::SeqCst);
        if self.inner.fail_gets.load(Ordering::SeqCst) {
            return Err(anyhow::anyhow!("injected read failure for {}", key));
        }

        let store = self.inner.store.read().await;
        store
            .get(key)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("object not found: {}", key))
    }

    async fn put(&self, key: &str, data: &[u8]) -> anyhow::Result<()> {
        if key.is_empty() {
            return Err(anyhow::anyhow!("key cannot be empty"));
        }
        if self.inner.fail_puts.load(Ordering::SeqCst) {
            return Err(anyhow::anyhow!("injected write failure for {}", key));
        }

        let mut store = self.inner.store.write().await;
        store.insert(key.to_string(), data.to_vec());
        Ok(())
    }

    async fn exists(&self, key: &str) -> anyhow::Result<bool> {
        if key.is_empty() {
            return Err(anyhow::anyhow!("key cannot be empty"));
        }

        let store = self.inner.store.read().await;
        Ok(store.contains_key(key))
    }

    async fn delete(&self, key: &str) -> anyhow::Result<()> {
        if key.is_empty() {
            return Err(anyhow::anyhow!("key cannot be empty"));
        }

        let mut store = self.inner.store.write().await;
        store.remove(key);
        Ok(())
    }

    async fn list_objects(&self, prefix: &str) -> anyhow::Result<Vec<String>> {
        let store = self.inner.store.read().await;
        Ok(store
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }
}
