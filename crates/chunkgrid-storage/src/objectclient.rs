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
//! Chunk client over a generic object store
//!
//! [`ObjectClient`] stores each chunk as one object keyed by the chunk's
//! external key. An optional key encoder rewrites keys for stores that can't
//! hold the raw key characters.

use crate::chunk::{Chunk, ChunkClient};
use crate::error::{StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use futures::future::try_join_all;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Rewrites an external key into an object key
pub type KeyEncoder = fn(&str) -> String;

/// Encode the whole external key as lowercase hex
pub fn hex_key_encoder(key: &str) -> String {
    hex::encode(key.as_bytes())
}

/// [`ChunkClient`] adapter over any [`StorageBackend`]
#[derive(Clone)]
pub struct ObjectClient {
    store: Arc<dyn StorageBackend>,
    key_encoder: Option<KeyEncoder>,
}

impl ObjectClient {
    /// Store chunks under their raw external keys
    pub fn new(store: Arc<dyn StorageBackend>) -> Self {
        Self {
            store,
            key_encoder: None,
        }
    }

    /// Rewrite every external key with `encoder` before it reaches the store
    pub fn with_key_encoder(mut self, encoder: KeyEncoder) -> Self {
        self.key_encoder = Some(encoder);
        self
    }

    /// Object key a chunk key is stored under
    pub fn object_key(&self, external_key: &str) -> String {
        match self.key_encoder {
            Some(encode) => encode(external_key),
            None => external_key.to_string(),
        }
    }

    async fn get_chunk(&self, descriptor: &Chunk) -> StorageResult<Chunk> {
        let key = self.object_key(&descriptor.external_key());
        let data = self
            .store
            .get(&key)
            .await
            .map_err(StorageError::from_backend)?;
        descriptor.descriptor().with_data(data)
    }
}

impl fmt::Debug for ObjectClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectClient")
            .field("store", &self.store)
            .field("encoded_keys", &self.key_encoder.is_some())
            .finish()
    }
}

#[async_trait]
impl ChunkClient for ObjectClient {
    async fn put_chunks(&self, chunks: &[Chunk]) -> StorageResult<()> {
        debug!(count = chunks.len(), "Putting chunks into object store");
        try_join_all(chunks.iter().map(|chunk| async move {
            let key = self.object_key(&chunk.external_key());
            self.store
                .put(&key, &chunk.data)
                .await
                .map_err(StorageError::from_backend)
        }))
        .await?;
        Ok(())
    }

    async fn get_chunks(&self, chunks: &[Chunk]) -> StorageResult<Vec<Chunk>> {
        debug!(count = chunks.len(), "Getting chunks from object store");
        try_join_all(chunks.iter().map(|chunk| self.get_chunk(chunk))).await
    }

    async fn delete_chunk(&self, user_id: &str, external_key: &str) -> StorageResult<()> {
        if external_key.is_empty() {
            return Err(StorageError::invalid_key("chunk key cannot be empty"));
        }
        debug!(user_id, external_key, "Deleting chunk from object store");
        self.store
            .delete(&self.object_key(external_key))
            .await
            .map_err(StorageError::from_backend)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockBackend;

    fn chunks() -> Vec<Chunk> {
        vec![
            Chunk::new("tenant", 1, 1_000, 2_000, b"first".to_vec()),
            Chunk::new("tenant", 2, 1_500, 2_500, b"second".to_vec()),
        ]
    }

    #[tokio::test]
    async fn test_put_get_preserves_order() {
        let backend = MockBackend::new();
        let client = ObjectClient::new(Arc::new(backend.clone()));
        let chunks = chunks();

        client.put_chunks(&chunks).await.unwrap();
        assert_eq!(backend.len().await, 2);

        let descriptors: Vec<Chunk> = chunks.iter().rev().map(Chunk::descriptor).collect();
        let fetched = client.get_chunks(&descriptors).await.unwrap();
        assert_eq!(fetched[0], chunks[1]);
        assert_eq!(fetched[1], chunks[0]);
    }

    #[tokio::test]
    async fn test_missing_chunk_is_not_found() {
        let client = ObjectClient::new(Arc::new(MockBackend::new()));
        let err = client.get_chunks(&[chunks()[0].descriptor()]).await.unwrap_err();
        assert!(client.is_chunk_not_found_err(&err));
    }

    #[tokio::test]
    async fn test_corrupted_chunk_fails_checksum() {
        let backend = MockBackend::new();
        let client = ObjectClient::new(Arc::new(backend.clone()));
        let chunk = chunks().remove(0);
        client.put_chunks(std::slice::from_ref(&chunk)).await.unwrap();

        backend.corrupt(&chunk.external_key(), b"tampered").await;
        let err = client.get_chunks(&[chunk.descriptor()]).await.unwrap_err();
        assert!(matches!(err, StorageError::ChecksumMismatch(_)));
    }

    #[tokio::test]
    async fn test_key_encoder_applies_to_all_operations() {
        let backend = MockBackend::new();
        let client = ObjectClient::new(Arc::new(backend.clone())).with_key_encoder(hex_key_encoder);
        let chunk = chunks().remove(0);
        let encoded = hex_key_encoder(&chunk.external_key());

        client.put_chunks(std::slice::from_ref(&chunk)).await.unwrap();
        assert!(backend.exists(&encoded).await.unwrap());
        assert!(!backend.exists(&chunk.external_key()).await.unwrap());

        let fetched = client.get_chunks(&[chunk.descriptor()]).await.unwrap();
        assert_eq!(fetched, vec![chunk.clone()]);

        client.delete_chunk("tenant", &chunk.external_key()).await.unwrap();
        assert!(backend.is_empty().await);
    }

    #[tokio::test]
    async fn test_put_failure_propagates() {
        let backend = MockBackend::new();
        backend.fail_puts(true);
        let client = ObjectClient::new(Arc::new(backend));
        let err = client.put_chunks(&chunks()).await.unwrap_err();
        assert!(!err.is_not_found());
    }

    #[tokio::test]
    async fn test_delete_rejects_empty_key() {
        let client = ObjectClient::new(Arc::new(MockBackend::new()));
        let err = client.delete_chunk("tenant", "").await.unwrap_err();
        assert!(err.is_invalid_key());
    }
}
