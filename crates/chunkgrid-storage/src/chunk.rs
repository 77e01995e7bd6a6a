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
//! Chunks and their external keys
//!
//! A chunk is an opaque blob of encoded samples for one series over a time
//! range. It is addressed by its external key:
//!
//! ```text
//! <user>/<fingerprint>:<from>:<through>:<checksum>
//! ```
//!
//! with every number rendered as lowercase hex. Times are milliseconds since
//! the Unix epoch. The checksum covers the data, so a key fully identifies
//! the bytes stored under it.

use crate::error::{StorageError, StorageResult};
use async_trait::async_trait;
use std::fmt::Debug;

/// Checksum stored in a chunk's external key: the first four bytes of the
/// BLAKE3 digest, big-endian
pub fn checksum_of(data: &[u8]) -> u32 {
    let digest = blake3::hash(data);
    let b = digest.as_bytes();
    u32::from_be_bytes([b[0], b[1], b[2], b[3]])
}

/// A chunk of series data
///
/// A chunk with empty `data` doubles as a descriptor when asking a
/// [`ChunkClient`](crate::ChunkClient) to fetch the stored bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Tenant owning the chunk
    pub user_id: String,
    /// Series fingerprint
    pub fingerprint: u64,
    /// First sample time (ms)
    pub from: i64,
    /// Last sample time (ms)
    pub through: i64,
    /// Checksum of `data`
    pub checksum: u32,
    /// Encoded chunk bytes
    pub data: Vec<u8>,
}

impl Chunk {
    /// Create a chunk, computing the checksum from `data`
    pub fn new(
        user_id: impl Into<String>,
        fingerprint: u64,
        from: i64,
        through: i64,
        data: Vec<u8>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            fingerprint,
            from,
            through,
            checksum: checksum_of(&data),
            data,
        }
    }

    /// Parse an external key back into a descriptor (without data)
    pub fn parse_external_key(key: &str) -> StorageResult<Self> {
        let invalid = || StorageError::invalid_key(format!("malformed chunk key {:?}", key));

        let (user_id, rest) = key.rsplit_once('/').ok_or_else(invalid)?;
        if user_id.is_empty() {
            return Err(invalid());
        }

        let parts: Vec<&str> = rest.split(':').collect();
        let [fingerprint, from, through, checksum] = parts.as_slice() else {
            return Err(invalid());
        };

        let hex_u64 = |s: &str| u64::from_str_radix(s, 16).map_err(|_| invalid());
        Ok(Self {
            user_id: user_id.to_string(),
            fingerprint: hex_u64(fingerprint)?,
            from: hex_u64(from)? as i64,
            through: hex_u64(through)? as i64,
            checksum: u32::from_str_radix(checksum, 16).map_err(|_| invalid())?,
            data: Vec::new(),
        })
    }

    /// The key this chunk is stored under
    pub fn external_key(&self) -> String {
        format!(
            "{}/{:x}:{:x}:{:x}:{:x}",
            self.user_id, self.fingerprint, self.from as u64, self.through as u64, self.checksum
        )
    }

    /// Copy of this chunk without its data
    pub fn descriptor(&self) -> Self {
        Self {
            data: Vec::new(),
            ..self.clone()
        }
    }

    /// Attach fetched bytes, rejecting them if they don't match the checksum
    pub fn with_data(self, data: Vec<u8>) -> StorageResult<Self> {
        if checksum_of(&data) != self.checksum {
            return Err(StorageError::ChecksumMismatch(self.external_key()));
        }
        Ok(Self { data, ..self })
    }
}

/// Store, fetch and delete chunks
#[async_trait]
pub trait ChunkClient: Send + Sync + Debug {
    /// Store every chunk under its external key
    async fn put_chunks(&self, chunks: &[Chunk]) -> StorageResult<()>;

    /// Fetch the data for each descriptor, in input order
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if any chunk is missing and `ChecksumMismatch` if
    /// stored bytes don't match their key.
    async fn get_chunks(&self, chunks: &[Chunk]) -> StorageResult<Vec<Chunk>>;

    /// Remove the chunk stored under `external_key`
    async fn delete_chunk(&self, user_id: &str, external_key: &str) -> StorageResult<()>;

    /// Whether `err` means the chunk does not exist
    fn is_chunk_not_found_err(&self, err: &StorageError) -> bool {
        err.is_not_found()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_external_key_format() {
        let chunk = Chunk::new("user-1", 0xabc, 0x10, 0x20, b"payload".to_vec());
        let key = chunk.external_key();
        assert!(key.starts_with("user-1/abc:10:20:"));
        assert_eq!(key.split(':').count(), 4);
    }

    #[test]
    fn test_parse_external_key() {
        let chunk = Chunk::new("user-1", 42, 1_700_000_000_000, 1_700_000_060_000, vec![1, 2, 3]);
        let parsed = Chunk::parse_external_key(&chunk.external_key()).unwrap();
        assert_eq!(parsed, chunk.descriptor());
    }

    #[test]
    fn test_parse_rejects_malformed_keys() {
        for key in ["", "nouser", "/1:2:3:4", "u/1:2:3", "u/1:2:3:zz", "u/1:2:3:4:5"] {
            let err = Chunk::parse_external_key(key).unwrap_err();
            assert!(err.is_invalid_key(), "{:?} should be rejected", key);
        }
    }

    #[test]
    fn test_with_data_checks_checksum() {
        let chunk = Chunk::new("u", 1, 2, 3, b"right".to_vec());
        let descriptor = chunk.descriptor();
        assert!(descriptor.data.is_empty());

        let restored = descriptor.clone().with_data(b"right".to_vec()).unwrap();
        assert_eq!(restored, chunk);

        let err = descriptor.with_data(b"wrong".to_vec()).unwrap_err();
        assert!(matches!(err, StorageError::ChecksumMismatch(_)));
    }
}
