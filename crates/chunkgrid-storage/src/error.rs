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
//! Storage error types and utilities

use std::io;
use thiserror::Error;

/// Result type alias for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StorageError {
    /// Object, chunk, row or table not found in storage
    #[error("object not found: {0}")]
    NotFound(String),

    /// Table or bucket already exists
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Invalid key format (empty, unparsable external key, etc.)
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// Could not reach the backend, or the backend is not what we expected
    #[error("connection error: {0}")]
    Connection(String),

    /// Storage backend rejected the request or answered unexpectedly
    #[error("storage backend error: {0}")]
    Backend(String),

    /// Fetched chunk data does not match the checksum in its key
    #[error("checksum mismatch for chunk {0}")]
    ChecksumMismatch(String),

    /// Requested client combination cannot be built
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Operation timed out
    #[error("operation timed out: {0}")]
    Timeout(String),

    /// Transparent error delegation for wrapped error types
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StorageError {
    /// Create a NotFound error with the given key
    pub fn not_found<S: Into<String>>(key: S) -> Self {
        StorageError::NotFound(key.into())
    }

    /// Create an InvalidKey error with context
    pub fn invalid_key<S: Into<String>>(msg: S) -> Self {
        StorageError::InvalidKey(msg.into())
    }

    /// Create a Connection error with context
    pub fn connection<S: Into<String>>(msg: S) -> Self {
        StorageError::Connection(msg.into())
    }

    /// Create a Backend error with context
    pub fn backend<S: Into<String>>(msg: S) -> Self {
        StorageError::Backend(msg.into())
    }

    /// Create a Configuration error with context
    pub fn configuration<S: Into<String>>(msg: S) -> Self {
        StorageError::Configuration(msg.into())
    }

    /// Recover a typed error from an `anyhow::Error` produced by a
    /// [`StorageBackend`](crate::StorageBackend)
    ///
    /// Backends either wrap a `StorageError` directly or follow the
    /// "object not found" message convention.
    pub fn from_backend(error: anyhow::Error) -> Self {
        match error.downcast::<StorageError>() {
            Ok(typed) => typed,
            Err(error) => {
                let message = error.to_string();
                if message.contains("not found") {
                    StorageError::NotFound(message)
                } else {
                    StorageError::Other(error)
                }
            }
        }
    }

    /// Check if this is a NotFound error
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound(_))
    }

    /// Check if this is an AlreadyExists error
    pub fn is_already_exists(&self) -> bool {
        matches!(self, StorageError::AlreadyExists(_))
    }

    /// Check if this is an InvalidKey error
    pub fn is_invalid_key(&self) -> bool {
        matches!(self, StorageError::InvalidKey(_))
    }

    /// Check if this is a Connection error
    pub fn is_connection(&self) -> bool {
        matches!(self, StorageError::Connection(_))
    }
}

impl From<reqwest::Error> for StorageError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            StorageError::Timeout(err.to_string())
        } else if err.is_connect() || err.is_request() {
            StorageError::Connection(err.to_string())
        } else {
            StorageError::Backend(err.to_string())
        }
    }
}
