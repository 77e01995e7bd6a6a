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
//! Emulator error types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chunkgrid_protocol::ErrorResponse;
use std::io;
use thiserror::Error;

/// Result type alias for emulator operations
pub type EmulatorResult<T> = Result<T, EmulatorError>;

/// Errors raised by the emulators, both in-process and over HTTP
#[derive(Error, Debug)]
pub enum EmulatorError {
    /// The listener could not be bound
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// Requested address
        addr: String,
        /// Underlying socket error
        #[source]
        source: io::Error,
    },

    /// Table, bucket or object does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// Table or bucket already exists
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// Malformed name or request
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl EmulatorError {
    /// Create a NotFound error
    pub fn not_found<S: Into<String>>(what: S) -> Self {
        EmulatorError::NotFound(what.into())
    }

    /// Create an InvalidArgument error
    pub fn invalid<S: Into<String>>(msg: S) -> Self {
        EmulatorError::InvalidArgument(msg.into())
    }

    /// HTTP status this error is reported with
    pub fn status(&self) -> StatusCode {
        match self {
            EmulatorError::Bind { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            EmulatorError::NotFound(_) => StatusCode::NOT_FOUND,
            EmulatorError::AlreadyExists(_) => StatusCode::CONFLICT,
            EmulatorError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for EmulatorError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorResponse {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            EmulatorError::not_found("table t").status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            EmulatorError::AlreadyExists("bucket b".into()).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(EmulatorError::invalid("x").status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_bind_error_message() {
        let err = EmulatorError::Bind {
            addr: "127.0.0.1:1".to_string(),
            source: io::Error::new(io::ErrorKind::AddrInUse, "in use"),
        };
        assert!(err.to_string().contains("127.0.0.1:1"));
    }
}
