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
//! Listener lifecycle shared by both emulators

use crate::error::{EmulatorError, EmulatorResult};
use axum::Router;
use std::fmt;
use std::net::SocketAddr;
use std::sync::{Mutex, PoisonError};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

struct Running {
    shutdown_tx: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

/// A running axum server bound to a local address
///
/// Closing sends the graceful-shutdown signal and stops the accept loop.
/// `close` is idempotent and also runs on drop.
pub struct ServerHandle {
    kind: &'static str,
    addr: SocketAddr,
    running: Mutex<Option<Running>>,
}

impl ServerHandle {
    /// Bind `addr` and serve `router` on a background task
    ///
    /// Must be called from within a tokio runtime.
    pub async fn spawn(kind: &'static str, addr: &str, router: Router) -> EmulatorResult<Self> {
        let bind_err = |source| EmulatorError::Bind {
            addr: addr.to_string(),
            source,
        };
        let listener = TcpListener::bind(addr).await.map_err(bind_err)?;
        let local = listener.local_addr().map_err(bind_err)?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            let result = axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await;
            if let Err(e) = result {
                warn!(kind, error = %e, "Emulator server exited with error");
            }
        });

        debug!(kind, addr = %local, "Emulator listening");

        Ok(Self {
            kind,
            addr: local,
            running: Mutex::new(Some(Running { shutdown_tx, task })),
        })
    }

    /// Bound socket address (with the real port when bound to port 0)
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Base URL, e.g. `http://127.0.0.1:41234`
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Whether the accept loop is still alive
    pub fn is_running(&self) -> bool {
        self.running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|r| !r.task.is_finished())
    }

    /// Stop serving. Returns `false` if the server was already closed.
    pub fn close(&self) -> bool {
        let running = self
            .running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        match running {
            Some(Running { shutdown_tx, task }) => {
                let _ = shutdown_tx.send(());
                task.abort();
                debug!(kind = self.kind, addr = %self.addr, "Emulator stopped");
                true
            }
            None => false,
        }
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for ServerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerHandle")
            .field("kind", &self.kind)
            .field("addr", &self.addr)
            .field("running", &self.is_running())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::get;

    fn hello_router() -> Router {
        Router::new().route("/", get(|| async { "hello" }))
    }

    #[tokio::test]
    async fn test_spawn_on_ephemeral_port() {
        let server = ServerHandle::spawn("test", "127.0.0.1:0", hello_router())
            .await
            .unwrap();
        assert_ne!(server.addr().port(), 0);
        assert!(server.url().starts_with("http://127.0.0.1:"));
        assert!(server.is_running());
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let server = ServerHandle::spawn("test", "127.0.0.1:0", hello_router())
            .await
            .unwrap();
        assert!(server.close());
        assert!(!server.close());
        assert!(!server.is_running());
    }

    #[tokio::test]
    async fn test_bind_conflict_reports_bind_error() {
        let first = ServerHandle::spawn("test", "127.0.0.1:0", hello_router())
            .await
            .unwrap();
        let taken = first.addr().to_string();

        let err = ServerHandle::spawn("test", &taken, hello_router())
            .await
            .unwrap_err();
        assert!(matches!(err, EmulatorError::Bind { .. }));
    }

    #[tokio::test]
    async fn test_close_releases_port() {
        let server = ServerHandle::spawn("test", "127.0.0.1:0", hello_router())
            .await
            .unwrap();
        let addr = server.addr();
        server.close();

        // The listener is dropped once the aborted task is polled again
        let mut rebound = false;
        for _ in 0..50 {
            if TcpListener::bind(addr).await.is_ok() {
                rebound = true;
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert!(rebound, "port {} still held after close", addr);
    }
}
