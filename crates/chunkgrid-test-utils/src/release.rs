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
//! Teardown of everything a fixture activation opened

use std::fmt;
use std::sync::{Mutex, PoisonError};
use tracing::{debug, info, warn};

type Closer = Box<dyn FnOnce() -> anyhow::Result<()> + Send>;

struct Resource {
    name: String,
    close: Closer,
}

/// Releases the resources opened by one fixture activation
///
/// Resources are registered as they are opened and closed in reverse order,
/// so connections go before the emulators they point at. Closing is
/// best-effort: a failing closer is logged at `warn` and the rest still run.
/// Closing twice is a no-op, and dropping an unreleased handle closes it.
///
/// Clients built during the activation are unusable once the handle has been
/// closed. Calling them afterwards is undefined: depending on the client, the
/// call fails or reaches a stopped emulator.
pub struct ReleaseHandle {
    fixture: String,
    resources: Mutex<Option<Vec<Resource>>>,
}

impl ReleaseHandle {
    /// Empty handle for the named fixture
    pub fn new(fixture: impl Into<String>) -> Self {
        Self {
            fixture: fixture.into(),
            resources: Mutex::new(Some(Vec::new())),
        }
    }

    /// Fixture this handle belongs to
    pub fn fixture(&self) -> &str {
        &self.fixture
    }

    /// Track a resource to close on release
    ///
    /// Registering on an already closed handle closes the resource at once.
    pub fn register<F>(&self, name: impl Into<String>, close: F)
    where
        F: FnOnce() -> anyhow::Result<()> + Send + 'static,
    {
        let resource = Resource {
            name: name.into(),
            close: Box::new(close),
        };
        let late = {
            let mut guard = self.resources.lock().unwrap_or_else(PoisonError::into_inner);
            match guard.as_mut() {
                Some(resources) => {
                    resources.push(resource);
                    None
                }
                None => Some(resource),
            }
        };
        if let Some(resource) = late {
            self.close_one(resource);
        }
    }

    /// Number of resources still open
    pub fn pending(&self) -> usize {
        self.resources
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map_or(0, Vec::len)
    }

    /// Whether [`close`](Self::close) has run
    pub fn is_closed(&self) -> bool {
        self.resources
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }

    /// Close every registered resource, newest first
    ///
    /// Returns `false` if the handle was already closed.
    pub fn close(&self) -> bool {
        let resources = self
            .resources
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        let Some(resources) = resources else {
            return false;
        };

        let count = resources.len();
        for resource in resources.into_iter().rev() {
            self.close_one(resource);
        }
        info!(fixture = %self.fixture, resources = count, "Fixture released");
        true
    }

    fn close_one(&self, resource: Resource) {
        match (resource.close)() {
            Ok(()) => debug!(fixture = %self.fixture, resource = %resource.name, "Closed"),
            Err(e) => warn!(
                fixture = %self.fixture,
                resource = %resource.name,
                error = %e,
                "Failed to close fixture resource"
            ),
        }
    }
}

impl Drop for ReleaseHandle {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for ReleaseHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReleaseHandle")
            .field("fixture", &self.fixture)
            .field("pending", &self.pending())
            .field("closed", &self.is_closed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn recorder() -> (Arc<Mutex<Vec<String>>>, impl Fn(&str) -> Closer) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&log);
        let make = move |name: &str| -> Closer {
            let sink = Arc::clone(&sink);
            let name = name.to_string();
            Box::new(move || {
                sink.lock().unwrap().push(name);
                Ok(())
            })
        };
        (log, make)
    }

    #[test]
    fn test_closes_in_reverse_order() {
        let (log, make) = recorder();
        let handle = ReleaseHandle::new("fx");
        handle.register("emulator", make("emulator"));
        handle.register("connection", make("connection"));
        assert_eq!(handle.pending(), 2);

        assert!(handle.close());
        assert_eq!(*log.lock().unwrap(), vec!["connection", "emulator"]);
        assert!(handle.is_closed());
    }

    #[test]
    fn test_close_is_idempotent() {
        let (log, make) = recorder();
        let handle = ReleaseHandle::new("fx");
        handle.register("emulator", make("emulator"));

        assert!(handle.close());
        assert!(!handle.close());
        assert_eq!(log.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_failing_closer_does_not_stop_the_rest() {
        let (log, make) = recorder();
        let handle = ReleaseHandle::new("fx");
        handle.register("first", make("first"));
        handle.register("broken", || Err(anyhow::anyhow!("already gone")));

        assert!(handle.close());
        assert_eq!(*log.lock().unwrap(), vec!["first"]);
    }

    #[test]
    fn test_drop_releases() {
        let (log, make) = recorder();
        {
            let handle = ReleaseHandle::new("fx");
            handle.register("emulator", make("emulator"));
        }
        assert_eq!(*log.lock().unwrap(), vec!["emulator"]);
    }

    #[test]
    fn test_register_after_close_closes_immediately() {
        let (log, make) = recorder();
        let handle = ReleaseHandle::new("fx");
        handle.close();
        handle.register("late", make("late"));
        assert_eq!(*log.lock().unwrap(), vec!["late"]);
        assert_eq!(handle.pending(), 0);
    }

    #[test]
    fn test_empty_handle_releases_cleanly() {
        let handle = ReleaseHandle::new("fx");
        assert!(handle.close());
        assert!(format!("{handle:?}").contains("closed: true"));
    }
}
