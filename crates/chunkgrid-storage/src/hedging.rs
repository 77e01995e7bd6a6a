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
//! Hedged requests
//!
//! A hedged read launches a duplicate attempt when the first one is slow and
//! takes whichever answers first. Hedging only reacts to latency; failed
//! attempts are not replayed here (see the retry loop in
//! [`http_object`](crate::http_object) for that).

use futures::stream::{FuturesUnordered, StreamExt};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Hedging policy
///
/// Disabled unless `at` is non-zero and `up_to` is greater than one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HedgingConfig {
    /// Delay before launching each extra attempt
    #[serde(rename = "at_ms", with = "duration_ms")]
    pub at: Duration,
    /// Maximum number of attempts, the first one included
    pub up_to: usize,
}

impl HedgingConfig {
    /// Hedge after `at`, with at most `up_to` attempts in total
    pub fn new(at: Duration, up_to: usize) -> Self {
        Self { at, up_to }
    }

    /// Whether extra attempts will ever be launched
    pub fn is_enabled(&self) -> bool {
        !self.at.is_zero() && self.up_to > 1
    }

    /// Run `attempt`, launching a new copy every `at` until one succeeds or
    /// `up_to` are running
    ///
    /// The first success is returned and the remaining attempts are dropped.
    /// If every launched attempt fails, the last error is returned.
    pub async fn execute<T, E, F, Fut>(&self, mut attempt: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if !self.is_enabled() {
            return attempt().await;
        }

        let mut in_flight = FuturesUnordered::new();
        in_flight.push(attempt());
        let mut launched = 1;
        let mut next_hedge = Instant::now() + self.at;

        loop {
            tokio::select! {
                Some(result) = in_flight.next() => match result {
                    Ok(value) => return Ok(value),
                    Err(err) if in_flight.is_empty() => return Err(err),
                    Err(_) => debug!(remaining = in_flight.len(), "hedged attempt failed"),
                },
                _ = tokio::time::sleep_until(next_hedge), if launched < self.up_to => {
                    debug!(attempt = launched + 1, "launching hedged attempt");
                    in_flight.push(attempt());
                    launched += 1;
                    next_hedge += self.at;
                },
                else => return attempt().await,
            }
        }
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        let ms = u64::try_from(value.as_millis()).unwrap_or(u64::MAX);
        serializer.serialize_u64(ms)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
