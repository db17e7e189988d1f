// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Readiness gate for the target service.
//!
//! Postgres starts asynchronously next to the rest of the stack, so nothing
//! may be provisioned until it answers a probe. The gate probes at a fixed
//! interval and gives up once `max_wait` has elapsed:
//!
//! ```text
//!   Waiting(elapsed) ──probe ok──▶ Ready
//!        │
//!        └──elapsed >= max_wait──▶ TimedOut
//! ```
//!
//! A probe that succeeds on the first attempt returns without sleeping.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, error, info};

use crate::config::DEFAULT_MAX_WAIT_SECS;
use crate::error::{Error, Result};
use crate::store::ResourceStore;

/// Configuration for the readiness gate.
#[derive(Debug, Clone)]
pub struct ReadinessConfig {
    /// Upper bound on the total wait.
    pub max_wait: Duration,
    /// Delay between probe attempts.
    pub poll_interval: Duration,
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            max_wait: Duration::from_secs(DEFAULT_MAX_WAIT_SECS),
            poll_interval: Duration::from_secs(1),
        }
    }
}

/// State of the gate after a probe attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadinessState {
    /// Probe failed, time remains.
    Waiting {
        /// Time since the gate started.
        elapsed: Duration,
    },
    /// Probe succeeded.
    Ready {
        /// Time since the gate started.
        elapsed: Duration,
    },
    /// Probe failed and the bound was reached.
    TimedOut {
        /// Time since the gate started.
        elapsed: Duration,
    },
}

impl ReadinessState {
    /// Returns true once the gate has finished.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ReadinessState::Waiting { .. })
    }
}

/// Bounded poll of a store's readiness probe.
pub struct ReadinessGate {
    store: Arc<dyn ResourceStore>,
    config: ReadinessConfig,
}

impl ReadinessGate {
    /// Create a gate over the given store.
    pub fn new(store: Arc<dyn ResourceStore>, config: ReadinessConfig) -> Self {
        Self { store, config }
    }

    /// Block until the store accepts commands.
    ///
    /// Returns the time it took on success, or [`Error::ReadinessTimeout`]
    /// once `max_wait` has elapsed without a successful probe.
    pub async fn wait(&self) -> Result<Duration> {
        let start = Instant::now();

        info!(
            store_type = self.store.store_type(),
            max_wait_secs = self.config.max_wait.as_secs(),
            "Waiting for service to accept commands"
        );

        loop {
            match self.attempt(start).await {
                ReadinessState::Ready { elapsed } => {
                    info!(elapsed_secs = elapsed.as_secs(), "Service is ready");
                    return Ok(elapsed);
                }
                ReadinessState::TimedOut { elapsed } => {
                    error!(
                        elapsed_secs = elapsed.as_secs(),
                        max_wait_secs = self.config.max_wait.as_secs(),
                        "Service did not become ready in time"
                    );
                    return Err(Error::ReadinessTimeout { waited: elapsed });
                }
                ReadinessState::Waiting { elapsed } => {
                    info!(
                        elapsed_secs = elapsed.as_secs(),
                        max_wait_secs = self.config.max_wait.as_secs(),
                        "Service not ready yet"
                    );
                    let remaining = self.config.max_wait.saturating_sub(elapsed);
                    tokio::time::sleep(self.config.poll_interval.min(remaining)).await;
                }
            }
        }
    }

    /// Probe once and classify the result.
    async fn attempt(&self, start: Instant) -> ReadinessState {
        let probe = self.store.probe().await;
        let elapsed = start.elapsed();

        match probe {
            Ok(()) => ReadinessState::Ready { elapsed },
            Err(e) => {
                debug!(error = %e, "Readiness probe failed");
                if elapsed >= self.config.max_wait {
                    ReadinessState::TimedOut { elapsed }
                } else {
                    ReadinessState::Waiting { elapsed }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ReadinessConfig::default();
        assert_eq!(config.max_wait, Duration::from_secs(60));
        assert_eq!(config.poll_interval, Duration::from_secs(1));
    }

    #[test]
    fn test_terminal_states() {
        let elapsed = Duration::from_secs(3);
        assert!(!ReadinessState::Waiting { elapsed }.is_terminal());
        assert!(ReadinessState::Ready { elapsed }.is_terminal());
        assert!(ReadinessState::TimedOut { elapsed }.is_terminal());
    }
}
