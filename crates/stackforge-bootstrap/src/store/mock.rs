// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Mock store for testing.
//!
//! An in-memory catalog that simulates a target service without running
//! containers. Failures and readiness delays are scripted up front, and
//! every call is recorded so tests can assert what was (and was not) done.

use async_trait::async_trait;
use std::collections::HashSet;
use std::time::Duration;
use tokio::sync::Mutex;

use super::traits::*;

/// A recorded call against the mock store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    /// `probe()` was called.
    Probe,
    /// `exists(name)` was called.
    Exists(String),
    /// `create(name)` was called.
    Create(String),
}

#[derive(Debug, Default)]
struct MockState {
    catalog: Vec<String>,
    probes: u32,
    calls: Vec<StoreCall>,
}

/// Mock store for testing.
pub struct MockStore {
    state: Mutex<MockState>,
    /// Number of failed probes before the store reports ready.
    /// `None` means the store never becomes ready.
    pub ready_after: Option<u32>,
    /// Simulated latency of each probe.
    pub probe_latency: Duration,
    /// Names whose `create` fails.
    pub failing_creates: HashSet<String>,
    /// Names whose `exists` query fails.
    pub failing_queries: HashSet<String>,
}

impl Default for MockStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MockStore {
    /// Create an empty mock store that is ready immediately.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState::default()),
            ready_after: Some(0),
            probe_latency: Duration::ZERO,
            failing_creates: HashSet::new(),
            failing_queries: HashSet::new(),
        }
    }

    /// Create a mock store whose probe never succeeds.
    pub fn never_ready() -> Self {
        Self {
            ready_after: None,
            ..Self::new()
        }
    }

    /// Create a mock store that becomes ready after `failures` failed probes.
    pub fn ready_after(failures: u32) -> Self {
        Self {
            ready_after: Some(failures),
            ..Self::new()
        }
    }

    /// Delay every probe by `latency`.
    pub fn with_probe_latency(mut self, latency: Duration) -> Self {
        self.probe_latency = latency;
        self
    }

    /// Seed the catalog with resources that already exist.
    pub fn with_existing<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.state
            .get_mut()
            .catalog
            .extend(names.into_iter().map(Into::into));
        self
    }

    /// Make `create` fail for these names.
    pub fn with_failing_creates<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.failing_creates
            .extend(names.into_iter().map(Into::into));
        self
    }

    /// Make `exists` fail for these names.
    pub fn with_failing_queries<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.failing_queries
            .extend(names.into_iter().map(Into::into));
        self
    }

    /// All calls made so far, in order.
    pub async fn calls(&self) -> Vec<StoreCall> {
        self.state.lock().await.calls.clone()
    }

    /// Names passed to `create`, in order.
    pub async fn create_calls(&self) -> Vec<String> {
        self.state
            .lock()
            .await
            .calls
            .iter()
            .filter_map(|call| match call {
                StoreCall::Create(name) => Some(name.clone()),
                _ => None,
            })
            .collect()
    }

    /// Number of probes issued so far.
    pub async fn probe_count(&self) -> u32 {
        self.state.lock().await.probes
    }

    /// Check the catalog directly, without recording a call.
    pub async fn contains(&self, name: &str) -> bool {
        self.state.lock().await.catalog.iter().any(|r| r == name)
    }

    /// Forget recorded calls, keeping the catalog.
    pub async fn clear_calls(&self) {
        self.state.lock().await.calls.clear();
    }
}

#[async_trait]
impl ResourceStore for MockStore {
    fn store_type(&self) -> &'static str {
        "mock"
    }

    async fn probe(&self) -> Result<()> {
        if !self.probe_latency.is_zero() {
            tokio::time::sleep(self.probe_latency).await;
        }

        let mut state = self.state.lock().await;
        state.calls.push(StoreCall::Probe);
        let attempt = state.probes;
        state.probes += 1;

        match self.ready_after {
            Some(failures) if attempt >= failures => Ok(()),
            _ => Err(StoreError::NotReady("Mock not ready".to_string())),
        }
    }

    async fn exists(&self, name: &str) -> Result<bool> {
        let mut state = self.state.lock().await;
        state.calls.push(StoreCall::Exists(name.to_string()));

        if self.failing_queries.contains(name) {
            return Err(StoreError::Other("Mock query failure".to_string()));
        }
        Ok(state.catalog.iter().any(|r| r == name))
    }

    async fn create(&self, name: &str) -> Result<()> {
        let mut state = self.state.lock().await;
        state.calls.push(StoreCall::Create(name.to_string()));

        if self.failing_creates.contains(name) {
            return Err(StoreError::ExitCode {
                exit_code: 1,
                stderr: "Mock create failure".to_string(),
            });
        }
        if state.catalog.iter().any(|r| r == name) {
            return Err(StoreError::ExitCode {
                exit_code: 1,
                stderr: format!("database \"{}\" already exists", name),
            });
        }
        state.catalog.push(name.to_string());
        Ok(())
    }
}
