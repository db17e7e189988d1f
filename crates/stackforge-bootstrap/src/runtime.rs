// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Embeddable bootstrap runtime.
//!
//! This module provides [`Bootstrap`], which runs the readiness gate and
//! then the provisioner. It never exits the process or installs a log
//! subscriber, so an installer can call it directly:
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use stackforge_bootstrap::runtime::Bootstrap;
//! use stackforge_bootstrap::store::DockerPostgresStore;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = Arc::new(DockerPostgresStore::new("docker", "postgres", "n8n"));
//!
//!     let mut bootstrap = Bootstrap::builder()
//!         .store(store)
//!         .resources(["n8n", "langfuse"])
//!         .build()?;
//!
//!     let summary = bootstrap.run().await?;
//!     if !summary.success {
//!         anyhow::bail!("{} databases failed", summary.failed);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Run Phases
//!
//! ```text
//! NotStarted ──▶ AwaitingReadiness ──timeout──▶ ReadinessFailed
//!                        │
//!                      ready
//!                        ▼
//!              ProvisioningResources ──▶ Completed
//! ```
//!
//! `ProvisioningResources` always reaches `Completed`; individual database
//! failures only show up in the summary.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::provisioner::{PlannedResource, ProvisionSummary, Provisioner, QueryPolicy};
use crate::readiness::{ReadinessConfig, ReadinessGate};
use crate::store::ResourceStore;

/// Phase of a bootstrap run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    /// `run` has not been called.
    NotStarted,
    /// Waiting on the readiness gate.
    AwaitingReadiness,
    /// The gate timed out; nothing was provisioned.
    ReadinessFailed,
    /// Iterating the database list.
    ProvisioningResources,
    /// Every database has been processed.
    Completed,
}

/// Builder for creating a [`Bootstrap`].
pub struct BootstrapBuilder {
    store: Option<Arc<dyn ResourceStore>>,
    resources: Vec<String>,
    readiness: ReadinessConfig,
    query_policy: QueryPolicy,
}

impl Default for BootstrapBuilder {
    fn default() -> Self {
        Self {
            store: None,
            resources: Vec::new(),
            readiness: ReadinessConfig::default(),
            query_policy: QueryPolicy::default(),
        }
    }
}

impl BootstrapBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply the database list, wait bound and query policy from `config`.
    pub fn config(self, config: &Config) -> Self {
        let policy = if config.strict_query {
            QueryPolicy::Strict
        } else {
            QueryPolicy::Lenient
        };
        self.resources(config.databases.iter().cloned())
            .max_wait(config.max_wait)
            .query_policy(policy)
    }

    /// Set the target store (required).
    pub fn store(mut self, store: Arc<dyn ResourceStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the databases to ensure, in processing order.
    pub fn resources<I, S>(mut self, resources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.resources = resources.into_iter().map(Into::into).collect();
        self
    }

    /// Set the readiness bound.
    ///
    /// Default: 60 seconds
    pub fn max_wait(mut self, max_wait: Duration) -> Self {
        self.readiness.max_wait = max_wait;
        self
    }

    /// Set the delay between readiness probes.
    ///
    /// Default: 1 second
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.readiness.poll_interval = interval;
        self
    }

    /// Set the policy for failed existence queries.
    ///
    /// Default: [`QueryPolicy::Lenient`]
    pub fn query_policy(mut self, policy: QueryPolicy) -> Self {
        self.query_policy = policy;
        self
    }

    /// Build the runtime.
    ///
    /// Returns an error if required fields are missing.
    pub fn build(self) -> Result<Bootstrap> {
        let store = self
            .store
            .ok_or_else(|| Error::InvalidRequest("store is required".to_string()))?;

        if self.readiness.poll_interval.is_zero() {
            return Err(Error::InvalidRequest(
                "poll_interval must be greater than zero".to_string(),
            ));
        }

        Ok(Bootstrap {
            gate: ReadinessGate::new(store.clone(), self.readiness),
            provisioner: Provisioner::new(store).with_policy(self.query_policy),
            resources: self.resources,
            phase: RunPhase::NotStarted,
        })
    }
}

/// Readiness gate plus provisioner over one store and database list.
pub struct Bootstrap {
    gate: ReadinessGate,
    provisioner: Provisioner,
    resources: Vec<String>,
    phase: RunPhase,
}

impl Bootstrap {
    /// Create a new builder.
    pub fn builder() -> BootstrapBuilder {
        BootstrapBuilder::new()
    }

    /// Phase reached by the most recent run.
    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    /// Databases this runtime ensures.
    pub fn resources(&self) -> &[String] {
        &self.resources
    }

    /// Run only the readiness gate.
    pub async fn wait_ready(&self) -> Result<Duration> {
        self.gate.wait().await
    }

    /// Wait for the store, then ensure every database.
    ///
    /// Returns [`Error::ReadinessTimeout`] without touching any database if
    /// the store never became ready. Otherwise returns the summary; check
    /// `summary.success` for per-database failures.
    pub async fn run(&mut self) -> Result<ProvisionSummary> {
        self.transition(RunPhase::AwaitingReadiness);

        if let Err(e) = self.gate.wait().await {
            self.transition(RunPhase::ReadinessFailed);
            return Err(e);
        }

        self.transition(RunPhase::ProvisioningResources);
        let summary = self.provisioner.provision_all(&self.resources).await;
        self.transition(RunPhase::Completed);

        info!(
            created = summary.created,
            existing = summary.existing,
            failed = summary.failed,
            success = summary.success,
            "Bootstrap finished"
        );

        Ok(summary)
    }

    /// Wait for the store, then report what `run` would do.
    pub async fn plan(&self) -> Result<Vec<PlannedResource>> {
        self.gate.wait().await?;
        Ok(self.provisioner.plan_all(&self.resources).await)
    }

    fn transition(&mut self, phase: RunPhase) {
        debug!(from = ?self.phase, to = ?phase, "Bootstrap phase");
        self.phase = phase;
    }
}
