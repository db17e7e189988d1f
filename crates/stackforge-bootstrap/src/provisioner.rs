// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Idempotent database provisioning.
//!
//! Each database is checked and created independently. A database that
//! already exists is left alone, and a failure on one database never stops
//! the others from being attempted. Outcomes are folded into a
//! [`ProvisionSummary`] whose `success` flag is false iff any database failed.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::time::Instant;
use tracing::{error, info, warn};

use crate::error::Result;
use crate::store::ResourceStore;

/// Result of ensuring a single database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProvisionOutcome {
    /// The database was missing and has been created.
    Created,
    /// The database was already present; nothing was changed.
    AlreadyExists,
    /// The database could not be ensured.
    Failed,
}

/// How to treat an existence query that errors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum QueryPolicy {
    /// Treat the database as absent and attempt creation.
    #[default]
    Lenient,
    /// Mark the database failed without attempting creation.
    Strict,
}

/// Outcome for one named database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceReport {
    /// Database name as given.
    pub name: String,
    /// What happened to it.
    pub outcome: ProvisionOutcome,
}

/// Aggregate result of a provisioning run.
#[derive(Debug, Clone, Serialize)]
pub struct ProvisionSummary {
    /// Databases created by this run.
    pub created: usize,
    /// Databases that already existed.
    pub existing: usize,
    /// Databases that could not be ensured.
    pub failed: usize,
    /// True iff `failed == 0`.
    pub success: bool,
    /// Per-database outcomes in processing order.
    pub resources: Vec<ResourceReport>,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// Run duration in milliseconds.
    pub duration_ms: u64,
}

impl ProvisionSummary {
    /// Start an empty summary.
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            created: 0,
            existing: 0,
            failed: 0,
            success: true,
            resources: Vec::new(),
            started_at,
            duration_ms: 0,
        }
    }

    /// Fold one outcome into the summary.
    pub fn record(mut self, name: &str, outcome: ProvisionOutcome) -> Self {
        match outcome {
            ProvisionOutcome::Created => self.created += 1,
            ProvisionOutcome::AlreadyExists => self.existing += 1,
            ProvisionOutcome::Failed => self.failed += 1,
        }
        self.success = self.failed == 0;
        self.resources.push(ResourceReport {
            name: name.to_string(),
            outcome,
        });
        self
    }

    /// Total number of databases processed.
    pub fn total(&self) -> usize {
        self.created + self.existing + self.failed
    }

    /// Outcome recorded for `name`, if it was processed.
    pub fn outcome_of(&self, name: &str) -> Option<ProvisionOutcome> {
        self.resources
            .iter()
            .find(|r| r.name == name)
            .map(|r| r.outcome)
    }

    /// Render the summary as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// What a provisioning run would do with one database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlannedAction {
    /// Already present, would be left alone.
    Exists,
    /// Missing, would be created.
    Create,
    /// The existence query failed and the strict policy would mark it failed.
    QueryFailed,
    /// The name is empty and would be marked failed.
    InvalidName,
}

/// Dry-run result for one database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedResource {
    /// Database name as given.
    pub name: String,
    /// What a real run would do.
    pub action: PlannedAction,
}

/// Ensures a list of databases exists in a store.
pub struct Provisioner {
    store: Arc<dyn ResourceStore>,
    policy: QueryPolicy,
}

impl Provisioner {
    /// Create a provisioner with the default (lenient) query policy.
    pub fn new(store: Arc<dyn ResourceStore>) -> Self {
        Self {
            store,
            policy: QueryPolicy::default(),
        }
    }

    /// Set the policy for failed existence queries.
    pub fn with_policy(mut self, policy: QueryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Ensure a single database exists.
    ///
    /// Never returns an error: store failures are logged and reported as
    /// [`ProvisionOutcome::Failed`]. Failed creates are not retried.
    pub async fn ensure_resource(&self, name: &str) -> ProvisionOutcome {
        if name.trim().is_empty() {
            error!(database = ?name, "Database name is empty");
            return ProvisionOutcome::Failed;
        }

        match self.store.exists(name).await {
            Ok(true) => {
                info!(database = %name, "Database already exists");
                return ProvisionOutcome::AlreadyExists;
            }
            Ok(false) => {}
            Err(e) => match self.policy {
                QueryPolicy::Lenient => {
                    warn!(
                        database = %name,
                        error = %e,
                        "Existence check failed, attempting to create"
                    );
                }
                QueryPolicy::Strict => {
                    error!(database = %name, error = %e, "Existence check failed");
                    return ProvisionOutcome::Failed;
                }
            },
        }

        match self.store.create(name).await {
            Ok(()) => {
                info!(database = %name, "Database created");
                ProvisionOutcome::Created
            }
            Err(e) => {
                error!(database = %name, error = %e, "Failed to create database");
                ProvisionOutcome::Failed
            }
        }
    }

    /// Ensure every database in `resources`, in order.
    ///
    /// The caller must have passed the readiness gate first.
    pub async fn provision_all(&self, resources: &[String]) -> ProvisionSummary {
        let start = Instant::now();
        let mut summary = ProvisionSummary::new(Utc::now());

        info!(count = resources.len(), "Provisioning databases");

        for name in resources {
            let outcome = self.ensure_resource(name).await;
            summary = summary.record(name, outcome);
        }

        summary.duration_ms = start.elapsed().as_millis() as u64;

        if summary.success {
            info!(
                created = summary.created,
                existing = summary.existing,
                "Databases ready"
            );
        } else {
            error!(
                created = summary.created,
                existing = summary.existing,
                failed = summary.failed,
                "Some databases could not be provisioned"
            );
        }

        summary
    }

    /// Report what [`provision_all`](Self::provision_all) would do, without creating anything.
    ///
    /// A failed existence check follows the query policy: under
    /// [`QueryPolicy::Lenient`] it plans [`PlannedAction::Create`], as a real
    /// run would attempt creation; under [`QueryPolicy::Strict`] it plans
    /// [`PlannedAction::QueryFailed`].
    pub async fn plan_all(&self, resources: &[String]) -> Vec<PlannedResource> {
        let mut plan = Vec::with_capacity(resources.len());

        for name in resources {
            let action = if name.trim().is_empty() {
                PlannedAction::InvalidName
            } else {
                match self.store.exists(name).await {
                    Ok(true) => PlannedAction::Exists,
                    Ok(false) => PlannedAction::Create,
                    Err(e) => {
                        warn!(database = %name, error = %e, "Existence check failed");
                        match self.policy {
                            QueryPolicy::Lenient => PlannedAction::Create,
                            QueryPolicy::Strict => PlannedAction::QueryFailed,
                        }
                    }
                }
            };
            info!(database = %name, action = ?action, "Planned");
            plan.push(PlannedResource {
                name: name.clone(),
                action,
            });
        }

        plan
    }
}
