// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Stackforge Bootstrap - Database Readiness and Provisioning
//!
//! This crate makes sure the per-service databases of a stackforge
//! deployment exist before the services that need them start. It waits for
//! the shared Postgres container to accept commands, then creates every
//! configured database that is missing.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │              Installer / update orchestrator                │
//! │          (library call or stackforge-bootstrap CLI)         │
//! └─────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 stackforge-bootstrap (This Crate)           │
//! │  ┌─────────────┐      ┌─────────────┐      ┌─────────────┐  │
//! │  │  Readiness  │ ───▶ │  Database   │ ───▶ │   Summary   │  │
//! │  │    Gate     │      │ Provisioner │      │             │  │
//! │  └─────────────┘      └─────────────┘      └─────────────┘  │
//! └─────────────────────────────────────────────────────────────┘
//!                               │ probe / exists / create
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │        ResourceStore (docker exec postgres ... | mock)      │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Guarantees
//!
//! - Existing databases are never touched, so every run is safe to repeat.
//! - One database failing never stops the rest from being attempted.
//! - A run succeeds iff no database failed.
//! - Nothing is provisioned if Postgres does not become ready in time.
//!
//! # Configuration
//!
//! Configuration is loaded from environment variables:
//!
//! | Variable | Required | Default | Description |
//! |----------|----------|---------|-------------|
//! | `STACKFORGE_CONTAINER_RUNTIME` | No | `docker` | Container CLI used for `exec` |
//! | `STACKFORGE_POSTGRES_CONTAINER` | No | `postgres` | Postgres container name |
//! | `STACKFORGE_POSTGRES_USER` | No | `POSTGRES_USER` or `postgres` | Role for `pg_isready`/`psql` |
//! | `STACKFORGE_DATABASES` | No | `n8n,flowise,langfuse,lightrag,postiz,waha` | Databases to ensure |
//! | `STACKFORGE_DB_WAIT_SECS` | No | `60` | Readiness bound in seconds |
//! | `STACKFORGE_DB_STRICT_QUERY` | No | `false` | Fail instead of creating when the existence check errors |
//!
//! # Modules
//!
//! - [`config`]: Configuration from environment variables
//! - [`error`]: Error types
//! - [`readiness`]: Bounded readiness polling
//! - [`provisioner`]: Idempotent database creation and summaries
//! - [`runtime`]: Embeddable gate-then-provision driver
//! - [`store`]: Target service backends (Docker/Postgres, mock)

#![deny(missing_docs)]

/// Configuration loaded from environment variables.
pub mod config;

/// Error types for bootstrap operations.
pub mod error;

/// Readiness gate for the target service.
pub mod readiness;

/// Idempotent database provisioning.
pub mod provisioner;

/// Embeddable bootstrap runtime.
pub mod runtime;

/// Target service backends.
pub mod store;

pub use config::Config;
pub use error::Error;
pub use provisioner::{ProvisionOutcome, ProvisionSummary};
pub use runtime::Bootstrap;
