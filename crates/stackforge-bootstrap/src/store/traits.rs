// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Resource store trait definitions.
//!
//! Defines the abstract interface to the target service that holds the
//! provisioned resources.

use async_trait::async_trait;
use thiserror::Error;

/// Errors from store operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StoreError {
    /// The target service did not answer the readiness probe.
    #[error("Service not ready: {0}")]
    NotReady(String),

    /// The resource name cannot be used with this store.
    #[error("Invalid resource name {name:?}: {reason}")]
    InvalidName {
        /// The rejected name.
        name: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Command exited with non-zero code.
    #[error("Exit code {exit_code}: {stderr}")]
    ExitCode {
        /// Exit code from the process.
        exit_code: i32,
        /// Standard error output.
        stderr: String,
    },

    /// I/O operation failed (e.g. the container runtime binary is missing).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error.
    #[error("Other: {0}")]
    Other(String),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Trait for resource stores.
///
/// A store is the narrow capability the bootstrap needs from the target
/// service: a cheap readiness probe, an exact existence check, and a
/// create command. Stores do not retry and do not log outcomes; the
/// readiness gate and the provisioner own that.
#[async_trait]
pub trait ResourceStore: Send + Sync {
    /// Store type identifier (e.g., "docker-postgres", "mock")
    fn store_type(&self) -> &'static str;

    /// Issue a lightweight command to check the service accepts commands.
    async fn probe(&self) -> Result<()>;

    /// Check whether a resource with exactly this name exists.
    ///
    /// Matching is case-sensitive.
    async fn exists(&self, name: &str) -> Result<bool>;

    /// Create a resource with exactly this name.
    async fn create(&self, name: &str) -> Result<()>;
}
