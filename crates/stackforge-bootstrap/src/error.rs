// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Error types for stackforge-bootstrap.

use std::time::Duration;

use thiserror::Error;

/// Bootstrap errors.
///
/// Per-database failures are not errors: they are folded into the
/// [`ProvisionSummary`](crate::provisioner::ProvisionSummary).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Configuration loading failed.
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// The target service never accepted commands within the bound.
    #[error("Service not ready after {}s", .waited.as_secs())]
    ReadinessTimeout {
        /// How long the gate waited.
        waited: Duration,
    },

    /// Request validation failed.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// JSON serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type using bootstrap Error.
pub type Result<T> = std::result::Result<T, Error>;
