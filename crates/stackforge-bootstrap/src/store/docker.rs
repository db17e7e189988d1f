// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Postgres store reached through the container runtime.
//!
//! Every operation is a `<runtime> exec <container> ...` call against the
//! running Postgres container:
//! - probe: `pg_isready -U <user>`
//! - exists: `psql -tA -c "SELECT datname FROM pg_database"`, exact line match
//! - create: `psql -v ON_ERROR_STOP=1 -c 'CREATE DATABASE "<name>"'`

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::config::Config;
use crate::store::{ResourceStore, Result, StoreError};

/// Postgres identifiers are truncated beyond this many bytes.
const MAX_IDENTIFIER_BYTES: usize = 63;

/// Database the catalog and create commands connect to.
const MAINTENANCE_DB: &str = "postgres";

/// Store that provisions Postgres databases inside a container.
#[derive(Debug, Clone)]
pub struct DockerPostgresStore {
    /// Container runtime binary (`docker`, `podman`, ...)
    runtime: String,
    /// Name of the running Postgres container
    container: String,
    /// Role used by `pg_isready` and `psql`
    user: String,
}

impl DockerPostgresStore {
    /// Create a store for the given runtime binary, container and role.
    pub fn new(
        runtime: impl Into<String>,
        container: impl Into<String>,
        user: impl Into<String>,
    ) -> Self {
        Self {
            runtime: runtime.into(),
            container: container.into(),
            user: user.into(),
        }
    }

    /// Create a store from loaded configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.runtime, &config.container, &config.user)
    }

    /// Name of the target container.
    pub fn container(&self) -> &str {
        &self.container
    }

    /// Arguments for running `cmd` inside the container.
    fn exec_args(&self, cmd: &[&str]) -> Vec<String> {
        let mut args = vec!["exec".to_string(), self.container.clone()];
        args.extend(cmd.iter().map(|s| s.to_string()));
        args
    }

    /// Arguments for running one SQL statement with `psql`.
    fn psql_args(&self, sql: &str, tuples_only: bool) -> Vec<String> {
        let mut cmd = vec!["psql", "-U", self.user.as_str(), "-d", MAINTENANCE_DB];
        if tuples_only {
            cmd.push("-tA");
        }
        cmd.extend(["-v", "ON_ERROR_STOP=1", "-c", sql]);
        self.exec_args(&cmd)
    }

    /// Run the container runtime and return stdout on success.
    async fn run(&self, args: Vec<String>) -> Result<String> {
        debug!(runtime = %self.runtime, args = ?args, "Running container command");

        let output = Command::new(&self.runtime).args(&args).output().await?;

        if !output.status.success() {
            return Err(StoreError::ExitCode {
                exit_code: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Reject names Postgres would silently alter or the catalog scan cannot match.
fn validate_name(name: &str) -> Result<()> {
    let reason = if name.is_empty() {
        Some("name is empty".to_string())
    } else if name.len() > MAX_IDENTIFIER_BYTES {
        Some(format!("longer than {} bytes", MAX_IDENTIFIER_BYTES))
    } else if name.contains(['\0', '\n', '\r']) {
        Some("contains a NUL or line break".to_string())
    } else {
        None
    };

    match reason {
        Some(reason) => Err(StoreError::InvalidName {
            name: name.to_string(),
            reason,
        }),
        None => Ok(()),
    }
}

/// Quote a Postgres identifier, doubling embedded quotes.
fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Exact, case-sensitive match against `psql -tA` output (one name per line).
fn catalog_contains(stdout: &str, name: &str) -> bool {
    stdout.lines().any(|line| line == name)
}

#[async_trait]
impl ResourceStore for DockerPostgresStore {
    fn store_type(&self) -> &'static str {
        "docker-postgres"
    }

    async fn probe(&self) -> Result<()> {
        let args = self.exec_args(&["pg_isready", "-U", self.user.as_str()]);
        self.run(args).await.map(|_| ())
    }

    async fn exists(&self, name: &str) -> Result<bool> {
        validate_name(name)?;
        let stdout = self
            .run(self.psql_args("SELECT datname FROM pg_database", true))
            .await?;
        Ok(catalog_contains(&stdout, name))
    }

    async fn create(&self, name: &str) -> Result<()> {
        validate_name(name)?;
        let sql = format!("CREATE DATABASE {}", quote_identifier(name));
        self.run(self.psql_args(&sql, false)).await.map(|_| ())
    }
}
