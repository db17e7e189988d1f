// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Stackforge Bootstrap - database bootstrap CLI
//!
//! Waits for the stack's Postgres container to accept commands and makes
//! sure every service database exists before dependent services start.
//!
//! Exit codes:
//! - 0: all databases exist
//! - 1: at least one database could not be provisioned
//! - 2: configuration or usage error
//! - 3: Postgres never became ready

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::{error, info, warn};
use tracing_subscriber::fmt::writer::BoxMakeWriter;

use stackforge_bootstrap::config::Config;
use stackforge_bootstrap::error::Error;
use stackforge_bootstrap::provisioner::PlannedAction;
use stackforge_bootstrap::runtime::Bootstrap;
use stackforge_bootstrap::store::DockerPostgresStore;

const EXIT_OK: u8 = 0;
const EXIT_RESOURCE_FAILED: u8 = 1;
const EXIT_CONFIG: u8 = 2;
const EXIT_NOT_READY: u8 = 3;

#[derive(Parser, Debug)]
#[command(
    name = "stackforge-bootstrap",
    version,
    about = "Wait for Postgres and ensure the stack's databases exist"
)]
struct Cli {
    /// Container runtime binary (overrides STACKFORGE_CONTAINER_RUNTIME)
    #[arg(long, global = true)]
    runtime: Option<String>,

    /// Postgres container name (overrides STACKFORGE_POSTGRES_CONTAINER)
    #[arg(long, global = true)]
    container: Option<String>,

    /// Postgres role (overrides STACKFORGE_POSTGRES_USER)
    #[arg(long, global = true)]
    user: Option<String>,

    /// Seconds to wait for Postgres (overrides STACKFORGE_DB_WAIT_SECS)
    #[arg(long, global = true, value_name = "SECS")]
    max_wait: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Wait until Postgres accepts commands
    Wait,
    /// Wait for Postgres, then create missing databases
    Provision {
        /// Only report what would be created
        #[arg(long)]
        dry_run: bool,

        /// Fail a database whose existence check errors instead of trying to create it
        #[arg(long)]
        strict: bool,

        /// Print the summary as JSON on stdout (logs go to stderr)
        #[arg(long)]
        json: bool,

        /// Databases to ensure (default: STACKFORGE_DATABASES); commas are accepted
        #[arg(value_name = "DATABASE")]
        databases: Vec<String>,
    },
}

impl Cli {
    fn json(&self) -> bool {
        matches!(self.command, Commands::Provision { json: true, .. })
    }

    /// Layer command-line overrides on top of the environment configuration.
    fn apply(&self, mut config: Config) -> Config {
        if let Some(runtime) = &self.runtime {
            config.runtime = runtime.clone();
        }
        if let Some(container) = &self.container {
            config.container = container.clone();
        }
        if let Some(user) = &self.user {
            config.user = user.clone();
        }
        if let Some(secs) = self.max_wait {
            config.max_wait = Duration::from_secs(secs);
        }
        if let Commands::Provision {
            strict, databases, ..
        } = &self.command
        {
            if *strict {
                config.strict_query = true;
            }
            if !databases.is_empty() {
                config.databases = databases.iter().flat_map(|d| split_names(d)).collect();
            }
        }
        config
    }
}

/// Split comma-separated positional names.
///
/// Blank entries are kept so the provisioner reports them as failed
/// instead of silently skipping them.
fn split_names(value: &str) -> Vec<String> {
    value.split(',').map(|s| s.trim().to_string()).collect()
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Keep stdout clean for JSON output
    let writer = if cli.json() {
        BoxMakeWriter::new(std::io::stderr)
    } else {
        BoxMakeWriter::new(std::io::stdout)
    };

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stackforge_bootstrap=info".into()),
        )
        .with_writer(writer)
        .init();

    // Load .env file if present
    if let Err(e) = dotenvy::dotenv() {
        warn!("No .env file loaded: {}", e);
    }

    let code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!(error = %e, "Bootstrap aborted");
            exit_code_for(&e)
        }
    };
    ExitCode::from(code)
}

/// Map an aborted run to its exit code.
fn exit_code_for(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<Error>() {
        Some(Error::ReadinessTimeout { .. }) => EXIT_NOT_READY,
        _ => EXIT_CONFIG,
    }
}

async fn run(cli: Cli) -> anyhow::Result<u8> {
    // Load configuration
    let config = cli.apply(Config::from_env().map_err(Error::from)?);

    info!(
        runtime = %config.runtime,
        container = %config.container,
        user = %config.user,
        databases = ?config.databases,
        max_wait_secs = config.max_wait.as_secs(),
        strict_query = config.strict_query,
        "Starting Stackforge Bootstrap"
    );

    let store = Arc::new(DockerPostgresStore::from_config(&config));
    let mut bootstrap = Bootstrap::builder().config(&config).store(store).build()?;

    execute(&cli.command, &mut bootstrap).await
}

/// Run one subcommand against a built runtime, returning the exit code.
async fn execute(command: &Commands, bootstrap: &mut Bootstrap) -> anyhow::Result<u8> {
    match *command {
        Commands::Wait => {
            bootstrap.wait_ready().await?;
            Ok(EXIT_OK)
        }
        Commands::Provision {
            dry_run: true,
            json,
            ..
        } => {
            let plan = bootstrap.plan().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&plan)?);
            }
            let blocked = plan.iter().any(|p| {
                matches!(
                    p.action,
                    PlannedAction::QueryFailed | PlannedAction::InvalidName
                )
            });
            if blocked {
                Ok(EXIT_RESOURCE_FAILED)
            } else {
                Ok(EXIT_OK)
            }
        }
        Commands::Provision { json, .. } => {
            let summary = bootstrap.run().await?;
            if json {
                println!("{}", summary.to_json()?);
            }
            if summary.success {
                Ok(EXIT_OK)
            } else {
                Ok(EXIT_RESOURCE_FAILED)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stackforge_bootstrap::config::ConfigError;
    use stackforge_bootstrap::provisioner::QueryPolicy;
    use stackforge_bootstrap::store::MockStore;

    fn defaults() -> Config {
        Config::from_lookup(|_| None).unwrap()
    }

    fn runtime_with(store: MockStore, databases: &[&str]) -> Bootstrap {
        Bootstrap::builder()
            .store(Arc::new(store))
            .resources(databases.iter().copied())
            .max_wait(Duration::from_secs(5))
            .build()
            .unwrap()
    }

    fn strict_runtime_with(store: MockStore, databases: &[&str]) -> Bootstrap {
        Bootstrap::builder()
            .store(Arc::new(store))
            .resources(databases.iter().copied())
            .query_policy(QueryPolicy::Strict)
            .build()
            .unwrap()
    }

    fn provision(dry_run: bool) -> Commands {
        Commands::Provision {
            dry_run,
            strict: false,
            json: false,
            databases: Vec::new(),
        }
    }

    async fn exit_code(command: Commands, bootstrap: &mut Bootstrap) -> u8 {
        match execute(&command, bootstrap).await {
            Ok(code) => code,
            Err(e) => exit_code_for(&e),
        }
    }

    #[test]
    fn test_cli_parses_provision() {
        let cli = Cli::parse_from([
            "stackforge-bootstrap",
            "--max-wait",
            "5",
            "provision",
            "--strict",
            "--json",
            "alpha,beta",
            "gamma",
        ]);

        assert!(cli.json());
        let config = cli.apply(defaults());

        assert_eq!(config.max_wait, Duration::from_secs(5));
        assert!(config.strict_query);
        assert_eq!(config.databases, vec!["alpha", "beta", "gamma"]);
    }

    #[test]
    fn test_cli_wait_keeps_configured_databases() {
        let cli = Cli::parse_from(["stackforge-bootstrap", "wait", "--container", "db"]);

        assert!(!cli.json());
        let config = cli.apply(defaults());

        assert_eq!(config.container, "db");
        assert_eq!(config.databases, defaults().databases);
        assert!(!config.strict_query);
    }

    #[test]
    fn test_cli_rejects_unknown_command() {
        assert!(Cli::try_parse_from(["stackforge-bootstrap", "migrate"]).is_err());
    }

    #[test]
    fn test_cli_keeps_blank_database_names() {
        let cli = Cli::parse_from(["stackforge-bootstrap", "provision", ""]);
        assert_eq!(cli.apply(defaults()).databases, vec![""]);

        let cli = Cli::parse_from(["stackforge-bootstrap", "provision", "alpha,", "beta"]);
        assert_eq!(cli.apply(defaults()).databases, vec!["alpha", "", "beta"]);
    }

    // ========================================================================
    // Exit codes
    // ========================================================================

    #[tokio::test]
    async fn test_exit_ok_when_all_databases_ready() {
        let store = MockStore::new().with_existing(["n8n"]);
        let mut bootstrap = runtime_with(store, &["n8n", "waha"]);

        assert_eq!(exit_code(provision(false), &mut bootstrap).await, EXIT_OK);
        assert_eq!(exit_code(Commands::Wait, &mut bootstrap).await, EXIT_OK);
    }

    #[tokio::test]
    async fn test_exit_failed_when_create_fails() {
        let store = MockStore::new().with_failing_creates(["waha"]);
        let mut bootstrap = runtime_with(store, &["n8n", "waha"]);

        assert_eq!(
            exit_code(provision(false), &mut bootstrap).await,
            EXIT_RESOURCE_FAILED
        );
    }

    #[tokio::test]
    async fn test_exit_failed_for_blank_database_name() {
        let cli = Cli::parse_from(["stackforge-bootstrap", "provision", ""]);
        let config = cli.apply(defaults());
        let mut bootstrap = Bootstrap::builder()
            .config(&config)
            .store(Arc::new(MockStore::new()))
            .build()
            .unwrap();

        assert_eq!(
            exit_code(cli.command, &mut bootstrap).await,
            EXIT_RESOURCE_FAILED
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_exit_not_ready_on_timeout() {
        let mut bootstrap = runtime_with(MockStore::never_ready(), &["n8n"]);

        assert_eq!(
            exit_code(provision(false), &mut bootstrap).await,
            EXIT_NOT_READY
        );
        assert_eq!(exit_code(provision(true), &mut bootstrap).await, EXIT_NOT_READY);
        assert_eq!(exit_code(Commands::Wait, &mut bootstrap).await, EXIT_NOT_READY);
    }

    #[tokio::test]
    async fn test_dry_run_exit_codes() {
        let mut bootstrap = runtime_with(MockStore::new(), &["n8n", "waha"]);
        assert_eq!(exit_code(provision(true), &mut bootstrap).await, EXIT_OK);

        let store = MockStore::new().with_failing_queries(["waha"]);
        let mut bootstrap = strict_runtime_with(store, &["n8n", "waha"]);
        assert_eq!(
            exit_code(provision(true), &mut bootstrap).await,
            EXIT_RESOURCE_FAILED
        );

        let mut bootstrap = runtime_with(MockStore::new(), &["n8n", " "]);
        assert_eq!(
            exit_code(provision(true), &mut bootstrap).await,
            EXIT_RESOURCE_FAILED
        );
    }

    #[test]
    fn test_exit_config_for_other_errors() {
        let err = anyhow::Error::from(Error::from(ConfigError::InvalidNumber(
            "STACKFORGE_DB_WAIT_SECS",
            "soon".to_string(),
        )));
        assert_eq!(exit_code_for(&err), EXIT_CONFIG);

        let err = anyhow::anyhow!("store is required");
        assert_eq!(exit_code_for(&err), EXIT_CONFIG);
    }
}
