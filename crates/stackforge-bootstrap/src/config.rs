// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Configuration for stackforge-bootstrap.

use std::time::Duration;

/// Databases provisioned when `STACKFORGE_DATABASES` is not set.
pub const DEFAULT_DATABASES: &[&str] = &["n8n", "flowise", "langfuse", "lightrag", "postiz", "waha"];

/// Default readiness bound in seconds.
pub const DEFAULT_MAX_WAIT_SECS: u64 = 60;

/// Bootstrap configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Container runtime binary used for `exec`
    pub runtime: String,
    /// Name of the Postgres container
    pub container: String,
    /// Postgres role used for probes and catalog commands
    pub user: String,
    /// Databases to ensure, in processing order
    pub databases: Vec<String>,
    /// How long to wait for Postgres to accept commands
    pub max_wait: Duration,
    /// Treat a failed existence query as a failed database instead of attempting creation
    pub strict_query: bool,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let runtime =
            lookup("STACKFORGE_CONTAINER_RUNTIME").unwrap_or_else(|| "docker".to_string());

        let container =
            lookup("STACKFORGE_POSTGRES_CONTAINER").unwrap_or_else(|| "postgres".to_string());

        // Same role the compose file hands to the postgres image
        let user = lookup("STACKFORGE_POSTGRES_USER")
            .or_else(|| lookup("POSTGRES_USER"))
            .unwrap_or_else(|| "postgres".to_string());

        let databases = match lookup("STACKFORGE_DATABASES") {
            Some(list) => parse_list(&list),
            None => DEFAULT_DATABASES.iter().map(|s| s.to_string()).collect(),
        };

        let max_wait_secs = match lookup("STACKFORGE_DB_WAIT_SECS") {
            Some(value) => value
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidNumber("STACKFORGE_DB_WAIT_SECS", value))?,
            None => DEFAULT_MAX_WAIT_SECS,
        };

        let strict_query = match lookup("STACKFORGE_DB_STRICT_QUERY") {
            Some(value) => parse_bool(&value)
                .ok_or(ConfigError::InvalidBool("STACKFORGE_DB_STRICT_QUERY", value))?,
            None => false,
        };

        Ok(Self {
            runtime,
            container,
            user,
            databases,
            max_wait: Duration::from_secs(max_wait_secs),
            strict_query,
        })
    }
}

/// Split a comma-separated list, dropping blank entries.
pub fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A numeric variable could not be parsed.
    #[error("Invalid number in {0}: {1:?}")]
    InvalidNumber(&'static str, String),

    /// A boolean variable was not one of `1/true/yes/on` or `0/false/no/off`.
    #[error("Invalid boolean in {0}: {1:?}")]
    InvalidBool(&'static str, String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();

        assert_eq!(config.runtime, "docker");
        assert_eq!(config.container, "postgres");
        assert_eq!(config.user, "postgres");
        assert_eq!(config.databases, DEFAULT_DATABASES);
        assert_eq!(config.max_wait, Duration::from_secs(60));
        assert!(!config.strict_query);
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("STACKFORGE_CONTAINER_RUNTIME", "podman"),
            ("STACKFORGE_POSTGRES_CONTAINER", "stack-postgres-1"),
            ("STACKFORGE_POSTGRES_USER", "admin"),
            ("STACKFORGE_DATABASES", "alpha, beta,,gamma "),
            ("STACKFORGE_DB_WAIT_SECS", "5"),
            ("STACKFORGE_DB_STRICT_QUERY", "yes"),
        ])
        .unwrap();

        assert_eq!(config.runtime, "podman");
        assert_eq!(config.container, "stack-postgres-1");
        assert_eq!(config.user, "admin");
        assert_eq!(config.databases, vec!["alpha", "beta", "gamma"]);
        assert_eq!(config.max_wait, Duration::from_secs(5));
        assert!(config.strict_query);
    }

    #[test]
    fn test_postgres_user_fallback() {
        let config = load(&[("POSTGRES_USER", "n8n")]).unwrap();
        assert_eq!(config.user, "n8n");

        let config = load(&[("POSTGRES_USER", "n8n"), ("STACKFORGE_POSTGRES_USER", "root")]).unwrap();
        assert_eq!(config.user, "root");
    }

    #[test]
    fn test_empty_database_list() {
        let config = load(&[("STACKFORGE_DATABASES", " , ")]).unwrap();
        assert!(config.databases.is_empty());
    }

    #[test]
    fn test_invalid_wait() {
        let err = load(&[("STACKFORGE_DB_WAIT_SECS", "soon")]).unwrap_err();
        assert!(err.to_string().contains("STACKFORGE_DB_WAIT_SECS"));
    }

    #[test]
    fn test_parse_bool() {
        for value in ["1", "true", "TRUE", "yes", "on"] {
            assert_eq!(parse_bool(value), Some(true), "{value} should be true");
        }
        for value in ["0", "false", "no", "off", ""] {
            assert_eq!(parse_bool(value), Some(false), "{value} should be false");
        }
        assert_eq!(parse_bool("treu"), None);
    }

    #[test]
    fn test_invalid_strict_query() {
        let err = load(&[("STACKFORGE_DB_STRICT_QUERY", "treu")]).unwrap_err();

        assert!(matches!(err, ConfigError::InvalidBool("STACKFORGE_DB_STRICT_QUERY", _)));
        assert!(err.to_string().contains("treu"));
    }
}
