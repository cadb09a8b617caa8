//! Environment-driven configuration for the ledger services.

use std::time::Duration;

use thiserror::Error;

use crate::retry::RetryPolicy;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be set when LEDGER_STORE=postgres")]
    Missing { var: &'static str },

    #[error("invalid value for {var}: '{value}' ({reason})")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Which storage backend to run against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    Postgres { database_url: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct LedgerConfig {
    pub backend: StoreBackend,
    pub retry: RetryPolicy,
    pub lock_timeout: Duration,
    pub max_connections: u32,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            retry: RetryPolicy::default(),
            lock_timeout: Duration::from_millis(2000),
            max_connections: 10,
        }
    }
}

impl LedgerConfig {
    /// Read `LEDGER_*` and `DATABASE_URL` from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Same as [`from_env`](Self::from_env) over an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let backend = match lookup("LEDGER_STORE").as_deref().map(str::trim) {
            None | Some("") | Some("memory") => StoreBackend::Memory,
            Some("postgres") => {
                let database_url = lookup("DATABASE_URL")
                    .filter(|url| !url.trim().is_empty())
                    .ok_or(ConfigError::Missing { var: "DATABASE_URL" })?;
                StoreBackend::Postgres { database_url }
            }
            Some(other) => {
                return Err(ConfigError::Invalid {
                    var: "LEDGER_STORE",
                    value: other.to_string(),
                    reason: "expected 'memory' or 'postgres'".to_string(),
                });
            }
        };

        let max_retries = parse_or(&lookup, "LEDGER_MAX_RETRIES", defaults.retry.max_retries)?;
        let base_ms = parse_or(
            &lookup,
            "LEDGER_RETRY_BASE_MS",
            defaults.retry.base_delay.as_millis() as u64,
        )?;
        let max_ms = parse_or(
            &lookup,
            "LEDGER_RETRY_MAX_MS",
            defaults.retry.max_delay.as_millis() as u64,
        )?;
        if max_ms < base_ms {
            return Err(ConfigError::Invalid {
                var: "LEDGER_RETRY_MAX_MS",
                value: max_ms.to_string(),
                reason: format!("must be >= LEDGER_RETRY_BASE_MS ({base_ms})"),
            });
        }

        let lock_timeout_ms = parse_or(
            &lookup,
            "LEDGER_LOCK_TIMEOUT_MS",
            defaults.lock_timeout.as_millis() as u64,
        )?;
        let max_connections: u32 = parse_or(&lookup, "LEDGER_DB_MAX_CONNECTIONS", defaults.max_connections)?;
        if max_connections == 0 {
            return Err(ConfigError::Invalid {
                var: "LEDGER_DB_MAX_CONNECTIONS",
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        Ok(Self {
            backend,
            retry: RetryPolicy::exponential(
                max_retries,
                Duration::from_millis(base_ms),
                Duration::from_millis(max_ms),
            ),
            lock_timeout: Duration::from_millis(lock_timeout_ms),
            max_connections,
        })
    }

    pub fn with_backend(mut self, backend: StoreBackend) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

fn parse_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(var) {
        None => Ok(default),
        Some(raw) if raw.trim().is_empty() => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            value: raw.clone(),
            reason: e.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn empty_environment_gives_defaults() {
        let config = LedgerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, LedgerConfig::default());
        assert_eq!(config.retry.max_retries, 5);
        assert_eq!(config.retry.base_delay, Duration::from_millis(10));
        assert_eq!(config.retry.max_delay, Duration::from_millis(500));
    }

    #[test]
    fn postgres_requires_database_url() {
        let err = LedgerConfig::from_lookup(lookup(&[("LEDGER_STORE", "postgres")])).unwrap_err();
        assert_eq!(err, ConfigError::Missing { var: "DATABASE_URL" });

        let config = LedgerConfig::from_lookup(lookup(&[
            ("LEDGER_STORE", "postgres"),
            ("DATABASE_URL", "postgres://localhost/ledger"),
            ("LEDGER_LOCK_TIMEOUT_MS", "750"),
        ]))
        .unwrap();
        assert_eq!(
            config.backend,
            StoreBackend::Postgres {
                database_url: "postgres://localhost/ledger".to_string()
            }
        );
        assert_eq!(config.lock_timeout, Duration::from_millis(750));
    }

    #[test]
    fn bad_values_are_reported_by_name() {
        let err = LedgerConfig::from_lookup(lookup(&[("LEDGER_MAX_RETRIES", "lots")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "LEDGER_MAX_RETRIES", .. }));

        let err = LedgerConfig::from_lookup(lookup(&[("LEDGER_STORE", "sqlite")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "LEDGER_STORE", .. }));

        let err = LedgerConfig::from_lookup(lookup(&[
            ("LEDGER_RETRY_BASE_MS", "100"),
            ("LEDGER_RETRY_MAX_MS", "50"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "LEDGER_RETRY_MAX_MS", .. }));

        let err = LedgerConfig::from_lookup(lookup(&[("LEDGER_DB_MAX_CONNECTIONS", "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "LEDGER_DB_MAX_CONNECTIONS", .. }));
    }
}
