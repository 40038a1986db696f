//! Runtime configuration.
//!
//! Everything is read from `SOILWATCH_*` environment variables with
//! defaults suitable for a local setup next to the soil API. A variable
//! that is present but unparsable is a startup error rather than a silent
//! fallback.

use std::env;
use std::time::Duration;

use anyhow::{Result, anyhow};

use crate::client::DEFAULT_API_BASE;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_DB_URL: &str = "sqlite:soilwatch.db?mode=rwc";
const DEFAULT_POLL_SECONDS: u64 = 30;
const DEFAULT_REQUEST_TIMEOUT_SECONDS: u64 = 10;

/// Parse an optional numeric variable, falling back to a default.
macro_rules! parse_var {
    ($lookup:expr, $name:expr, $ty:ty, $default:expr) => {
        $lookup($name)
            .map(|v| v.trim().parse::<$ty>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $name, e))?
            .unwrap_or($default)
    };
}

/// Application configuration, fixed for the life of the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Port the HTTP server listens on.
    pub port: u16,

    /// Base URL of the upstream soil API.
    pub api_url: String,

    /// SQLite connection string of the session store.
    pub database_url: String,

    /// Refresh period of the polled pages.
    pub poll_interval: Duration,

    /// Per-request timeout against the soil API.
    pub request_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            api_url: DEFAULT_API_BASE.to_string(),
            database_url: DEFAULT_DB_URL.to_string(),
            poll_interval: Duration::from_secs(DEFAULT_POLL_SECONDS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECONDS),
        }
    }
}

impl Config {
    /// Load configuration from the process environment.
    ///
    /// Optional:
    /// - `SOILWATCH_PORT` (default: 3000)
    /// - `SOILWATCH_API_URL` (default: `http://localhost:8000/api`)
    /// - `SOILWATCH_DATABASE_URL` (default: `sqlite:soilwatch.db?mode=rwc`)
    /// - `SOILWATCH_POLL_SECONDS` (default: 30)
    /// - `SOILWATCH_REQUEST_TIMEOUT_SECONDS` (default: 10)
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = parse_var!(lookup, "SOILWATCH_PORT", u16, DEFAULT_PORT);
        let poll_seconds = parse_var!(lookup, "SOILWATCH_POLL_SECONDS", u64, DEFAULT_POLL_SECONDS);
        let timeout_seconds = parse_var!(
            lookup,
            "SOILWATCH_REQUEST_TIMEOUT_SECONDS",
            u64,
            DEFAULT_REQUEST_TIMEOUT_SECONDS
        );

        if poll_seconds == 0 {
            return Err(anyhow!("Invalid SOILWATCH_POLL_SECONDS: must be at least 1"));
        }
        if timeout_seconds == 0 {
            return Err(anyhow!(
                "Invalid SOILWATCH_REQUEST_TIMEOUT_SECONDS: must be at least 1"
            ));
        }

        Ok(Self {
            port,
            api_url: lookup("SOILWATCH_API_URL").unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            database_url: lookup("SOILWATCH_DATABASE_URL")
                .unwrap_or_else(|| DEFAULT_DB_URL.to_string()),
            poll_interval: Duration::from_secs(poll_seconds),
            request_timeout: Duration::from_secs(timeout_seconds),
        })
    }

    /// Log the loaded configuration once at startup.
    pub fn log_config(&self) {
        tracing::info!("Configuration loaded:");
        tracing::info!("  SOILWATCH_PORT                    : {}", self.port);
        tracing::info!("  SOILWATCH_API_URL                 : {}", self.api_url);
        tracing::info!("  SOILWATCH_DATABASE_URL            : {}", self.database_url);
        tracing::info!(
            "  SOILWATCH_POLL_SECONDS            : {}",
            self.poll_interval.as_secs()
        );
        tracing::info!(
            "  SOILWATCH_REQUEST_TIMEOUT_SECONDS : {}",
            self.request_timeout.as_secs()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.poll_interval, Duration::from_secs(30));
        assert_eq!(config.api_url, "http://localhost:8000/api");
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("SOILWATCH_PORT", "8080"),
            ("SOILWATCH_API_URL", "http://soil.internal/api"),
            ("SOILWATCH_POLL_SECONDS", " 5 "),
        ]))
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.api_url, "http://soil.internal/api");
        assert_eq!(config.poll_interval, Duration::from_secs(5));
    }

    #[test]
    fn test_invalid_number_is_an_error() {
        let err = Config::from_lookup(lookup(&[("SOILWATCH_PORT", "eighty")])).unwrap_err();
        assert!(err.to_string().contains("SOILWATCH_PORT"));

        assert!(Config::from_lookup(lookup(&[("SOILWATCH_POLL_SECONDS", "0")])).is_err());
    }
}
