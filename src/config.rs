//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.
//! `main` loads a `.env` file (via dotenvy) before calling [`Config::from_env`].

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{AppError, Result};
use crate::retry::RetryPolicy;

/// Default document fetched at startup.
pub const DEFAULT_BOOTSTRAP_DOCUMENT: &str = "users/pU1z2BwT9l0hO1p6R34a";

/// Default Firestore REST root.
pub const DEFAULT_FIRESTORE_BASE_URL: &str = "https://firestore.googleapis.com/v1";

// == Store Backend ==
/// Which document store the server talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// Process-local store, lost on restart
    Memory,
    /// Cloud Firestore over REST
    Firestore,
}

impl FromStr for StoreBackend {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(StoreBackend::Memory),
            "firestore" => Ok(StoreBackend::Firestore),
            other => Err(AppError::Config(format!("Unknown store backend '{}'", other))),
        }
    }
}

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Document store backend
    pub store_backend: StoreBackend,
    /// Path to the service-account JSON key
    pub credentials_path: Option<PathBuf>,
    /// Overrides the key's project id
    pub project_id: Option<String>,
    /// Firestore database id
    pub database_id: String,
    /// Firestore REST root
    pub firestore_base_url: String,
    /// Emulator `host:port`; disables OAuth when set
    pub emulator_host: Option<String>,
    /// Document fetched and logged at startup, None disables
    pub bootstrap_document: Option<String>,
    /// Maximum number of documents held in the cache
    pub cache_max_entries: usize,
    /// Cached document lifetime in seconds
    pub cache_ttl: u64,
    /// Background cleanup task interval in seconds
    pub cleanup_interval: u64,
    /// Outbound HTTP timeout in seconds
    pub http_timeout: u64,
    /// Total attempts for a transient outbound failure
    pub retry_max_attempts: u32,
    /// First retry delay in milliseconds
    pub retry_base_delay_ms: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `STORE_BACKEND` - `memory` or `firestore` (default: memory)
    /// - `PATH_TO_FIREBASE_ADMIN_KEY` - service-account key path
    /// - `FIRESTORE_PROJECT_ID` - project id override
    /// - `FIRESTORE_DATABASE` - database id (default: `(default)`)
    /// - `FIRESTORE_BASE_URL` - REST root
    /// - `FIRESTORE_EMULATOR_HOST` - emulator `host:port`
    /// - `BOOTSTRAP_DOCUMENT` - startup document, empty disables
    /// - `CACHE_MAX_ENTRIES` - cache capacity (default: 1000)
    /// - `CACHE_TTL` - cached document lifetime in seconds (default: 300)
    /// - `CLEANUP_INTERVAL` - cleanup frequency in seconds (default: 5)
    /// - `HTTP_TIMEOUT_SECS` - outbound timeout (default: 10)
    /// - `RETRY_MAX_ATTEMPTS` - attempts per outbound call (default: 4)
    /// - `RETRY_BASE_DELAY_MS` - first backoff delay (default: 200)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            server_port: parse_or("SERVER_PORT", defaults.server_port),
            store_backend: env::var("STORE_BACKEND")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.store_backend),
            credentials_path: non_empty("PATH_TO_FIREBASE_ADMIN_KEY").map(PathBuf::from),
            project_id: non_empty("FIRESTORE_PROJECT_ID"),
            database_id: non_empty("FIRESTORE_DATABASE").unwrap_or(defaults.database_id),
            firestore_base_url: non_empty("FIRESTORE_BASE_URL")
                .unwrap_or(defaults.firestore_base_url),
            emulator_host: non_empty("FIRESTORE_EMULATOR_HOST"),
            bootstrap_document: match env::var("BOOTSTRAP_DOCUMENT") {
                Ok(v) if v.trim().is_empty() => None,
                Ok(v) => Some(v.trim().to_string()),
                Err(_) => defaults.bootstrap_document,
            },
            cache_max_entries: parse_or("CACHE_MAX_ENTRIES", defaults.cache_max_entries),
            cache_ttl: parse_or("CACHE_TTL", defaults.cache_ttl),
            cleanup_interval: parse_or("CLEANUP_INTERVAL", defaults.cleanup_interval),
            http_timeout: parse_or("HTTP_TIMEOUT_SECS", defaults.http_timeout),
            retry_max_attempts: parse_or("RETRY_MAX_ATTEMPTS", defaults.retry_max_attempts),
            retry_base_delay_ms: parse_or("RETRY_BASE_DELAY_MS", defaults.retry_base_delay_ms),
        }
    }

    /// Rejects settings the server cannot start with.
    pub fn validate(&self) -> Result<()> {
        if self.server_port == 0 {
            return Err(AppError::Config("SERVER_PORT must be non-zero".into()));
        }
        if self.cache_max_entries == 0 {
            return Err(AppError::Config("CACHE_MAX_ENTRIES must be at least 1".into()));
        }
        if self.cleanup_interval == 0 {
            return Err(AppError::Config("CLEANUP_INTERVAL must be at least 1".into()));
        }
        if self.retry_max_attempts == 0 {
            return Err(AppError::Config("RETRY_MAX_ATTEMPTS must be at least 1".into()));
        }
        if self.store_backend == StoreBackend::Firestore
            && self.credentials_path.is_none()
            && self.emulator_host.is_none()
        {
            return Err(AppError::Config(
                "firestore backend needs PATH_TO_FIREBASE_ADMIN_KEY or FIRESTORE_EMULATOR_HOST"
                    .into(),
            ));
        }
        Ok(())
    }

    /// Effective Firestore REST root, honoring the emulator host.
    pub fn firestore_root(&self) -> String {
        match &self.emulator_host {
            Some(host) => format!("http://{}/v1", host),
            None => self.firestore_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Retry policy for outbound calls.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.retry_max_attempts,
            Duration::from_millis(self.retry_base_delay_ms),
        )
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            store_backend: StoreBackend::Memory,
            credentials_path: None,
            project_id: None,
            database_id: "(default)".to_string(),
            firestore_base_url: DEFAULT_FIRESTORE_BASE_URL.to_string(),
            emulator_host: None,
            bootstrap_document: Some(DEFAULT_BOOTSTRAP_DOCUMENT.to_string()),
            cache_max_entries: 1000,
            cache_ttl: 300,
            cleanup_interval: 5,
            http_timeout: 10,
            retry_max_attempts: 4,
            retry_base_delay_ms: 200,
        }
    }
}

fn parse_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.store_backend, StoreBackend::Memory);
        assert_eq!(config.cache_max_entries, 1000);
        assert_eq!(config.cache_ttl, 300);
        assert_eq!(config.cleanup_interval, 5);
        assert_eq!(
            config.bootstrap_document.as_deref(),
            Some(DEFAULT_BOOTSTRAP_DOCUMENT)
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_from_env_defaults() {
        // Clear any existing env vars to test defaults
        env::remove_var("SERVER_PORT");
        env::remove_var("STORE_BACKEND");
        env::remove_var("CACHE_MAX_ENTRIES");
        env::remove_var("CACHE_TTL");
        env::remove_var("CLEANUP_INTERVAL");
        env::remove_var("BOOTSTRAP_DOCUMENT");

        let config = Config::from_env();
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.store_backend, StoreBackend::Memory);
        assert_eq!(config.cache_max_entries, 1000);
        assert_eq!(config.cache_ttl, 300);
        assert_eq!(config.cleanup_interval, 5);
    }

    #[test]
    fn test_store_backend_parse() {
        assert_eq!("Firestore".parse::<StoreBackend>().unwrap(), StoreBackend::Firestore);
        assert_eq!(" memory ".parse::<StoreBackend>().unwrap(), StoreBackend::Memory);
        assert!("postgres".parse::<StoreBackend>().is_err());
    }

    #[test]
    fn test_validate_firestore_needs_credentials() {
        let config = Config {
            store_backend: StoreBackend::Firestore,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(AppError::Config(_))));

        let emulator = Config {
            store_backend: StoreBackend::Firestore,
            emulator_host: Some("localhost:8080".into()),
            ..Config::default()
        };
        assert!(emulator.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_values() {
        let zero_cache = Config {
            cache_max_entries: 0,
            ..Config::default()
        };
        assert!(zero_cache.validate().is_err());

        let zero_retries = Config {
            retry_max_attempts: 0,
            ..Config::default()
        };
        assert!(zero_retries.validate().is_err());
    }

    #[test]
    fn test_firestore_root() {
        let config = Config {
            firestore_base_url: "https://example.test/v1/".into(),
            ..Config::default()
        };
        assert_eq!(config.firestore_root(), "https://example.test/v1");

        let emulator = Config {
            emulator_host: Some("127.0.0.1:8080".into()),
            ..Config::default()
        };
        assert_eq!(emulator.firestore_root(), "http://127.0.0.1:8080/v1");
    }
}
