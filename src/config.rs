//! Process configuration and startup secrets.
//!
//! Configuration priority (highest to lowest):
//! 1. Environment variables with a `USERGATE_` prefix, with `__` separating
//!    nested keys (e.g. `USERGATE_RPC_PORT=50052`, `USERGATE_METRICS__ENABLED=true`)
//! 2. TOML configuration file (default `config/usergate.toml`)
//! 3. `.env` file (if present)
//! 4. Built-in defaults
//!
//! Signing secrets are deliberately excluded from the file-based layers and
//! are read from the process environment only.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Environment variable holding the access-token signing secret.
pub const ACCESS_TOKEN_SECRET_ENV: &str = "ACCESS_TOKEN_SECRET";

/// Environment variable holding the refresh-token signing secret.
pub const REFRESH_TOKEN_SECRET_ENV: &str = "REFRESH_TOKEN_SECRET";

const DEFAULT_CONFIG_PATH: &str = "config/usergate.toml";

/// Deployment environment the process runs in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Local development.
    Dev,
    /// Test runs.
    Test,
    /// Production.
    Prod,
}

/// Service configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppConfig {
    /// Deployment environment.
    pub environment: Environment,
    /// PostgreSQL connection string.
    pub database_url: String,
    /// Hostname or IP address both listeners bind to.
    pub host: String,
    /// Port number for the native RPC listener.
    pub rpc_port: u16,
    /// Port number for the HTTP gateway listener.
    pub rest_port: u16,
    /// Access token lifetime in seconds.
    pub access_token_ttl_secs: u64,
    /// Refresh token lifetime in seconds.
    pub refresh_token_ttl_secs: u64,
    /// Metrics exporter configuration.
    pub metrics: MetricsSettings,
}

/// Metrics exporter settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MetricsSettings {
    /// Whether the Prometheus scrape endpoint is enabled.
    pub enabled: bool,
    /// Hostname or IP address for the metrics listener.
    pub host: String,
    /// Port number for the metrics listener.
    pub port: u16,
}

impl MetricsSettings {
    /// Converts host and port into a socket address for the metrics listener.
    ///
    /// # Panics
    /// Panics if the host and port cannot be parsed into a valid socket
    /// address. This should only happen if the configuration is malformed.
    pub fn addr(&self) -> SocketAddr {
        format!("{}:{}", self.host, self.port)
            .parse()
            .unwrap_or_else(|e| {
                panic!(
                    "Invalid metrics address configuration (host: {}, port: {}): {}",
                    self.host, self.port, e
                )
            })
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            environment: Environment::Dev,
            database_url: String::new(),
            host: "127.0.0.1".to_string(),
            rpc_port: 50051,
            rest_port: 8080,
            access_token_ttl_secs: 30 * 60,
            refresh_token_ttl_secs: 24 * 60 * 60,
            metrics: MetricsSettings {
                enabled: false,
                host: "127.0.0.1".to_string(),
                port: 9090,
            },
        }
    }
}

impl AppConfig {
    /// Converts host and RPC port into a socket address.
    ///
    /// # Panics
    /// Panics if the host and port cannot be parsed into a valid socket
    /// address. This should only happen if the configuration is malformed.
    pub fn rpc_addr(&self) -> SocketAddr {
        format!("{}:{}", self.host, self.rpc_port)
            .parse()
            .unwrap_or_else(|e| {
                panic!(
                    "Invalid rpc address configuration (host: {}, port: {}): {}",
                    self.host, self.rpc_port, e
                )
            })
    }

    /// Converts host and gateway port into a socket address.
    ///
    /// # Panics
    /// Panics if the host and port cannot be parsed into a valid socket
    /// address. This should only happen if the configuration is malformed.
    pub fn rest_addr(&self) -> SocketAddr {
        format!("{}:{}", self.host, self.rest_port)
            .parse()
            .unwrap_or_else(|e| {
                panic!(
                    "Invalid gateway address configuration (host: {}, port: {}): {}",
                    self.host, self.rest_port, e
                )
            })
    }

    /// Access token lifetime.
    pub fn access_token_ttl(&self) -> Duration {
        Duration::from_secs(self.access_token_ttl_secs)
    }

    /// Refresh token lifetime.
    pub fn refresh_token_ttl(&self) -> Duration {
        Duration::from_secs(self.refresh_token_ttl_secs)
    }

    /// Loads configuration from `.env` file, TOML file, and environment
    /// variables, on top of the built-in defaults.
    ///
    /// The TOML file path can be passed explicitly (`--config` on the CLI);
    /// otherwise `config/usergate.toml` is used. A missing file is silently
    /// skipped (not an error).
    ///
    /// # Errors
    /// Returns an error if the configuration is malformed or contains
    /// invalid values.
    #[allow(clippy::result_large_err)]
    pub fn load(path: Option<&Path>) -> figment::error::Result<Self> {
        use figment::providers::{Env, Format, Serialized, Toml};
        use figment::Figment;

        // Attempt to load .env file (silently ignore if it doesn't exist)
        let _ = dotenvy::dotenv();

        let path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));

        Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("USERGATE_").split("__"))
            .extract()
    }

    /// Validates the configuration for production readiness.
    ///
    /// # Errors
    /// Returns an error message if the configuration is invalid.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.access_token_ttl_secs == 0 {
            return Err("access_token_ttl_secs cannot be zero".to_string());
        }

        if self.refresh_token_ttl_secs == 0 {
            return Err("refresh_token_ttl_secs cannot be zero".to_string());
        }

        if self.rpc_port != 0 && self.rpc_port == self.rest_port {
            return Err(format!(
                "rpc_port and rest_port must differ, both are {}",
                self.rpc_port
            ));
        }

        if self.environment == Environment::Prod && self.database_url.is_empty() {
            return Err("database_url must be set in prod".to_string());
        }

        Ok(())
    }
}

/// Token signing secrets, supplied via the process environment only.
///
/// Deliberately no `Debug` implementation so the key material stays out of
/// logs and panic messages.
#[derive(Clone)]
pub struct Secrets {
    /// Access-token signing key material.
    pub access_token_secret: Vec<u8>,
    /// Refresh-token signing key material.
    pub refresh_token_secret: Vec<u8>,
}

impl Secrets {
    /// Creates secrets from raw key material.
    pub fn new(access: impl Into<Vec<u8>>, refresh: impl Into<Vec<u8>>) -> Self {
        Self {
            access_token_secret: access.into(),
            refresh_token_secret: refresh.into(),
        }
    }

    /// Reads both signing secrets from the environment.
    ///
    /// # Errors
    /// Returns [`Error::Config`] if either variable is unset or empty. An
    /// empty signing key would silently produce forgeable tokens.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            access_token_secret: read_secret(ACCESS_TOKEN_SECRET_ENV)?,
            refresh_token_secret: read_secret(REFRESH_TOKEN_SECRET_ENV)?,
        })
    }
}

fn read_secret(key: &'static str) -> Result<Vec<u8>> {
    match std::env::var(key) {
        Ok(value) if !value.is_empty() => Ok(value.into_bytes()),
        _ => Err(Error::Config(format!(
            "{key} must be set to a non-empty secret"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = AppConfig::default();

        assert_eq!(config.rpc_port, 50051);
        assert_eq!(config.rest_port, 8080);
        assert_eq!(config.access_token_ttl(), Duration::from_secs(30 * 60));
        assert_eq!(config.refresh_token_ttl(), Duration::from_secs(24 * 60 * 60));
        assert_eq!(config.environment, Environment::Dev);
    }

    #[test]
    fn default_config_validates() {
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_ttl_is_rejected() {
        let config = AppConfig {
            access_token_ttl_secs: 0,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn colliding_ports_are_rejected() {
        let config = AppConfig {
            rpc_port: 8080,
            rest_port: 8080,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn prod_requires_database_url() {
        let config = AppConfig {
            environment: Environment::Prod,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn addresses_parse_from_host_and_port() {
        let config = AppConfig::default();
        assert_eq!(config.rpc_addr().port(), 50051);
        assert_eq!(config.rest_addr().port(), 8080);
    }
}
