//! Environment-driven configuration.
//!
//! All settings come from the process environment (a `.env` file is loaded by
//! the binaries before this module runs). `DATABASE_URL` wins when present;
//! otherwise the URL is composed from the individual `DB_*` variables.

use std::env;
use thiserror::Error;

/// Human-readable service name, used in the health response and docs page.
pub const PROJECT_NAME: &str = "Organization Directory API";

/// Service version, taken from the crate manifest.
pub const PROJECT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prefix for the versioned API surface.
pub const API_V1_PREFIX: &str = "/api/v1";

/// Placeholder API key shipped in `.env.example`. The server refuses to start
/// with this key outside debug mode.
pub const DEFAULT_API_KEY: &str = "your-secret-api-key";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingVar(&'static str),
    #[error("invalid value for {var}: {value:?}")]
    InvalidVar { var: &'static str, value: String },
}

/// Runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection string.
    pub database_url: String,
    /// Static API key expected in the `X-API-Key` header.
    pub api_key: String,
    /// Debug mode: verbose logging, weak-key refusal disabled.
    pub debug: bool,
    /// Bind address.
    pub host: String,
    /// Bind port.
    pub port: u16,
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = match env::var("DATABASE_URL") {
            Ok(url) => url,
            Err(_) => {
                let user = require_var("DB_USER")?;
                let password = require_var("DB_PASSWORD")?;
                let name = require_var("DB_NAME")?;
                let host = env_or("DB_HOST", "localhost");
                let port = parse_var::<u16>("DB_PORT", 5432)?;
                compose_database_url(&user, &password, &host, port, &name)
            }
        };

        Ok(Self {
            database_url,
            api_key: env_or("API_KEY", DEFAULT_API_KEY),
            debug: parse_bool(&env_or("DEBUG", "false")),
            host: env_or("HOST", "0.0.0.0"),
            port: parse_var::<u16>("PORT", 8000)?,
        })
    }

    /// Whether the configured API key is the shipped placeholder.
    pub fn has_default_api_key(&self) -> bool {
        self.api_key == DEFAULT_API_KEY
    }

    /// Socket address string the server binds to.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Compose a PostgreSQL URL from its parts.
pub fn compose_database_url(
    user: &str,
    password: &str,
    host: &str,
    port: u16,
    name: &str,
) -> String {
    format!("postgres://{user}:{password}@{host}:{port}/{name}")
}

fn require_var(var: &'static str) -> Result<String, ConfigError> {
    env::var(var).map_err(|_| ConfigError::MissingVar(var))
}

fn env_or(var: &str, default: &str) -> String {
    env::var(var).unwrap_or_else(|_| default.to_string())
}

fn parse_var<T: std::str::FromStr>(var: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(var) {
        Ok(value) => value
            .parse()
            .map_err(|_| ConfigError::InvalidVar { var, value }),
        Err(_) => Ok(default),
    }
}

/// Truthy values: `1`, `true`, `yes`, `on` (case-insensitive).
fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compose_url_from_parts() {
        let url = compose_database_url("app", "secret", "db", 5432, "orgdir");
        assert_eq!(url, "postgres://app:secret@db:5432/orgdir");
    }

    #[test]
    fn parse_bool_accepts_common_truthy_forms() {
        assert!(parse_bool("1"));
        assert!(parse_bool("true"));
        assert!(parse_bool("TRUE"));
        assert!(parse_bool("Yes"));
        assert!(parse_bool(" on "));
        assert!(!parse_bool("0"));
        assert!(!parse_bool("false"));
        assert!(!parse_bool(""));
    }

    #[test]
    fn default_api_key_is_flagged() {
        let config = Config {
            database_url: "postgres://localhost/test".into(),
            api_key: DEFAULT_API_KEY.into(),
            debug: false,
            host: "0.0.0.0".into(),
            port: 8000,
        };
        assert!(config.has_default_api_key());

        let config = Config {
            api_key: "something-else".into(),
            ..config
        };
        assert!(!config.has_default_api_key());
    }

    #[test]
    fn bind_addr_joins_host_and_port() {
        let config = Config {
            database_url: "postgres://localhost/test".into(),
            api_key: "k".into(),
            debug: false,
            host: "127.0.0.1".into(),
            port: 8080,
        };
        assert_eq!(config.bind_addr(), "127.0.0.1:8080");
    }
}
