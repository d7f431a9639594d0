//! Application settings loaded from an optional TOML file and the environment.
//!
//! Resolution order, lowest to highest precedence: built-in defaults, the TOML
//! file (if present), then environment variables (a `.env` file is loaded into
//! the environment by `main` before this runs).

use crate::config::database::DEFAULT_DATABASE_URL;
use crate::errors::{Error, Result};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

/// Complete runtime configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerSettings,
    /// Connection pool settings
    #[serde(default)]
    pub database: DatabaseSettings,
    /// Bearer token settings
    #[serde(default)]
    pub auth: AuthSettings,
    /// Log output settings
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// HTTP server settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    /// Socket address to bind, e.g. `0.0.0.0:8080`
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    /// Upper bound on the whole handling path of one request
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

/// Connection pool settings.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    /// `sqlite://…` or `postgres://…`
    #[serde(default = "default_database_url")]
    pub url: String,
    /// Pool size for server databases (`SQLite` always uses one)
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// How long a request may wait for a pooled connection
    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,
}

/// Bearer token settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthSettings {
    /// Secret the token signing key is derived from
    #[serde(default)]
    pub token_secret: String,
}

/// Log output settings.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    /// Default filter directive when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

fn default_listen_addr() -> String {
    "0.0.0.0:8080".to_string()
}

const fn default_request_timeout_secs() -> u64 {
    60
}

fn default_database_url() -> String {
    DEFAULT_DATABASE_URL.to_string()
}

const fn default_max_connections() -> u32 {
    10
}

const fn default_acquire_timeout_secs() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
            acquire_timeout_secs: default_acquire_timeout_secs(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Loads the TOML file at `path` (if it exists) and applies process
    /// environment overrides.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::load_with(path, |key| std::env::var(key).ok())
    }

    /// Same as [`AppConfig::load`] with an injectable variable lookup.
    pub fn load_with<P, F>(path: P, lookup: F) -> Result<Self>
    where
        P: AsRef<Path>,
        F: Fn(&str) -> Option<String>,
    {
        let path_ref = path.as_ref();
        let mut config = if path_ref.exists() {
            tracing::debug!("Loading configuration from: {:?}", path_ref);
            let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
                message: format!("Failed to read config file {path_ref:?}: {e}"),
            })?;
            Self::from_toml(&contents)?
        } else {
            tracing::debug!("No config file at {:?}, using defaults", path_ref);
            Self::from_toml("")?
        };

        config.apply_overrides(lookup)?;
        config.validate()?;
        Ok(config)
    }

    /// Parses settings from TOML text; every section is optional.
    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| Error::Config {
            message: format!("Failed to parse configuration: {e}"),
        })
    }

    fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("DATABASE_URL") {
            self.database.url = url;
        }
        if let Some(addr) = lookup("LISTEN_ADDR") {
            self.server.listen_addr = addr;
        } else if let Some(port) = lookup("API_PORT") {
            self.server.listen_addr = format!("0.0.0.0:{port}");
        }
        if let Some(secret) = lookup("TOKEN_SECRET") {
            self.auth.token_secret = secret;
        }
        if let Some(level) = lookup("LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(json) = lookup("LOG_JSON") {
            self.logging.json = parse_var("LOG_JSON", &json)?;
        }
        if let Some(secs) = lookup("REQUEST_TIMEOUT_SECS") {
            self.server.request_timeout_secs = parse_var("REQUEST_TIMEOUT_SECS", &secs)?;
        }
        if let Some(max) = lookup("DB_MAX_CONNECTIONS") {
            self.database.max_connections = parse_var("DB_MAX_CONNECTIONS", &max)?;
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.auth.token_secret.trim().is_empty() {
            return Err(Error::Config {
                message: "TOKEN_SECRET must be set (env or [auth] token_secret)".to_string(),
            });
        }
        if self.server.request_timeout_secs == 0 {
            return Err(Error::Config {
                message: "request_timeout_secs must be greater than zero".to_string(),
            });
        }
        self.listen_addr()?;
        Ok(())
    }

    /// Parsed listen address.
    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.server.listen_addr.parse().map_err(|e| Error::Config {
            message: format!("Invalid listen address '{}': {e}", self.server.listen_addr),
        })
    }

    /// Per-request deadline.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_secs)
    }
}

fn parse_var<T>(name: &str, raw: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e| Error::Config {
        message: format!("Invalid value for {name} ('{raw}'): {e}"),
    })
}
