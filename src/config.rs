//! Configuration module for filerelay.

use serde::Deserialize;
use std::path::Path;

use crate::{RelayError, Result};

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Allowed CORS origins (empty = any origin, no credentials).
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8081
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: vec![],
        }
    }
}

/// File storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Root directory for stored files.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    /// Maximum upload size in megabytes (0 = unlimited).
    #[serde(default)]
    pub max_upload_size_mb: u64,
}

fn default_data_dir() -> String {
    "data".to_string()
}

impl StorageConfig {
    /// Upload limit in bytes, `None` when uploads are unbounded.
    pub fn max_upload_bytes(&self) -> Option<u64> {
        match self.max_upload_size_mb {
            0 => None,
            mb => Some(mb.saturating_mul(1024 * 1024)),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            max_upload_size_mb: 0,
        }
    }
}

/// Outbound forwarding configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ForwardConfig {
    /// Connect timeout in seconds (0 = transport default).
    #[serde(default)]
    pub connect_timeout_secs: u64,
    /// User agent sent on forwarded requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_user_agent() -> String {
    concat!("filerelay/", env!("CARGO_PKG_VERSION")).to_string()
}

impl Default for ForwardConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 0,
            user_agent: default_user_agent(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/filerelay.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Storage configuration.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Forwarding configuration.
    #[serde(default)]
    pub forward: ForwardConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(RelayError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| RelayError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `FILERELAY_DATA_DIR`: Override the storage root
    /// - `FILERELAY_PORT`: Override the listening port
    pub fn apply_env_overrides(&mut self) {
        if let Ok(data_dir) = std::env::var("FILERELAY_DATA_DIR") {
            if !data_dir.is_empty() {
                self.storage.data_dir = data_dir;
            }
        }

        if let Ok(port) = std::env::var("FILERELAY_PORT") {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => tracing::warn!(value = %port, "Ignoring invalid FILERELAY_PORT"),
            }
        }
    }

    /// Validate the configuration.
    ///
    /// Returns an error if:
    /// - The port is 0
    /// - The data directory is empty
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(RelayError::Config("server.port must not be 0".to_string()));
        }
        if self.storage.data_dir.trim().is_empty() {
            return Err(RelayError::Config(
                "storage.data_dir must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
