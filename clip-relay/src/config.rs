//! Configuration loading for clipsync-relay.
//!
//! Configuration is loaded from an optional TOML file; every field has a
//! default. The shared secret is deliberately not part of this file.

use serde::Deserialize;
use std::path::PathBuf;

/// Root configuration for clipsync-relay.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Limits configuration.
    #[serde(default)]
    pub limits: LimitsConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Interface to listen on (default: 0.0.0.0).
    #[serde(default = "default_host")]
    pub host: String,
    /// TCP port to listen on (default: 8765).
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Limits configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    /// Largest frame the relay will look at, in bytes (default: 1MB).
    /// Larger frames are dropped unparsed.
    #[serde(default = "default_max_message_size")]
    pub max_message_size: usize,
    /// Frames waiting to be written to one connection (default: 32).
    /// When a connection's queue is full, further clips skip it.
    #[serde(default = "default_outbound_queue")]
    pub outbound_queue: usize,
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8765
}

fn default_max_message_size() -> usize {
    1024 * 1024 // 1MB
}

fn default_outbound_queue() -> usize {
    32
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_message_size: default_max_message_size(),
            outbound_queue: default_outbound_queue(),
        }
    }
}

impl ServerConfig {
    /// `host:port` suitable for `TcpListener::bind`.
    pub fn bind_address(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            // Bare IPv6 literal
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or validated.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check values that parse but cannot work.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.host.trim().is_empty() {
            return Err(ConfigError::Invalid("server.host must not be empty".into()));
        }
        if self.limits.max_message_size == 0 {
            return Err(ConfigError::Invalid(
                "limits.max_message_size must be greater than zero".into(),
            ));
        }
        if self.limits.outbound_queue == 0 {
            return Err(ConfigError::Invalid(
                "limits.outbound_queue must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Failed to parse configuration file.
    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying TOML parse error.
        source: toml::de::Error,
    },
    /// A value is out of range.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}
