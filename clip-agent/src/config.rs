//! Configuration for the peer agent.

use serde::Deserialize;
use std::time::Duration;

/// Peer agent configuration.
///
/// Deserializable from the `[peer]` table of a config file; every field has
/// a default.
#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    /// Relay URL, `ws://host:port`.
    #[serde(default = "default_relay_url")]
    pub relay_url: String,
    /// Host name placed in outbound messages (default: this machine's name).
    #[serde(default = "default_host")]
    pub host: String,
    /// Clipboard poll interval in milliseconds (default: 500).
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Delay between reconnection attempts in milliseconds (default: 2000).
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,
}

// Default value functions
fn default_relay_url() -> String {
    "ws://127.0.0.1:8765".to_string()
}

fn default_host() -> String {
    let name = gethostname::gethostname().to_string_lossy().into_owned();
    if name.is_empty() {
        "unknown".to_string()
    } else {
        name
    }
}

fn default_poll_interval_ms() -> u64 {
    500
}

fn default_reconnect_delay_ms() -> u64 {
    2000
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            relay_url: default_relay_url(),
            host: default_host(),
            poll_interval_ms: default_poll_interval_ms(),
            reconnect_delay_ms: default_reconnect_delay_ms(),
        }
    }
}

impl AgentConfig {
    /// Default configuration pointed at `relay_url`.
    pub fn new(relay_url: &str) -> Self {
        Self {
            relay_url: relay_url.to_string(),
            ..Self::default()
        }
    }

    /// Set the host name.
    pub fn with_host(mut self, host: &str) -> Self {
        self.host = host.to_string();
        self
    }

    /// Set the poll interval.
    pub fn with_poll_interval_ms(mut self, ms: u64) -> Self {
        self.poll_interval_ms = ms;
        self
    }

    /// Set the reconnect delay.
    pub fn with_reconnect_delay_ms(mut self, ms: u64) -> Self {
        self.reconnect_delay_ms = ms;
        self
    }

    /// Poll interval as a Duration.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Reconnect delay as a Duration.
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    /// Check values that parse but cannot work.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.relay_url.starts_with("ws://") || self.relay_url.starts_with("wss://")) {
            return Err(ConfigError::Invalid(format!(
                "relay URL must start with ws:// or wss://, got '{}'",
                self.relay_url
            )));
        }
        if self.host.trim().is_empty() {
            return Err(ConfigError::Invalid("host must not be empty".into()));
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "poll interval must be greater than zero".into(),
            ));
        }
        if self.reconnect_delay_ms == 0 {
            return Err(ConfigError::Invalid(
                "reconnect delay must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A value is out of range.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = AgentConfig::default();
        assert_eq!(config.relay_url, "ws://127.0.0.1:8765");
        assert_eq!(config.poll_interval(), Duration::from_millis(500));
        assert_eq!(config.reconnect_delay(), Duration::from_secs(2));
        assert!(!config.host.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn builder_pattern() {
        let config = AgentConfig::new("ws://relay.lan:9000")
            .with_host("laptop")
            .with_poll_interval_ms(250)
            .with_reconnect_delay_ms(100);

        assert_eq!(config.relay_url, "ws://relay.lan:9000");
        assert_eq!(config.host, "laptop");
        assert_eq!(config.poll_interval_ms, 250);
        assert_eq!(config.reconnect_delay_ms, 100);
    }

    #[test]
    fn from_toml_table() {
        let config: AgentConfig = toml::from_str(
            r#"
relay_url = "ws://10.0.0.2:8765"
host = "desk"
poll_interval_ms = 1000
"#,
        )
        .unwrap();

        assert_eq!(config.relay_url, "ws://10.0.0.2:8765");
        assert_eq!(config.host, "desk");
        assert_eq!(config.poll_interval_ms, 1000);
        assert_eq!(config.reconnect_delay_ms, 2000);
    }

    #[test]
    fn zero_intervals_rejected() {
        let config = AgentConfig::new("ws://relay").with_poll_interval_ms(0);
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let config = AgentConfig::new("ws://relay").with_reconnect_delay_ms(0);
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn non_websocket_url_rejected() {
        for url in ["http://relay:8765", "relay:8765", ""] {
            let config = AgentConfig::new(url);
            assert!(config.validate().is_err(), "{} should be rejected", url);
        }
        assert!(AgentConfig::new("wss://relay").validate().is_ok());
    }

    #[test]
    fn empty_host_rejected() {
        let config = AgentConfig::new("ws://relay").with_host("  ");
        assert!(config.validate().is_err());
    }
}
