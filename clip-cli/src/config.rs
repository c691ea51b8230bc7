//! Configuration file handling for clipsync.
//!
//! The optional `--config` file has a `[relay]` and a `[peer]` table. Flags
//! override file values, which override built-in defaults. The shared secret
//! never comes from this file.
//!
//! ```toml
//! [relay]
//! host = "0.0.0.0"
//! port = 8765
//! max_message_size = 1048576
//! outbound_queue = 32
//!
//! [peer]
//! host = "laptop"
//! poll_interval_ms = 500
//! reconnect_delay_ms = 2000
//! ```

use anyhow::{Context, Result};
use clip_agent::AgentConfig;
use serde::Deserialize;
use std::path::Path;

/// Contents of a config file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    /// `[relay]` table.
    #[serde(default)]
    pub relay: RelaySection,
    /// `[peer]` table.
    #[serde(default)]
    pub peer: PeerSection,
}

/// `[relay]` table. Unset fields fall back to the relay defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RelaySection {
    /// Interface to listen on.
    pub host: Option<String>,
    /// TCP port.
    pub port: Option<u16>,
    /// Largest accepted frame in bytes.
    pub max_message_size: Option<usize>,
    /// Frames queued per connection before clips skip it.
    pub outbound_queue: Option<usize>,
}

/// `[peer]` table. Unset fields fall back to the agent defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PeerSection {
    /// Host name announced to other peers.
    pub host: Option<String>,
    /// Clipboard poll interval in milliseconds.
    pub poll_interval_ms: Option<u64>,
    /// Delay between reconnection attempts in milliseconds.
    pub reconnect_delay_ms: Option<u64>,
}

impl FileConfig {
    /// Load a config file.
    pub async fn load(path: &Path) -> Result<Self> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    /// Load `path` if given, otherwise use defaults.
    pub async fn load_optional(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path).await,
            None => Ok(Self::default()),
        }
    }

    /// Relay configuration: flags, then file, then defaults.
    pub fn relay_config(
        &self,
        host: Option<String>,
        port: Option<u16>,
    ) -> Result<clip_relay::Config> {
        let mut config = clip_relay::Config::default();
        if let Some(host) = host.or_else(|| self.relay.host.clone()) {
            config.server.host = host;
        }
        if let Some(port) = port.or(self.relay.port) {
            config.server.port = port;
        }
        if let Some(size) = self.relay.max_message_size {
            config.limits.max_message_size = size;
        }
        if let Some(queue) = self.relay.outbound_queue {
            config.limits.outbound_queue = queue;
        }
        config.validate()?;
        Ok(config)
    }

    /// Peer configuration: flags, then file, then defaults.
    pub fn agent_config(
        &self,
        relay_url: &str,
        name: Option<String>,
        poll_ms: Option<u64>,
        reconnect_ms: Option<u64>,
    ) -> Result<AgentConfig> {
        let mut config = AgentConfig::new(relay_url);
        if let Some(host) = name.or_else(|| self.peer.host.clone()) {
            config.host = host;
        }
        if let Some(ms) = poll_ms.or(self.peer.poll_interval_ms) {
            config.poll_interval_ms = ms;
        }
        if let Some(ms) = reconnect_ms.or(self.peer.reconnect_delay_ms) {
            config.reconnect_delay_ms = ms;
        }
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn parse(toml: &str) -> FileConfig {
        toml::from_str(toml).unwrap()
    }

    #[test]
    fn empty_file_gives_defaults() {
        let file = parse("");
        let relay = file.relay_config(None, None).unwrap();
        assert_eq!(relay.server.bind_address(), "0.0.0.0:8765");

        let peer = file.agent_config("ws://relay:8765", None, None, None).unwrap();
        assert_eq!(peer.poll_interval_ms, 500);
        assert_eq!(peer.reconnect_delay_ms, 2000);
    }

    #[test]
    fn file_values_apply() {
        let file = parse(
            r#"
[relay]
host = "127.0.0.1"
port = 9001
max_message_size = 2048
outbound_queue = 4

[peer]
host = "desk"
poll_interval_ms = 250
"#,
        );

        let relay = file.relay_config(None, None).unwrap();
        assert_eq!(relay.server.bind_address(), "127.0.0.1:9001");
        assert_eq!(relay.limits.max_message_size, 2048);
        assert_eq!(relay.limits.outbound_queue, 4);

        let peer = file.agent_config("ws://relay", None, None, None).unwrap();
        assert_eq!(peer.host, "desk");
        assert_eq!(peer.poll_interval_ms, 250);
        assert_eq!(peer.reconnect_delay_ms, 2000);
    }

    #[test]
    fn flags_override_file() {
        let file = parse("[relay]\nport = 9001\n[peer]\nhost = \"desk\"\n");

        let relay = file.relay_config(Some("::1".into()), Some(7000)).unwrap();
        assert_eq!(relay.server.bind_address(), "[::1]:7000");

        let peer = file
            .agent_config("ws://relay", Some("laptop".into()), Some(100), Some(300))
            .unwrap();
        assert_eq!(peer.host, "laptop");
        assert_eq!(peer.poll_interval_ms, 100);
        assert_eq!(peer.reconnect_delay_ms, 300);
    }

    #[test]
    fn zero_intervals_rejected() {
        let file = FileConfig::default();
        assert!(file.agent_config("ws://relay", None, Some(0), None).is_err());
        assert!(file.agent_config("ws://relay", None, None, Some(0)).is_err());
    }

    #[test]
    fn unknown_keys_rejected() {
        let result = toml::from_str::<FileConfig>("[peer]\nsecret = \"k\"\n");
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[relay]\nport = 4000").unwrap();

        let config = FileConfig::load_optional(Some(file.path())).await.unwrap();
        assert_eq!(config.relay.port, Some(4000));
    }

    #[tokio::test]
    async fn missing_file_is_error() {
        let result = FileConfig::load(Path::new("/nonexistent/clipsync.toml")).await;
        assert!(result.is_err());
    }
}
