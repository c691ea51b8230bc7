//! # clipsync-agent
//!
//! Peer agent for clipsync.
//!
//! Runs on each machine that shares a clipboard. It keeps a WebSocket
//! connection to the relay, polls the local clipboard, sends changes as
//! signed `clip` messages and applies verified clips from other peers.
//!
//! ## Features
//!
//! - **Signed messages**: HMAC-SHA256 over every field, shared secret
//! - **Echo suppression**: own content coming back is never re-applied
//! - **Bounce-back suppression**: applied content is never re-sent
//! - **Reconnection**: fixed-delay retry, forever
//! - **Pluggable seams**: transport (WebSocket, mock) and clipboard (system, mock)
//!
//! ## Example
//!
//! ```ignore
//! use clipsync_agent::{AgentConfig, PeerAgent, SystemClipboard, WsTransport};
//!
//! let config = AgentConfig::new("ws://192.168.1.10:8765");
//! let agent = PeerAgent::new(config, auth, WsTransport::new(), SystemClipboard::new()?)?;
//! agent.run().await;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod agent;
pub mod clipboard;
pub mod config;
pub mod transport;

pub use agent::{AgentError, InboundOutcome, PeerAgent, PollOutcome};
pub use clipboard::{Clipboard, ClipboardError, MockClipboard, SystemClipboard};
pub use config::{AgentConfig, ConfigError};
pub use transport::{MockTransport, Transport, TransportError, WsTransport, WsTransportConfig};
