//! # clipsync-relay
//!
//! Broadcast relay for clipsync.
//!
//! This crate implements a relay server that:
//! - Accepts WebSocket connections from any number of peers
//! - Verifies the HMAC signature on every inbound frame
//! - Forwards each accepted `clip` frame, byte for byte, to every other peer
//! - Keeps no state beyond the set of live connections
//!
//! ## Architecture
//!
//! ```text
//! Peer A ──┐                        ┌── Peer B
//!          │   ws://relay:8765      │
//!          ├───────────────────────►│
//!          │                        │
//!      ┌───┴────────────────────────┴───┐
//!      │          clipsync-relay        │
//!      │  ┌──────────────────────────┐  │
//!      │  │ DashMap<ConnectionId, …> │  │
//!      │  └──────────────────────────┘  │
//!      └────────────────────────────────┘
//! ```
//!
//! ## Protocol
//!
//! - `hello` → accepted, no action
//! - `clip` → forwarded to every other open connection
//! - anything unsigned, mis-signed or malformed → dropped without reply

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod protocol;
pub mod server;
pub mod session;

pub use config::{Config, ConfigError};
pub use error::RelayError;
pub use protocol::RelayServer;
pub use server::{ConnectionId, FrameOutcome, Relay, RelayMetrics};
