//! Transport abstraction for clipsync.
//!
//! This module provides a pluggable transport layer that abstracts
//! the underlying connection mechanism (WebSocket, mock for testing).
//!
//! # Design
//!
//! The transport trait is async and connection-oriented:
//! - `connect()` establishes a connection
//! - `send()` transmits one signed frame
//! - `recv()` receives one frame
//! - `close()` terminates
//!
//! `send()` and `recv()` may run at the same time from different tasks:
//! the poll loop sends while the connection loop is parked in `recv()`.
//!
//! # Example
//!
//! ```ignore
//! let transport = WsTransport::new();
//! transport.connect("ws://relay.local:8765").await?;
//! transport.send(frame).await?;
//! let inbound = transport.recv().await?;
//! ```

mod mock;
mod ws;

pub use mock::MockTransport;
pub use ws::{WsTransport, WsTransportConfig};

use async_trait::async_trait;
use thiserror::Error;

/// Transport errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Not connected.
    #[error("not connected")]
    NotConnected,

    /// Connection closed.
    #[error("connection closed")]
    ConnectionClosed,

    /// Send failed.
    #[error("send failed: {0}")]
    SendFailed(String),

    /// Receive failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(String),

    /// Connection timeout.
    #[error("connection timeout")]
    Timeout,
}

/// Transport trait for sending and receiving clipsync frames.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Connect to the relay at `address` (a `ws://` URL).
    ///
    /// Replaces any previous connection.
    async fn connect(&self, address: &str) -> Result<(), TransportError>;

    /// Send one frame.
    async fn send(&self, data: &[u8]) -> Result<(), TransportError>;

    /// Receive one frame.
    ///
    /// Blocks until data is available or the connection closes.
    async fn recv(&self) -> Result<Vec<u8>, TransportError>;

    /// Check if currently connected and open for sending.
    fn is_connected(&self) -> bool;

    /// Close the connection. Closing an idle transport is not an error.
    async fn close(&self) -> Result<(), TransportError>;
}
