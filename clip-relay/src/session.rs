//! Per-connection session management.
//!
//! Each accepted TCP stream gets a Session: WebSocket upgrade, a writer task
//! draining the connection's broadcast channel, and a reader loop handing
//! frames to the Relay.

use crate::error::Result;
use crate::server::{ConnectionId, Relay};
use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::WebSocketStream;

/// A per-connection session.
pub struct Session {
    relay: Arc<Relay>,
    addr: SocketAddr,
}

impl Session {
    /// Create a new session for a connection from `addr`.
    pub fn new(relay: Arc<Relay>, addr: SocketAddr) -> Self {
        Self { relay, addr }
    }

    /// Run the session until the peer disconnects.
    ///
    /// Fails only if the WebSocket handshake fails. Errors after that end
    /// this session and nothing else.
    pub async fn run<S>(self, stream: S) -> Result<()>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let ws = tokio_tungstenite::accept_async(stream).await?;
        self.relay
            .metrics()
            .connections_total
            .fetch_add(1, Ordering::Relaxed);
        tracing::info!("New connection from {}", self.addr);

        let (id, outbound) = self.relay.register(self.addr);
        let (sink, stream) = ws.split();

        let writer = tokio::spawn(write_loop(self.relay.clone(), id, sink, outbound));
        let reason = self.read_loop(id, stream).await;

        self.relay.mark_closing(id);
        self.relay.unregister(id);
        writer.abort();

        tracing::info!("{} ({}) disconnected: {}", id, self.addr, reason);
        Ok(())
    }

    /// Read frames until close or error. Returns why the loop ended.
    async fn read_loop<S>(
        &self,
        id: ConnectionId,
        mut stream: futures_util::stream::SplitStream<WebSocketStream<S>>,
    ) -> String
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        while let Some(frame) = stream.next().await {
            match frame {
                Ok(WsMessage::Text(text)) => {
                    self.relay.handle_frame(id, text.as_bytes());
                }
                Ok(WsMessage::Binary(bytes)) => {
                    self.relay.handle_frame(id, &bytes);
                }
                Ok(WsMessage::Close(_)) => return "closed by peer".to_string(),
                // Ping/pong are answered by tungstenite
                Ok(_) => {}
                Err(e) => return format!("read error: {}", e),
            }
        }
        "stream ended".to_string()
    }
}

/// Send queued frames to the peer until the channel closes or a send fails.
async fn write_loop<S>(
    relay: Arc<Relay>,
    id: ConnectionId,
    mut sink: futures_util::stream::SplitSink<WebSocketStream<S>, WsMessage>,
    mut outbound: mpsc::Receiver<Arc<str>>,
) where
    S: AsyncRead + AsyncWrite + Unpin,
{
    while let Some(frame) = outbound.recv().await {
        if let Err(e) = sink.send(WsMessage::Text(frame.to_string())).await {
            tracing::warn!("Send to {} failed: {}", id, e);
            relay.mark_closing(id);
            break;
        }
    }
    let _ = sink.close().await;
}
