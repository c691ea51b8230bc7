//! WsTransport - WebSocket transport using tokio-tungstenite.
//!
//! The socket is split after connecting. The sink and the stream sit behind
//! separate locks so a send never waits on a pending receive.

use super::{Transport, TransportError};
use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Configuration for WsTransport.
#[derive(Clone, Debug)]
pub struct WsTransportConfig {
    /// Connection (TCP + WebSocket handshake) timeout.
    pub connect_timeout: Duration,
}

impl Default for WsTransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// WebSocket client transport.
pub struct WsTransport {
    config: WsTransportConfig,
    sink: Mutex<Option<SplitSink<WsStream, WsMessage>>>,
    stream: Mutex<Option<SplitStream<WsStream>>>,
    /// The `OPEN` flag. Cleared on close and on any send or receive error.
    connected: AtomicBool,
}

impl std::fmt::Debug for WsTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WsTransport")
            .field("config", &self.config)
            .field("connected", &self.connected.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl Default for WsTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl WsTransport {
    /// Create a disconnected transport with default configuration.
    pub fn new() -> Self {
        Self::with_config(WsTransportConfig::default())
    }

    /// Create a disconnected transport with custom configuration.
    pub fn with_config(config: WsTransportConfig) -> Self {
        Self {
            config,
            sink: Mutex::new(None),
            stream: Mutex::new(None),
            connected: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl Transport for WsTransport {
    async fn connect(&self, address: &str) -> Result<(), TransportError> {
        self.connected.store(false, Ordering::Release);

        let (ws, _response) = tokio::time::timeout(
            self.config.connect_timeout,
            tokio_tungstenite::connect_async(address),
        )
        .await
        .map_err(|_| TransportError::Timeout)?
        .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;

        let (sink, stream) = ws.split();
        *self.sink.lock().await = Some(sink);
        *self.stream.lock().await = Some(stream);
        self.connected.store(true, Ordering::Release);

        tracing::debug!("WebSocket connected to {}", address);
        Ok(())
    }

    async fn send(&self, data: &[u8]) -> Result<(), TransportError> {
        if !self.is_connected() {
            return Err(TransportError::NotConnected);
        }

        let text = std::str::from_utf8(data)
            .map_err(|e| TransportError::SendFailed(e.to_string()))?
            .to_string();

        let mut guard = self.sink.lock().await;
        let sink = guard.as_mut().ok_or(TransportError::NotConnected)?;
        if let Err(e) = sink.send(WsMessage::Text(text)).await {
            self.connected.store(false, Ordering::Release);
            return Err(TransportError::SendFailed(e.to_string()));
        }
        Ok(())
    }

    async fn recv(&self) -> Result<Vec<u8>, TransportError> {
        let mut guard = self.stream.lock().await;
        let stream = guard.as_mut().ok_or(TransportError::NotConnected)?;

        loop {
            match stream.next().await {
                Some(Ok(WsMessage::Text(text))) => return Ok(text.into_bytes()),
                Some(Ok(WsMessage::Binary(bytes))) => return Ok(bytes),
                Some(Ok(WsMessage::Close(_))) | None => {
                    self.connected.store(false, Ordering::Release);
                    return Err(TransportError::ConnectionClosed);
                }
                // Ping/pong handled by tungstenite
                Some(Ok(_)) => continue,
                Some(Err(e)) => {
                    self.connected.store(false, Ordering::Release);
                    return Err(TransportError::ReceiveFailed(e.to_string()));
                }
            }
        }
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.connected.store(false, Ordering::Release);

        // Only the sink is touched here: a receive may still hold the stream
        // and will see the close handshake complete.
        if let Some(mut sink) = self.sink.lock().await.take() {
            let _ = sink.close().await;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    /// Minimal echo server: returns every text frame to the sender.
    async fn echo_server() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                tokio::spawn(async move {
                    let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
                    while let Some(Ok(msg)) = ws.next().await {
                        if msg.is_text() && ws.send(msg).await.is_err() {
                            break;
                        }
                    }
                });
            }
        });
        format!("ws://{}", addr)
    }

    #[tokio::test]
    async fn connect_send_recv_roundtrip() {
        let url = echo_server().await;
        let transport = WsTransport::new();
        assert!(!transport.is_connected());

        transport.connect(&url).await.unwrap();
        assert!(transport.is_connected());

        transport.send(br#"{"type":"hello"}"#).await.unwrap();
        let echoed = transport.recv().await.unwrap();
        assert_eq!(echoed, br#"{"type":"hello"}"#);
    }

    #[tokio::test]
    async fn connect_refused_is_error() {
        // Bind then drop to get a port with nothing listening
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let transport = WsTransport::new();
        let result = transport.connect(&format!("ws://{}", addr)).await;
        assert!(matches!(result, Err(TransportError::ConnectionFailed(_))));
        assert!(!transport.is_connected());
    }

    #[tokio::test]
    async fn send_before_connect_fails() {
        let transport = WsTransport::new();
        let result = transport.send(b"{}").await;
        assert!(matches!(result, Err(TransportError::NotConnected)));
        assert!(matches!(
            transport.recv().await,
            Err(TransportError::NotConnected)
        ));
    }

    #[tokio::test]
    async fn close_clears_open_flag() {
        let url = echo_server().await;
        let transport = WsTransport::new();
        transport.connect(&url).await.unwrap();

        transport.close().await.unwrap();
        assert!(!transport.is_connected());
        assert!(matches!(
            transport.send(b"{}").await,
            Err(TransportError::NotConnected)
        ));
        // Closing twice is fine
        transport.close().await.unwrap();
    }

    #[tokio::test]
    async fn server_close_ends_recv() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
            ws.close(None).await.unwrap();
        });

        let transport = WsTransport::new();
        transport.connect(&format!("ws://{}", addr)).await.unwrap();
        let result = transport.recv().await;
        assert!(result.is_err());
        assert!(!transport.is_connected());
    }
}
