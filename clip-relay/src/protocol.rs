//! WebSocket listener for the relay.
//!
//! Accepts TCP connections and spawns a [`Session`] for each one.

use crate::error::Result;
use crate::server::Relay;
use crate::session::Session;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Bound relay listener.
#[derive(Debug)]
pub struct RelayServer {
    relay: Arc<Relay>,
    listener: TcpListener,
}

impl RelayServer {
    /// Validate the relay's config and bind to its address.
    pub async fn bind(relay: Arc<Relay>) -> Result<Self> {
        relay.config().validate()?;
        let address = relay.config().server.bind_address();
        let listener = TcpListener::bind(&address).await?;
        Ok(Self { relay, listener })
    }

    /// Address actually bound (useful with port 0).
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// The relay this server feeds.
    pub fn relay(&self) -> &Arc<Relay> {
        &self.relay
    }

    /// Accept connections forever.
    pub async fn run(self) -> Result<()> {
        tracing::info!("Relay listening on ws://{}", self.local_addr()?);

        loop {
            let (stream, addr) = match self.listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    // Transient (e.g. out of file descriptors); keep serving
                    tracing::warn!("Accept failed: {}", e);
                    continue;
                }
            };

            let session = Session::new(self.relay.clone(), addr);
            // Spawn session handler - don't block the accept loop
            tokio::spawn(async move {
                if let Err(e) = session.run(stream).await {
                    tracing::warn!("Session error from {}: {}", addr, e);
                }
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::error::RelayError;
    use clip_core::{Authenticator, SharedSecret};
    use std::sync::atomic::Ordering;

    fn loopback_relay() -> Arc<Relay> {
        let mut config = Config::default();
        config.server.host = "127.0.0.1".into();
        config.server.port = 0;
        let auth = Authenticator::new(&SharedSecret::new("k").unwrap()).unwrap();
        Arc::new(Relay::new(config, auth))
    }

    #[tokio::test]
    async fn bind_to_ephemeral_port() {
        let server = RelayServer::bind(loopback_relay()).await.unwrap();
        let addr = server.local_addr().unwrap();
        assert!(addr.ip().is_loopback());
        assert_ne!(addr.port(), 0);
    }

    #[tokio::test]
    async fn accepted_connections_are_counted() {
        let server = RelayServer::bind(loopback_relay()).await.unwrap();
        let addr = server.local_addr().unwrap();
        let relay = server.relay().clone();
        tokio::spawn(server.run());

        let (_ws, _) = tokio_tungstenite::connect_async(format!("ws://{}", addr))
            .await
            .unwrap();

        for _ in 0..100 {
            if relay.connection_count() == 1 {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert_eq!(relay.connection_count(), 1);
        assert_eq!(relay.metrics().connections_total.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn bind_rejects_invalid_config() {
        let mut config = Config::default();
        config.server.host = "127.0.0.1".into();
        config.server.port = 0;
        config.limits.outbound_queue = 0;
        let auth = Authenticator::new(&SharedSecret::new("k").unwrap()).unwrap();

        let result = RelayServer::bind(Arc::new(Relay::new(config, auth))).await;
        assert!(matches!(result, Err(RelayError::Config(_))));
    }

    #[tokio::test]
    async fn bind_conflict_is_io_error() {
        let first = RelayServer::bind(loopback_relay()).await.unwrap();
        let port = first.local_addr().unwrap().port();

        let mut config = Config::default();
        config.server.host = "127.0.0.1".into();
        config.server.port = port;
        let auth = Authenticator::new(&SharedSecret::new("k").unwrap()).unwrap();
        let result = RelayServer::bind(Arc::new(Relay::new(config, auth))).await;
        assert!(matches!(result, Err(RelayError::Io(_))));
    }
}
