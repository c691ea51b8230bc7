//! Main Relay coordination.
//!
//! The Relay owns the set of live connections and decides what happens to
//! each inbound frame. Sessions do the socket I/O; everything here is
//! synchronous and testable without a network.

use crate::config::Config;
use clip_core::{Authenticator, Rejection};
use clip_types::Message;
use dashmap::DashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Identifier for one accepted connection, unique for the relay's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Raw numeric value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Operational metrics for monitoring relay activity.
///
/// All counters are monotonically increasing (reset only on restart).
#[derive(Debug, Default)]
pub struct RelayMetrics {
    /// Total connections accepted.
    pub connections_total: AtomicU64,
    /// Total frames read from any connection.
    pub frames_received: AtomicU64,
    /// Total frame copies queued to receivers.
    pub frames_forwarded: AtomicU64,
    /// Frame copies not queued because the receiver's queue was full.
    pub frames_skipped: AtomicU64,
    /// Total frames dropped (oversized, malformed, or unauthenticated).
    pub frames_dropped: AtomicU64,
}

/// What the relay did with one inbound frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Discarded without reply.
    Dropped,
    /// A valid hello. Accepted and otherwise inert.
    Hello,
    /// A valid clip, queued to this many other connections.
    Forwarded(usize),
}

/// Outbound half of one connection as seen by the relay.
#[derive(Debug)]
struct PeerLink {
    addr: SocketAddr,
    tx: mpsc::Sender<Arc<str>>,
    /// Cleared when the session starts tearing down.
    open: AtomicBool,
}

/// Main relay state.
pub struct Relay {
    config: Config,
    auth: Authenticator,
    /// Operational metrics (counters).
    metrics: RelayMetrics,
    next_id: AtomicU64,
    /// Every live connection, whether or not it has said hello.
    connections: DashMap<ConnectionId, PeerLink>,
}

impl std::fmt::Debug for Relay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Relay")
            .field("config", &self.config)
            .field("metrics", &self.metrics)
            .field("connections", &self.connections.len())
            .finish_non_exhaustive()
    }
}

impl Relay {
    /// Create a relay with no connections.
    pub fn new(config: Config, auth: Authenticator) -> Self {
        Self {
            config,
            auth,
            metrics: RelayMetrics::default(),
            next_id: AtomicU64::new(1),
            connections: DashMap::new(),
        }
    }

    /// Get the relay configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get access to the operational metrics.
    pub fn metrics(&self) -> &RelayMetrics {
        &self.metrics
    }

    /// Add a connection to the set.
    ///
    /// The connection starts receiving broadcasts immediately; no hello is
    /// required. Frames for it arrive on the returned receiver, which holds
    /// at most `limits.outbound_queue` frames.
    pub fn register(&self, addr: SocketAddr) -> (ConnectionId, mpsc::Receiver<Arc<str>>) {
        let id = ConnectionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = mpsc::channel(self.config.limits.outbound_queue);
        self.connections.insert(
            id,
            PeerLink {
                addr,
                tx,
                open: AtomicBool::new(true),
            },
        );

        tracing::debug!(
            "Registered {} from {} (total: {})",
            id,
            addr,
            self.connections.len()
        );
        (id, rx)
    }

    /// Stop sending to a connection that is closing.
    pub fn mark_closing(&self, id: ConnectionId) {
        if let Some(link) = self.connections.get(&id) {
            link.open.store(false, Ordering::Release);
        }
    }

    /// Remove a connection. Unknown ids are ignored.
    pub fn unregister(&self, id: ConnectionId) {
        if let Some((_, link)) = self.connections.remove(&id) {
            tracing::debug!(
                "Unregistered {} from {} (remaining: {})",
                id,
                link.addr,
                self.connections.len()
            );
        }
    }

    /// Number of live connections.
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Decide what to do with a frame read from `from`.
    ///
    /// Never fails: anything that is not a correctly signed known message is
    /// dropped without a reply.
    pub fn handle_frame(&self, from: ConnectionId, bytes: &[u8]) -> FrameOutcome {
        self.metrics.frames_received.fetch_add(1, Ordering::Relaxed);

        if bytes.len() > self.config.limits.max_message_size {
            tracing::debug!(
                "Dropping {} byte frame from {}: over {} byte limit",
                bytes.len(),
                from,
                self.config.limits.max_message_size
            );
            return self.dropped();
        }

        let message = match self.auth.open(bytes) {
            Ok(message) => message,
            Err(Rejection::Malformed) => {
                tracing::debug!("Dropping malformed frame from {}", from);
                return self.dropped();
            }
            Err(Rejection::Unauthenticated) => {
                tracing::debug!("Dropping unauthenticated frame from {}", from);
                return self.dropped();
            }
        };

        match message {
            Message::Hello(hello) => {
                tracing::info!("{} is {}", from, hello.host);
                FrameOutcome::Hello
            }
            Message::Clip(clip) => {
                // Forward exactly what was received
                let Ok(text) = std::str::from_utf8(bytes) else {
                    return self.dropped();
                };
                let delivered = self.broadcast(from, Arc::from(text));
                tracing::debug!(
                    "Clip {} ({} bytes) from {} forwarded to {}",
                    clip.hash,
                    clip.text.len(),
                    from,
                    delivered
                );
                FrameOutcome::Forwarded(delivered)
            }
        }
    }

    /// Queue `frame` to every open connection except `from`.
    ///
    /// Links that are closing, whose writer has gone away, or whose queue is
    /// full are skipped. Returns how many connections the frame was queued to.
    pub fn broadcast(&self, from: ConnectionId, frame: Arc<str>) -> usize {
        let mut delivered = 0;
        for entry in self.connections.iter() {
            if *entry.key() == from {
                continue;
            }
            let link = entry.value();
            if !link.open.load(Ordering::Acquire) {
                continue;
            }
            match link.tx.try_send(frame.clone()) {
                Ok(()) => delivered += 1,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    // Slow or stalled reader; it misses this clip
                    self.metrics.frames_skipped.fetch_add(1, Ordering::Relaxed);
                    tracing::debug!(
                        "Queue for {} ({}) is full, skipping",
                        entry.key(),
                        link.addr
                    );
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    // Writer task finished; session will unregister shortly
                    link.open.store(false, Ordering::Release);
                }
            }
        }

        self.metrics
            .frames_forwarded
            .fetch_add(delivered as u64, Ordering::Relaxed);
        delivered
    }

    fn dropped(&self) -> FrameOutcome {
        self.metrics.frames_dropped.fetch_add(1, Ordering::Relaxed);
        FrameOutcome::Dropped
    }
}
