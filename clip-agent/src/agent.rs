//! PeerAgent - keeps one machine's clipboard in sync through the relay.
//!
//! # Architecture
//!
//! Two loops share the agent:
//!
//! ```text
//!  connection loop: connect → hello → recv ─► handle_inbound ─► Clipboard::write
//!                      ▲                │
//!                      └── delay ◄──────┘ (closed / error)
//!
//!  poll loop:       tick → Clipboard::read ─► poll_once ─► Transport::send
//! ```
//!
//! The loops meet at the [`EchoGuard`] (behind a mutex) and the transport.
//! Connection lifecycle bookkeeping goes through the pure
//! [`ConnectionState`] machine from clip-core.

use clip_core::{digest, Action, Authenticator, ConnectionState, EchoGuard, Event, Rejection};
use clip_types::Message;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::clipboard::Clipboard;
use crate::config::{AgentConfig, ConfigError};
use crate::transport::{Transport, TransportError};

/// Agent errors.
#[derive(Debug, Error)]
pub enum AgentError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Transport error.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Signing error.
    #[error("auth error: {0}")]
    Auth(#[from] clip_core::AuthError),
}

/// What happened to one inbound frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InboundOutcome {
    /// Unparseable or failed verification. Dropped silently.
    Rejected(Rejection),
    /// A hello. Nothing to do.
    Ignored,
    /// Our own content coming back. Not applied.
    Echo,
    /// Written to the local clipboard.
    Applied,
    /// The clipboard write failed. The message is dropped.
    WriteFailed,
}

/// What one poll tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Clipboard empty (or unreadable).
    Empty,
    /// Same content as last sent.
    Unchanged,
    /// Content this agent just applied from the network.
    BounceBack,
    /// Changed, but the connection is not open. Not queued.
    Offline,
    /// Sent to the relay.
    Sent,
    /// Changed, but signing or sending failed.
    SendFailed,
}

/// The peer agent.
pub struct PeerAgent<T: Transport, C: Clipboard> {
    config: AgentConfig,
    auth: Authenticator,
    transport: T,
    clipboard: C,
    guard: Mutex<EchoGuard>,
    state: Mutex<ConnectionState>,
}

impl<T: Transport, C: Clipboard> std::fmt::Debug for PeerAgent<T, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PeerAgent")
            .field("config", &self.config)
            .field("connected", &self.transport.is_connected())
            .finish_non_exhaustive()
    }
}

impl<T: Transport, C: Clipboard> PeerAgent<T, C> {
    /// Create an agent. Fails if the configuration is invalid.
    pub fn new(
        config: AgentConfig,
        auth: Authenticator,
        transport: T,
        clipboard: C,
    ) -> Result<Self, AgentError> {
        config.validate()?;
        Ok(Self {
            config,
            auth,
            transport,
            clipboard,
            guard: Mutex::new(EchoGuard::new()),
            state: Mutex::new(ConnectionState::new()),
        })
    }

    /// Get the agent configuration.
    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Get a reference to the underlying transport (for testing).
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Get a reference to the underlying clipboard (for testing).
    pub fn clipboard(&self) -> &C {
        &self.clipboard
    }

    /// Current connection state.
    pub async fn connection_state(&self) -> ConnectionState {
        self.state.lock().await.clone()
    }

    /// Current echo guard digests.
    pub async fn echo_guard(&self) -> EchoGuard {
        self.guard.lock().await.clone()
    }

    /// Feed an event to the state machine and return the resulting actions.
    async fn transition(&self, event: Event) -> Vec<Action> {
        let mut state = self.state.lock().await;
        let (new_state, actions) = state.clone().on_event(event);
        *state = new_state;
        actions
    }

    /// One connection attempt: connect, then announce with a signed hello.
    pub async fn connect_once(&self) -> Result<(), AgentError> {
        self.attempt(Event::ConnectRequested).await
    }

    async fn attempt(&self, trigger: Event) -> Result<(), AgentError> {
        let actions = self.transition(trigger).await;
        if !actions.contains(&Action::Connect) {
            // Already connecting or connected
            return Ok(());
        }

        if let Err(e) = self.transport.connect(&self.config.relay_url).await {
            for action in self
                .transition(Event::ConnectFailed {
                    error: e.to_string(),
                })
                .await
            {
                if let Action::StartBackoff { attempt } = action {
                    tracing::warn!(
                        "Connection attempt {} to {} failed: {}",
                        attempt,
                        self.config.relay_url,
                        e
                    );
                }
            }
            return Err(e.into());
        }

        // The hello goes out under the state lock; poll_once waits on the
        // same lock, so no clip can precede the hello on a new connection.
        let mut state = self.state.lock().await;
        let (connected, actions) = state.clone().on_event(Event::ConnectSucceeded);
        for action in actions {
            if action == Action::SendHello {
                if let Err(e) = self.send_hello().await {
                    *state = connected;
                    drop(state);
                    self.drop_connection(e.to_string()).await;
                    return Err(e);
                }
            }
        }
        *state = connected;
        drop(state);

        tracing::info!("Connected to relay {}", self.config.relay_url);
        Ok(())
    }

    async fn send_hello(&self) -> Result<(), AgentError> {
        let frame = self.auth.seal(&Message::hello(self.config.host.as_str()))?;
        self.transport.send(&frame).await?;
        Ok(())
    }

    /// Close the transport and record the loss.
    async fn drop_connection(&self, reason: String) {
        let _ = self.transport.close().await;
        tracing::info!("Disconnected from relay: {}", reason);
        self.transition(Event::ConnectionLost { reason }).await;
    }

    /// Verify an inbound frame and apply it to the clipboard if appropriate.
    pub async fn handle_inbound(&self, bytes: &[u8]) -> InboundOutcome {
        let message = match self.auth.open(bytes) {
            Ok(message) => message,
            Err(rejection) => {
                tracing::debug!(
                    "Dropping inbound frame ({} bytes): {:?}",
                    bytes.len(),
                    rejection
                );
                return InboundOutcome::Rejected(rejection);
            }
        };

        let clip = match message {
            Message::Clip(clip) => clip,
            Message::Hello(hello) => {
                tracing::debug!("Ignoring hello from {}", hello.host);
                return InboundOutcome::Ignored;
            }
        };

        // Held across the write so a concurrent poll cannot read the new
        // content before it is recorded as applied.
        let mut guard = self.guard.lock().await;
        if !guard.should_apply(&clip.hash) {
            tracing::debug!("Ignoring echo of own clip {}", clip.hash);
            return InboundOutcome::Echo;
        }

        match self.clipboard.write(&clip.text).await {
            Ok(()) => {
                guard.record_applied(clip.hash);
                tracing::info!(
                    "Applied clip {} ({} bytes) from {}",
                    clip.hash,
                    clip.text.len(),
                    clip.host
                );
                InboundOutcome::Applied
            }
            Err(e) => {
                tracing::warn!("Dropping clip {} from {}: {}", clip.hash, clip.host, e);
                InboundOutcome::WriteFailed
            }
        }
    }

    /// Read the clipboard once and send it if it is new local content.
    pub async fn poll_once(&self) -> PollOutcome {
        let text = match self.clipboard.read().await {
            Ok(text) => text,
            Err(e) => {
                tracing::debug!("Clipboard read failed: {}", e);
                String::new()
            }
        };

        let hash = {
            let mut guard = self.guard.lock().await;
            let Some(hash) = guard.outbound(&text) else {
                return if text.is_empty() {
                    PollOutcome::Empty
                } else if guard.last_local() == Some(digest(&text)) {
                    PollOutcome::Unchanged
                } else {
                    PollOutcome::BounceBack
                };
            };
            if !self.transport.is_connected() || !self.state.lock().await.is_connected() {
                return PollOutcome::Offline;
            }
            guard.record_sent(hash);
            hash
        };

        let frame = match self.auth.seal(&Message::clip(self.config.host.as_str(), text)) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!("Failed to sign clip {}: {}", hash, e);
                return PollOutcome::SendFailed;
            }
        };

        match self.transport.send(&frame).await {
            Ok(()) => {
                tracing::debug!("Sent clip {} ({} bytes)", hash, frame.len());
                PollOutcome::Sent
            }
            Err(e) => {
                tracing::warn!("Failed to send clip {}: {}", hash, e);
                PollOutcome::SendFailed
            }
        }
    }

    /// Receive and handle frames until the connection closes or errors.
    ///
    /// Returns the reason the connection ended.
    async fn read_until_closed(&self) -> String {
        loop {
            match self.transport.recv().await {
                Ok(bytes) => {
                    self.handle_inbound(&bytes).await;
                }
                Err(e) => return e.to_string(),
            }
        }
    }

    /// Stay connected forever: connect, read until the connection ends, wait
    /// the reconnect delay, repeat. Never returns.
    pub async fn run_connection_loop(&self) {
        let mut trigger = Event::ConnectRequested;
        loop {
            if self.attempt(trigger).await.is_ok() {
                let reason = self.read_until_closed().await;
                self.drop_connection(reason).await;
            }

            tracing::debug!("Reconnecting in {}ms", self.config.reconnect_delay_ms);
            tokio::time::sleep(self.config.reconnect_delay()).await;
            trigger = Event::BackoffElapsed;
        }
    }

    /// Poll the clipboard at the configured interval forever.
    pub async fn run_poll_loop(&self) {
        let mut ticker = tokio::time::interval(self.config.poll_interval());
        // Missed ticks are skipped, not replayed
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            self.poll_once().await;
        }
    }

    /// Run the connection loop and the poll loop together. Never returns.
    pub async fn run(&self) {
        tracing::info!(
            "Peer {} syncing via {} (poll {}ms, reconnect {}ms)",
            self.config.host,
            self.config.relay_url,
            self.config.poll_interval_ms,
            self.config.reconnect_delay_ms
        );
        tokio::join!(self.run_connection_loop(), self.run_poll_loop());
    }
}
