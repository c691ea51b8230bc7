//! Connection state machine for a clipsync peer.
//!
//! This module provides a pure, side-effect-free state machine for the peer's
//! connection lifecycle. The state machine takes events as input and produces
//! a new state plus a list of actions to execute.
//!
//! ```text
//! Disconnected ──ConnectRequested──► Connecting ──ConnectSucceeded──► Connected
//!      ▲                                 │                               │
//!      └────────── ConnectFailed ────────┘◄──────── ConnectionLost ──────┘
//! ```
//!
//! There is no terminal state: every failure schedules a fixed-delay backoff
//! and the loop goes around again. The actual I/O (connecting, sleeping,
//! sending the hello) is performed by the agent, not by this module.

/// Connection state machine - NO I/O, just state transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    /// Not connected, possibly waiting out a backoff.
    Disconnected {
        /// Consecutive failed attempts since the last successful connect.
        failures: u32,
    },
    /// Connection attempt in progress.
    Connecting {
        /// Which attempt this is since the last successful connect (1-based).
        attempt: u32,
    },
    /// Connected; messages flow in both directions.
    Connected,
}

impl ConnectionState {
    /// Create a new state machine in the Disconnected state.
    pub fn new() -> Self {
        Self::Disconnected { failures: 0 }
    }

    /// Process an event and return the new state plus actions to execute.
    ///
    /// This is a pure function - no side effects.
    pub fn on_event(self, event: Event) -> (Self, Vec<Action>) {
        match (self, event) {
            // From Disconnected
            (
                Self::Disconnected { failures },
                Event::ConnectRequested | Event::BackoffElapsed,
            ) => (
                Self::Connecting {
                    attempt: failures.saturating_add(1),
                },
                vec![Action::Connect],
            ),

            // From Connecting
            (Self::Connecting { .. }, Event::ConnectSucceeded) => {
                (Self::Connected, vec![Action::SendHello])
            }
            (Self::Connecting { attempt }, Event::ConnectFailed { .. }) => (
                Self::Disconnected { failures: attempt },
                vec![Action::StartBackoff { attempt }],
            ),

            // From Connected
            (Self::Connected, Event::ConnectionLost { .. }) => (
                Self::Disconnected { failures: 0 },
                vec![Action::StartBackoff { attempt: 0 }],
            ),

            // Invalid transitions - stay in current state
            (state, _) => (state, vec![]),
        }
    }

    /// Check if currently connected.
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }

    /// Check if a connection attempt is in flight.
    pub fn is_connecting(&self) -> bool {
        matches!(self, Self::Connecting { .. })
    }
}

impl Default for ConnectionState {
    fn default() -> Self {
        Self::new()
    }
}

/// Events that can occur in the connection lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// First start; try to connect.
    ConnectRequested,
    /// The reconnect delay has passed; try again.
    BackoffElapsed,
    /// Transport connection succeeded.
    ConnectSucceeded,
    /// Transport connection failed.
    ConnectFailed {
        /// Error message describing the failure.
        error: String,
    },
    /// An established connection closed or errored.
    ConnectionLost {
        /// Reason for disconnection.
        reason: String,
    },
}

/// Actions to be executed by the agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Initiate transport connection.
    Connect,
    /// Send a signed hello announcing this host.
    SendHello,
    /// Wait the fixed reconnect delay, then request a connection.
    StartBackoff {
        /// Failed attempt that led here (0 after losing a live connection).
        attempt: u32,
    },
}
