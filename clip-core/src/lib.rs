//! # clipsync-core
//!
//! Pure logic for clipsync (no I/O, instant tests).
//!
//! This crate implements the protocol decisions shared by the relay and the
//! peer agent without any network or clipboard I/O:
//! - [`Authenticator`] - HMAC-SHA256 signing and verification of wire messages
//! - [`EchoGuard`] - echo and bounce-back suppression for a peer
//! - [`ConnectionState`] - the peer's reconnect state machine
//!
//! The actual I/O is performed by `clipsync-relay` and `clipsync-agent`,
//! which interpret the decisions produced here.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod auth;
pub mod echo;
pub mod state;

pub use auth::{digest, AuthError, Authenticator, Rejection, SharedSecret};
pub use echo::EchoGuard;
pub use state::{Action, ConnectionState, Event};
