//! # clipsync-types
//!
//! Wire format types for the clipsync clipboard relay protocol.
//!
//! This crate provides the foundational types used across all clipsync crates:
//! - [`Message`] - Protocol messages (Hello, Clip)
//! - [`Envelope`] - A received wire object split into signed fields and `sig`
//! - [`ContentHash`] - SHA-256 digest of clipboard text
//! - [`SyncError`] - Error types
//!
//! ## Wire format
//!
//! One JSON object per WebSocket frame, fields in canonical order:
//!
//! ```text
//! {"type":"clip","ts":"2026-10-18T09:30:00.000Z","host":"laptop",
//!  "text":"hello","hash":"2cf24d...","sig":"9f86d0..."}
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod envelope;
mod error;
mod hash;
mod messages;

pub use envelope::{Envelope, SIG_FIELD};
pub use error::SyncError;
pub use hash::ContentHash;
pub use messages::{Clip, Hello, Message, MessageKind};
