//! Echo and bounce-back suppression for a peer.
//!
//! The relay sends every accepted clip to every peer except its sender, but a
//! peer can still see its own content come back (a second connection from the
//! same machine, or a relay that echoes). And when a peer writes a remote clip
//! to its clipboard, its own poll loop will read that content on the next tick.
//! Two digests break both loops:
//!
//! - `last_local`: the last content this peer sent. Inbound clips with this
//!   digest are echoes and are not applied.
//! - `last_applied`: the last content written from the network. A poll that
//!   reads it back is a bounce-back and is not re-sent.
//!
//! This type is plain data. Callers share it behind a lock and perform each
//! check-then-record pair under a single guard.

use clip_types::ContentHash;

/// The two digests a peer uses to avoid feedback loops.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EchoGuard {
    last_local: Option<ContentHash>,
    last_applied: Option<ContentHash>,
}

impl EchoGuard {
    /// Create a guard with no history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decide whether polled `text` should be sent.
    ///
    /// Returns the digest to send under when the text is non-empty, differs
    /// from the last content sent, and is not content just applied from the
    /// network. Connection state is the caller's concern.
    pub fn outbound(&self, text: &str) -> Option<ContentHash> {
        if text.is_empty() {
            return None;
        }
        let hash = ContentHash::of(text);
        if self.last_local == Some(hash) || self.last_applied == Some(hash) {
            return None;
        }
        Some(hash)
    }

    /// Record that content with `hash` is being sent.
    pub fn record_sent(&mut self, hash: ContentHash) {
        self.last_local = Some(hash);
    }

    /// Decide whether an inbound clip should be written to the clipboard.
    pub fn should_apply(&self, hash: &ContentHash) -> bool {
        self.last_local.as_ref() != Some(hash)
    }

    /// Record that content with `hash` was written to the clipboard.
    pub fn record_applied(&mut self, hash: ContentHash) {
        self.last_applied = Some(hash);
    }

    /// Digest of the last content sent.
    pub fn last_local(&self) -> Option<ContentHash> {
        self.last_local
    }

    /// Digest of the last content applied from the network.
    pub fn last_applied(&self) -> Option<ContentHash> {
        self.last_applied
    }
}
