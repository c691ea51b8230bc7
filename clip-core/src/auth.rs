//! Message authentication for clipsync.
//!
//! Every wire message carries `sig`, an HMAC-SHA256 over the JSON
//! serialization of all its other fields, keyed by the shared secret.
//!
//! # Security Notes
//!
//! - Authentication only: payloads travel in cleartext.
//! - An [`Authenticator`] cannot be built from an empty secret, so a process
//!   without a secret cannot produce or accept any message.
//! - Tags are compared in constant time (`Mac::verify_slice`).
//! - A rejected frame produces no reply of any kind. [`Rejection`] exists for
//!   local debug tracing only.

use clip_types::{ContentHash, Envelope, Message, SyncError};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

type HmacSha256 = Hmac<Sha256>;

/// Authentication errors.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No secret configured.
    #[error("shared secret is empty")]
    EmptySecret,

    /// HMAC key setup failed.
    #[error("invalid HMAC key: {0}")]
    InvalidKey(String),

    /// The message could not be encoded for signing.
    #[error("failed to encode message: {0}")]
    Encode(#[from] SyncError),
}

/// Why an inbound frame was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Not a JSON object, or not a known message shape.
    Malformed,
    /// Signature missing, empty, or wrong.
    Unauthenticated,
}

/// The secret shared by the relay and every peer.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SharedSecret(Vec<u8>);

impl SharedSecret {
    /// Wrap secret bytes. Empty input is rejected.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Result<Self, AuthError> {
        let bytes = bytes.into();
        if bytes.is_empty() {
            return Err(AuthError::EmptySecret);
        }
        Ok(Self(bytes))
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

// Intentionally opaque debug to avoid logging secrets
impl std::fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SharedSecret([REDACTED])")
    }
}

/// Signs outbound messages and verifies inbound ones.
#[derive(Clone)]
pub struct Authenticator {
    /// Keyed HMAC state, cloned per operation.
    keyed: HmacSha256,
}

impl std::fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authenticator").finish_non_exhaustive()
    }
}

impl Authenticator {
    /// Create an authenticator keyed by `secret`.
    pub fn new(secret: &SharedSecret) -> Result<Self, AuthError> {
        let keyed = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|e| AuthError::InvalidKey(e.to_string()))?;
        Ok(Self { keyed })
    }

    /// Hex HMAC-SHA256 tag over `signed_bytes`. Deterministic.
    pub fn sign(&self, signed_bytes: &[u8]) -> String {
        let mut mac = self.keyed.clone();
        mac.update(signed_bytes);
        hex::encode(mac.finalize().into_bytes())
    }

    /// Check an envelope's `sig` against its other fields.
    ///
    /// Returns false for a missing, empty, non-hex or mismatched signature.
    /// Never panics.
    pub fn verify(&self, envelope: &Envelope) -> bool {
        let Some(sig) = envelope.signature() else {
            return false;
        };
        if sig.is_empty() {
            return false;
        }
        let Ok(tag) = hex::decode(sig) else {
            return false;
        };
        let Ok(signed_bytes) = envelope.signed_bytes() else {
            return false;
        };

        let mut mac = self.keyed.clone();
        mac.update(&signed_bytes);
        mac.verify_slice(&tag).is_ok()
    }

    /// Serialize and sign a message, producing the frame to send.
    ///
    /// The signature is computed once over the finished field set and
    /// appended as the last field.
    pub fn seal(&self, message: &Message) -> Result<Vec<u8>, AuthError> {
        let fields = message.to_fields()?;
        let signed_bytes = serde_json::to_vec(&fields).map_err(SyncError::Serialization)?;
        let sig = self.sign(&signed_bytes);
        Ok(Envelope::new(fields, sig).to_bytes()?)
    }

    /// Parse, verify and decode an inbound frame.
    pub fn open(&self, bytes: &[u8]) -> Result<Message, Rejection> {
        let envelope = Envelope::parse(bytes).map_err(|_| Rejection::Malformed)?;
        if !self.verify(&envelope) {
            return Err(Rejection::Unauthenticated);
        }
        envelope.into_message().map_err(|_| Rejection::Malformed)
    }
}

/// Content digest used for `hash`. Must match across relay and peers.
pub fn digest(text: &str) -> ContentHash {
    ContentHash::of(text)
}
