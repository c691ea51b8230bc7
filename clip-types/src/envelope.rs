//! Envelope - the outer wire object as received, before any trust decision.
//!
//! The signature covers every field of the object except `sig`, in the order
//! the fields appear on the wire. Keeping the raw field map (rather than a
//! typed re-serialization) means a verifier signs exactly what the sender
//! signed, including any field it does not itself understand.

use serde_json::{Map, Value};

use crate::{Message, SyncError};

/// Name of the signature field. Always the last field on the wire.
pub const SIG_FIELD: &str = "sig";

/// A wire object split into its signed fields and its signature.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    fields: Map<String, Value>,
    sig: Option<Value>,
}

impl Envelope {
    /// Wrap a field set with the signature computed over it.
    pub fn new(fields: Map<String, Value>, sig: String) -> Self {
        Self {
            fields,
            sig: Some(Value::String(sig)),
        }
    }

    /// Parse raw frame bytes. Anything other than a JSON object fails.
    pub fn parse(bytes: &[u8]) -> Result<Self, SyncError> {
        let value: Value = serde_json::from_slice(bytes).map_err(SyncError::Deserialization)?;
        let Value::Object(mut fields) = value else {
            return Err(SyncError::NotAnObject);
        };
        let sig = fields.shift_remove(SIG_FIELD);
        Ok(Self { fields, sig })
    }

    /// The signed fields, in wire order.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// The signature, if present and a string.
    pub fn signature(&self) -> Option<&str> {
        self.sig.as_ref().and_then(Value::as_str)
    }

    /// The exact bytes the signature is computed over.
    pub fn signed_bytes(&self) -> Result<Vec<u8>, SyncError> {
        serde_json::to_vec(&self.fields).map_err(SyncError::Serialization)
    }

    /// Serialize for sending: the signed fields followed by `sig`.
    pub fn to_bytes(&self) -> Result<Vec<u8>, SyncError> {
        let mut wire = self.fields.clone();
        if let Some(sig) = &self.sig {
            wire.insert(SIG_FIELD.to_string(), sig.clone());
        }
        serde_json::to_vec(&wire).map_err(SyncError::Serialization)
    }

    /// Typed decode of the signed fields.
    ///
    /// Callers must check the signature first; this does not.
    pub fn into_message(self) -> Result<Message, SyncError> {
        Message::from_fields(self.fields)
    }
}
