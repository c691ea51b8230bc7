//! Protocol messages for clipsync.
//!
//! A [`Message`] is the typed view of a wire object once its signature has
//! been checked. Serializing a message yields its canonical field set, which
//! is exactly what gets signed.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::{ContentHash, SyncError};

/// All possible protocol messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Message {
    /// Sent by a peer on every (re)connect
    Hello(Hello),
    /// New clipboard content
    Clip(Clip),
}

impl Message {
    /// Build a `hello` for this host, timestamped now.
    pub fn hello(host: impl Into<String>) -> Self {
        Message::Hello(Hello {
            ts: now(),
            host: host.into(),
        })
    }

    /// Build a `clip` carrying `text` and its digest, timestamped now.
    pub fn clip(host: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        Message::Clip(Clip {
            ts: now(),
            host: host.into(),
            hash: ContentHash::of(&text),
            text,
        })
    }

    /// Discriminator for logging and routing.
    pub fn kind(&self) -> MessageKind {
        match self {
            Message::Hello(_) => MessageKind::Hello,
            Message::Clip(_) => MessageKind::Clip,
        }
    }

    /// Identifier of the sending host.
    pub fn host(&self) -> &str {
        match self {
            Message::Hello(h) => &h.host,
            Message::Clip(c) => &c.host,
        }
    }

    /// Creation time. Informational only, never used for ordering.
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Message::Hello(h) => h.ts,
            Message::Clip(c) => c.ts,
        }
    }

    /// The canonical field set, in wire order, without `sig`.
    pub fn to_fields(&self) -> Result<Map<String, Value>, SyncError> {
        match serde_json::to_value(self).map_err(SyncError::Serialization)? {
            Value::Object(map) => Ok(map),
            _ => Err(SyncError::NotAnObject),
        }
    }

    /// Decode a typed message from a field set whose `sig` was already removed.
    pub fn from_fields(fields: Map<String, Value>) -> Result<Self, SyncError> {
        serde_json::from_value(Value::Object(fields)).map_err(SyncError::Deserialization)
    }
}

/// Peer announcement. Accepted by the relay but otherwise inert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hello {
    /// Creation time
    #[serde(with = "iso8601")]
    pub ts: DateTime<Utc>,
    /// Sending host name
    pub host: String,
}

/// Clipboard update.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clip {
    /// Creation time
    #[serde(with = "iso8601")]
    pub ts: DateTime<Utc>,
    /// Sending host name
    pub host: String,
    /// Clipboard text
    pub text: String,
    /// Digest of `text`
    pub hash: ContentHash,
}

impl fmt::Debug for Clip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Clip")
            .field("ts", &self.ts)
            .field("host", &self.host)
            .field("text", &format!("[{} bytes REDACTED]", self.text.len()))
            .field("hash", &self.hash)
            .finish()
    }
}

/// Message type discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// `"hello"`
    Hello,
    /// `"clip"`
    Clip,
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageKind::Hello => f.write_str("hello"),
            MessageKind::Clip => f.write_str("clip"),
        }
    }
}

/// Wire timestamps carry millisecond precision, so construction truncates
/// to match what a decoded copy will hold.
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// ISO-8601 UTC with milliseconds, e.g. `2026-10-18T09:30:00.000Z`.
mod iso8601 {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hello_fields_in_wire_order() {
        let msg = Message::hello("laptop");
        let keys: Vec<_> = msg.to_fields().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["type", "ts", "host"]);
    }

    #[test]
    fn clip_fields_in_wire_order() {
        let msg = Message::clip("laptop", "hello");
        let fields = msg.to_fields().unwrap();
        let keys: Vec<_> = fields.keys().cloned().collect();
        assert_eq!(keys, vec!["type", "ts", "host", "text", "hash"]);
        assert_eq!(fields["type"], "clip");
        assert_eq!(fields["text"], "hello");
        assert_eq!(fields["hash"], ContentHash::of("hello").to_hex());
    }

    #[test]
    fn clip_hash_is_digest_of_text() {
        let Message::Clip(clip) = Message::clip("desktop", "some text") else {
            panic!("Expected Clip message");
        };
        assert_eq!(clip.hash, ContentHash::of("some text"));
    }

    #[test]
    fn timestamp_is_iso8601_millis() {
        let msg = Message::hello("laptop");
        let fields = msg.to_fields().unwrap();
        let ts = fields["ts"].as_str().unwrap();
        // 2026-10-18T09:30:00.000Z
        assert_eq!(ts.len(), 24);
        assert!(ts.ends_with('Z'));
        assert_eq!(&ts[19..20], ".");
    }

    #[test]
    fn fields_decode_back_to_message() {
        let msg = Message::clip("laptop", "hello");
        let restored = Message::from_fields(msg.to_fields().unwrap()).unwrap();
        assert_eq!(restored, msg);
    }

    #[test]
    fn unknown_type_fails_to_decode() {
        let mut fields = Message::hello("laptop").to_fields().unwrap();
        fields.insert("type".into(), Value::String("paste".into()));
        assert!(Message::from_fields(fields).is_err());
    }

    #[test]
    fn clip_without_hash_fails_to_decode() {
        let mut fields = Message::clip("laptop", "x").to_fields().unwrap();
        fields.shift_remove("hash");
        assert!(Message::from_fields(fields).is_err());
    }

    #[test]
    fn accessors_cover_both_variants() {
        let hello = Message::hello("a");
        let clip = Message::clip("b", "t");
        assert_eq!(hello.kind(), MessageKind::Hello);
        assert_eq!(clip.kind(), MessageKind::Clip);
        assert_eq!(hello.host(), "a");
        assert_eq!(clip.host(), "b");
        assert_eq!(MessageKind::Clip.to_string(), "clip");
    }

    #[test]
    fn clip_debug_redacts_text() {
        let msg = Message::clip("laptop", "super secret password");
        let debug = format!("{:?}", msg);
        assert!(debug.contains("[21 bytes REDACTED]"), "got: {}", debug);
        assert!(!debug.contains("password"));
    }
}
