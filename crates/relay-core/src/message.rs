//! Client-originated messages.

use crate::{ProtocolError, now_nanos};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// The full action vocabulary of the wire protocol.
///
/// Every variant decodes successfully; only the [`is_supported`] subset is
/// interpreted by the server, the rest are answered with `400`.
///
/// [`is_supported`]: ActionKind::is_supported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Presence,
    Probe,
    Message,
    Quit,
    Authenticate,
    Join,
    Leave,
}

impl ActionKind {
    /// Whether the server interprets this action beyond acknowledging it.
    pub fn is_supported(self) -> bool {
        matches!(self, Self::Presence | Self::Message | Self::Quit)
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Presence => "presence",
            Self::Probe => "probe",
            Self::Message => "message",
            Self::Quit => "quit",
            Self::Authenticate => "authenticate",
            Self::Join => "join",
            Self::Leave => "leave",
        };
        f.write_str(name)
    }
}

/// One client-to-server message: an action, a timestamp, and whatever extra
/// fields the action carries. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    action: ActionKind,
    /// UNIX nanoseconds; stamped at construction when the sender omits it.
    #[serde(default = "now_nanos")]
    time: i64,
    #[serde(flatten)]
    fields: Map<String, Value>,
}

impl Message {
    /// Create a message stamped with the current time.
    pub fn new(action: ActionKind) -> Self {
        Self {
            action,
            time: now_nanos(),
            fields: Map::new(),
        }
    }

    /// Attach an extra field (builder style).
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn action(&self) -> ActionKind {
        self.action
    }

    pub fn time(&self) -> i64 {
        self.time
    }

    /// Look up an extra field by name.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Decode a message from raw JSON bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Encode this message as JSON bytes.
    pub fn encode(&self) -> Result<Vec<u8>, ProtocolError> {
        Ok(serde_json::to_vec(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn roundtrip_preserves_every_field() {
        let msg = Message::new(ActionKind::Message)
            .with_field("to", "all")
            .with_field("message", "hi there");
        let decoded = Message::decode(&msg.encode().unwrap()).unwrap();
        assert_eq!(msg, decoded);
    }

    #[test]
    fn decode_reads_nested_fields() {
        let raw = br#"{"action":"presence","time":42,"type":"status","user":{"account_name":"a","status":"online"}}"#;
        let msg = Message::decode(raw).unwrap();
        assert_eq!(msg.action(), ActionKind::Presence);
        assert_eq!(msg.time(), 42);
        assert_eq!(msg.field("user").unwrap()["account_name"], json!("a"));
    }

    #[test]
    fn missing_time_defaults_to_now() {
        let msg = Message::decode(br#"{"action":"quit"}"#).unwrap();
        assert!(msg.time() > 0);
    }

    #[test]
    fn unknown_action_fails_decode() {
        assert!(Message::decode(br#"{"action":"dance","time":1}"#).is_err());
    }

    #[test]
    fn recognized_but_unsupported_actions_decode() {
        for raw in [
            br#"{"action":"probe","time":1}"#.as_slice(),
            br#"{"action":"authenticate","time":1}"#,
            br#"{"action":"join","time":1}"#,
            br#"{"action":"leave","time":1}"#,
        ] {
            let msg = Message::decode(raw).unwrap();
            assert!(!msg.action().is_supported());
        }
    }

    #[test]
    fn supported_subset() {
        assert!(ActionKind::Presence.is_supported());
        assert!(ActionKind::Message.is_supported());
        assert!(ActionKind::Quit.is_supported());
        assert!(!ActionKind::Probe.is_supported());
    }
}
