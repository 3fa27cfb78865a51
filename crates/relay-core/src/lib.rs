//! Wire envelope types and codec for the relay chat protocol.
//!
//! Every unit exchanged over a connection is one UTF-8 JSON object with no
//! framing bytes: a [`Message`] (discriminated by the `action` key) or a
//! [`Response`] (discriminated by the `response` key). Extra fields ride
//! alongside the discriminant and `time` and survive a round trip intact.

mod message;
mod response;

pub use message::{ActionKind, Message};
pub use response::{Response, StatusClass, StatusCode};

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Either side of the protocol, decoded by discriminant key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Envelope {
    Message(Message),
    Response(Response),
}

impl Envelope {
    /// Decode one envelope from raw JSON bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Encode this envelope as JSON bytes.
    pub fn encode(&self) -> Result<Vec<u8>, ProtocolError> {
        Ok(serde_json::to_vec(self)?)
    }
}

/// Error decoding or validating a wire envelope.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Payload is not valid JSON, or its discriminant value is not a
    /// recognized enum member.
    #[error("malformed envelope: {0}")]
    MalformedEnvelope(#[from] serde_json::Error),
    /// A field the action requires is absent or has the wrong type.
    #[error("missing required field `{0}`")]
    MissingField(&'static str),
}

/// Current UNIX timestamp in nanoseconds, the protocol's `time` unit.
pub(crate) fn now_nanos() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_picks_message_by_action_key() {
        let env = Envelope::decode(br#"{"action":"presence","time":1}"#).unwrap();
        assert!(matches!(env, Envelope::Message(_)));
    }

    #[test]
    fn envelope_picks_response_by_response_key() {
        let env = Envelope::decode(br#"{"response":200,"time":1,"alert":"OK"}"#).unwrap();
        assert!(matches!(env, Envelope::Response(_)));
    }

    #[test]
    fn envelope_rejects_garbage() {
        assert!(matches!(
            Envelope::decode(b"not json at all"),
            Err(ProtocolError::MalformedEnvelope(_))
        ));
    }
}
