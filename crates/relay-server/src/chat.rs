//! Per-message chat rules.
//!
//! Evaluation is pure: one inbound payload maps to one reply plus flags
//! telling the handler whether to enqueue the payload for fan-out and
//! whether to end the connection. Malformed input never escapes as an
//! error; it becomes a `400` reply and the connection stays open.

use relay_core::{ActionKind, Message, ProtocolError, Response, StatusCode};
use serde_json::Value;

/// What the handler should do with one inbound payload.
pub(crate) struct Verdict {
    pub(crate) response: Response,
    /// Enqueue the original raw payload for fan-out.
    pub(crate) forward: bool,
    /// Exit the receive loop after replying.
    pub(crate) disconnect: bool,
}

impl Verdict {
    fn reply(status: StatusCode) -> Self {
        Self {
            response: Response::new(status),
            forward: false,
            disconnect: false,
        }
    }
}

pub(crate) fn evaluate(payload: &[u8]) -> Verdict {
    let message = match Message::decode(payload) {
        Ok(message) => message,
        Err(err) => {
            tracing::warn!("rejecting payload: {err}");
            return Verdict::reply(StatusCode::BadRequest);
        }
    };

    match message.action() {
        ActionKind::Presence => Verdict::reply(StatusCode::Ok),
        ActionKind::Message => {
            // `to` is required but not honored for routing: delivery is a
            // literal broadcast to everyone except the sender.
            if message.field("to").and_then(Value::as_str).is_some() {
                Verdict {
                    response: Response::new(StatusCode::Ok),
                    forward: true,
                    disconnect: false,
                }
            } else {
                tracing::warn!("rejecting message: {}", ProtocolError::MissingField("to"));
                Verdict::reply(StatusCode::BadRequest)
            }
        }
        ActionKind::Quit => Verdict {
            response: Response::new(StatusCode::Ok),
            forward: false,
            disconnect: true,
        },
        unsupported => {
            tracing::warn!("rejecting unsupported action `{unsupported}`");
            Verdict::reply(StatusCode::BadRequest)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(message: Message) -> Vec<u8> {
        message.encode().unwrap()
    }

    #[test]
    fn presence_is_acked_without_forwarding() {
        let verdict = evaluate(&raw(Message::new(ActionKind::Presence)));
        assert_eq!(verdict.response.status(), StatusCode::Ok);
        assert!(!verdict.forward);
        assert!(!verdict.disconnect);
    }

    #[test]
    fn message_with_to_is_forwarded() {
        let verdict = evaluate(&raw(
            Message::new(ActionKind::Message)
                .with_field("to", "all")
                .with_field("message", "hi"),
        ));
        assert_eq!(verdict.response.status(), StatusCode::Ok);
        assert!(verdict.forward);
    }

    #[test]
    fn message_without_to_is_rejected() {
        let verdict = evaluate(&raw(Message::new(ActionKind::Message).with_field("message", "hi")));
        assert_eq!(verdict.response.status(), StatusCode::BadRequest);
        assert!(!verdict.forward);
        assert!(!verdict.disconnect);
    }

    #[test]
    fn non_string_to_is_rejected() {
        let verdict = evaluate(&raw(Message::new(ActionKind::Message).with_field("to", 7)));
        assert_eq!(verdict.response.status(), StatusCode::BadRequest);
        assert!(!verdict.forward);
    }

    #[test]
    fn quit_is_acked_and_disconnects() {
        let verdict = evaluate(&raw(Message::new(ActionKind::Quit)));
        assert_eq!(verdict.response.status(), StatusCode::Ok);
        assert!(verdict.disconnect);
        assert!(!verdict.forward);
    }

    #[test]
    fn malformed_json_is_rejected_without_disconnect() {
        let verdict = evaluate(b"{this is not json");
        assert_eq!(verdict.response.status(), StatusCode::BadRequest);
        assert!(!verdict.forward);
        assert!(!verdict.disconnect);
    }

    #[test]
    fn recognized_unsupported_actions_are_rejected() {
        for action in [
            ActionKind::Probe,
            ActionKind::Authenticate,
            ActionKind::Join,
            ActionKind::Leave,
        ] {
            let verdict = evaluate(&raw(Message::new(action)));
            assert_eq!(verdict.response.status(), StatusCode::BadRequest);
            assert!(!verdict.forward);
            assert!(!verdict.disconnect);
        }
    }
}
