//! Server-originated responses and the status code taxonomy.

use crate::{ProtocolError, now_nanos};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Wire status codes, grouped HTTP-style into classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
pub enum StatusCode {
    // 1xx: informational
    NotifyBasic = 100,
    NotifyImportant = 101,
    // 2xx: success
    Ok = 200,
    Created = 201,
    Accepted = 202,
    // 4xx: client error
    BadRequest = 400,
    LoginRequired = 401,
    BadLogin = 402,
    Forbidden = 403,
    NotFound = 404,
    Conflict = 409,
    Gone = 410,
    // 5xx: server error
    ServerError = 500,
}

/// The class a status code belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    Info,
    Success,
    ClientError,
    ServerError,
}

impl StatusCode {
    pub fn class(self) -> StatusClass {
        match u16::from(self) {
            100..=199 => StatusClass::Info,
            200..=299 => StatusClass::Success,
            400..=499 => StatusClass::ClientError,
            _ => StatusClass::ServerError,
        }
    }

    pub fn is_error(self) -> bool {
        matches!(
            self.class(),
            StatusClass::ClientError | StatusClass::ServerError
        )
    }

    /// The single JSON key carrying this code's human-readable text:
    /// `alert` for info/success, `error` for the error classes.
    pub fn canonical_field(self) -> &'static str {
        if self.is_error() { "error" } else { "alert" }
    }

    /// Canonical human-readable text for this code.
    pub fn reason(self) -> &'static str {
        match self {
            Self::NotifyBasic => "Basic notification",
            Self::NotifyImportant => "Important notification",
            Self::Ok => "OK",
            Self::Created => "Created",
            Self::Accepted => "Accepted",
            Self::BadRequest => "Bad request or malformed JSON object",
            Self::LoginRequired => "Not authenticated",
            Self::BadLogin => "Wrong login or password",
            Self::Forbidden => "Account is banned",
            Self::NotFound => "No such user or chat on this server",
            Self::Conflict => "A connection with this login already exists",
            Self::Gone => "Recipient exists but is offline",
            Self::ServerError => "Server error",
        }
    }
}

impl From<StatusCode> for u16 {
    fn from(code: StatusCode) -> Self {
        code as u16
    }
}

impl TryFrom<u16> for StatusCode {
    type Error = UnknownStatusCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        let code = match value {
            100 => Self::NotifyBasic,
            101 => Self::NotifyImportant,
            200 => Self::Ok,
            201 => Self::Created,
            202 => Self::Accepted,
            400 => Self::BadRequest,
            401 => Self::LoginRequired,
            402 => Self::BadLogin,
            403 => Self::Forbidden,
            404 => Self::NotFound,
            409 => Self::Conflict,
            410 => Self::Gone,
            500 => Self::ServerError,
            other => return Err(UnknownStatusCode(other)),
        };
        Ok(code)
    }
}

/// Error for integers outside the status taxonomy.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown status code: {0}")]
pub struct UnknownStatusCode(pub u16);

/// One server-to-client response: a status code, a timestamp, the code's
/// canonical text, and any extra fields. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    #[serde(rename = "response")]
    status: StatusCode,
    #[serde(default = "now_nanos")]
    time: i64,
    #[serde(flatten)]
    fields: Map<String, Value>,
}

impl Response {
    /// Create a response carrying the code's canonical `alert`/`error` text.
    pub fn new(status: StatusCode) -> Self {
        let mut fields = Map::new();
        fields.insert(
            status.canonical_field().to_string(),
            Value::from(status.reason()),
        );
        Self {
            status,
            time: now_nanos(),
            fields,
        }
    }

    /// Attach an extra field (builder style).
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn time(&self) -> i64 {
        self.time
    }

    /// Look up an extra field by name.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Decode a response from raw JSON bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Encode this response as JSON bytes.
    pub fn encode(&self) -> Result<Vec<u8>, ProtocolError> {
        Ok(serde_json::to_vec(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn every_code_maps_to_exactly_one_canonical_field() {
        let table = [
            (StatusCode::NotifyBasic, StatusClass::Info, "alert"),
            (StatusCode::NotifyImportant, StatusClass::Info, "alert"),
            (StatusCode::Ok, StatusClass::Success, "alert"),
            (StatusCode::Created, StatusClass::Success, "alert"),
            (StatusCode::Accepted, StatusClass::Success, "alert"),
            (StatusCode::BadRequest, StatusClass::ClientError, "error"),
            (StatusCode::LoginRequired, StatusClass::ClientError, "error"),
            (StatusCode::BadLogin, StatusClass::ClientError, "error"),
            (StatusCode::Forbidden, StatusClass::ClientError, "error"),
            (StatusCode::NotFound, StatusClass::ClientError, "error"),
            (StatusCode::Conflict, StatusClass::ClientError, "error"),
            (StatusCode::Gone, StatusClass::ClientError, "error"),
            (StatusCode::ServerError, StatusClass::ServerError, "error"),
        ];
        for (code, class, field) in table {
            assert_eq!(code.class(), class, "{code:?}");
            assert_eq!(code.canonical_field(), field, "{code:?}");
        }
    }

    #[test]
    fn new_fills_canonical_text() {
        let ok = Response::new(StatusCode::Ok);
        assert_eq!(ok.field("alert"), Some(&json!("OK")));
        assert_eq!(ok.field("error"), None);

        let bad = Response::new(StatusCode::BadRequest);
        assert!(bad.field("error").is_some());
        assert_eq!(bad.field("alert"), None);
    }

    #[test]
    fn status_serializes_as_bare_integer() {
        let raw = Response::new(StatusCode::Ok).encode().unwrap();
        let value: Value = serde_json::from_slice(&raw).unwrap();
        assert_eq!(value["response"], json!(200));
    }

    #[test]
    fn roundtrip_preserves_every_field() {
        let resp = Response::new(StatusCode::ServerError).with_field("detail", "queue full");
        let decoded = Response::decode(&resp.encode().unwrap()).unwrap();
        assert_eq!(resp, decoded);
    }

    #[test]
    fn unknown_code_fails_decode() {
        assert!(Response::decode(br#"{"response":302,"time":1}"#).is_err());
        assert!(StatusCode::try_from(999).is_err());
    }
}
