use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reason code used when a server error body cannot be decoded.
pub const UNKNOWN_REASON: i64 = -1;
/// Message used when a server error body cannot be decoded.
pub const UNKNOWN_MESSAGE: &str = "Unknown error.";

pub type Result<T> = std::result::Result<T, HmcError>;

/// Failure kinds detected on the client side, plus reason codes reported by
/// the console. Client-side codes are stable and start at 1000.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidUrl,
    BadRequest,
    EmptyResponse,
    ReadResponse,
    TraceRequest,
    Execute,
    Marshal,
    Unmarshal,
    EmptyJobUri,
    Server(i64),
}

impl ErrorKind {
    pub fn code(self) -> i64 {
        match self {
            ErrorKind::InvalidUrl => 1000,
            ErrorKind::BadRequest => 1001,
            ErrorKind::EmptyResponse => 1002,
            ErrorKind::ReadResponse => 1003,
            ErrorKind::TraceRequest => 1004,
            ErrorKind::Execute => 1005,
            ErrorKind::Marshal => 1006,
            ErrorKind::Unmarshal => 1007,
            ErrorKind::EmptyJobUri => 1008,
            ErrorKind::Server(reason) => reason,
        }
    }

    /// Client-side kind for `code`. Console reason codes may overlap the
    /// client range, so errors keep their own kind instead of relying on this.
    pub fn from_code(code: i64) -> Self {
        match code {
            1000 => ErrorKind::InvalidUrl,
            1001 => ErrorKind::BadRequest,
            1002 => ErrorKind::EmptyResponse,
            1003 => ErrorKind::ReadResponse,
            1004 => ErrorKind::TraceRequest,
            1005 => ErrorKind::Execute,
            1006 => ErrorKind::Marshal,
            1007 => ErrorKind::Unmarshal,
            1008 => ErrorKind::EmptyJobUri,
            other => ErrorKind::Server(other),
        }
    }
}

/// Error returned by every client operation.
///
/// Client-side failures and errors reported by the console share this
/// representation. `status` holds the HTTP status that accompanied the
/// failure, when there was one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} (reason {reason})")]
pub struct HmcError {
    pub reason: i64,
    pub message: String,
    pub status: Option<u16>,
    kind: ErrorKind,
}

/// Error document emitted by the console on 4xx/5xx responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub reason: i64,
    pub message: String,
    #[serde(rename = "http-status", skip_serializing_if = "Option::is_none", default)]
    pub http_status: Option<u16>,
    #[serde(rename = "request-uri", skip_serializing_if = "Option::is_none", default)]
    pub request_uri: Option<String>,
}

impl HmcError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            reason: kind.code(),
            message: message.into(),
            status: None,
            kind,
        }
    }

    /// Error reported by the console with its own reason code.
    pub fn server(reason: i64, message: impl Into<String>) -> Self {
        Self {
            reason,
            message: message.into(),
            status: None,
            kind: ErrorKind::Server(reason),
        }
    }

    /// Recover the console's error document from a response body.
    pub fn from_server_body(body: &[u8]) -> Self {
        match serde_json::from_slice::<ErrorEnvelope>(body) {
            Ok(envelope) => Self {
                status: envelope.http_status,
                ..Self::server(envelope.reason, envelope.message)
            },
            Err(_) => Self::server(UNKNOWN_REASON, UNKNOWN_MESSAGE),
        }
    }

    pub fn marshal(err: serde_json::Error) -> Self {
        Self::new(
            ErrorKind::Marshal,
            format!("failed to serialize request body: {}", err),
        )
    }

    pub fn unmarshal(err: serde_json::Error) -> Self {
        Self::new(
            ErrorKind::Unmarshal,
            format!("failed to parse response body: {}", err),
        )
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind() == kind
    }

    pub fn envelope(&self) -> ErrorEnvelope {
        ErrorEnvelope {
            reason: self.reason,
            message: self.message.clone(),
            http_status: self.status,
            request_uri: None,
        }
    }
}

impl From<reqwest::Error> for HmcError {
    fn from(err: reqwest::Error) -> Self {
        let status = err.status().map(|s| s.as_u16());
        let error = HmcError::new(ErrorKind::Execute, format!("HTTP request failed: {}", err));
        match status {
            Some(status) => error.with_status(status),
            None => error,
        }
    }
}

impl From<url::ParseError> for HmcError {
    fn from(err: url::ParseError) -> Self {
        HmcError::new(ErrorKind::InvalidUrl, format!("invalid URL: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reason_codes_are_stable() {
        assert_eq!(ErrorKind::InvalidUrl.code(), 1000);
        assert_eq!(ErrorKind::Unmarshal.code(), 1007);
        assert_eq!(ErrorKind::EmptyJobUri.code(), 1008);
        assert_eq!(ErrorKind::Server(4).code(), 4);
    }

    #[test]
    fn kind_round_trips_through_code() {
        let kinds = [
            ErrorKind::InvalidUrl,
            ErrorKind::BadRequest,
            ErrorKind::EmptyResponse,
            ErrorKind::ReadResponse,
            ErrorKind::TraceRequest,
            ErrorKind::Execute,
            ErrorKind::Marshal,
            ErrorKind::Unmarshal,
            ErrorKind::EmptyJobUri,
        ];
        for kind in kinds {
            assert_eq!(ErrorKind::from_code(kind.code()), kind);
        }
        assert_eq!(ErrorKind::from_code(4), ErrorKind::Server(4));
    }

    #[test]
    fn console_reason_in_client_range_stays_a_server_error() {
        for reason in 1000..=1008 {
            let body = format!(r#"{{"reason":{},"message":"console says no"}}"#, reason);
            let err = HmcError::from_server_body(body.as_bytes());
            assert_eq!(err.reason, reason);
            assert_eq!(err.kind(), ErrorKind::Server(reason));
            assert!(!err.is(ErrorKind::from_code(reason)));
        }

        let client_side = HmcError::new(ErrorKind::EmptyResponse, "empty");
        assert_eq!(client_side.reason, 1002);
        assert!(client_side.is(ErrorKind::EmptyResponse));
    }

    #[test]
    fn unparseable_body_is_a_server_error() {
        let err = HmcError::from_server_body(b"<html>");
        assert_eq!(err.kind(), ErrorKind::Server(UNKNOWN_REASON));
    }

    #[test]
    fn server_body_is_parsed() {
        let err = HmcError::from_server_body(br#"{"reason":1002,"message":"forbidden"}"#);
        assert_eq!(err.reason, 1002);
        assert_eq!(err.message, "forbidden");
        assert_eq!(err.kind(), ErrorKind::Server(1002));
    }

    #[test]
    fn server_body_keeps_http_status() {
        let err = HmcError::from_server_body(
            br#"{"http-status":404,"reason":1,"message":"not found","request-uri":"/api/x"}"#,
        );
        assert_eq!(err.status, Some(404));
        assert_eq!(err.reason, 1);
    }

    #[test]
    fn unparseable_body_yields_unknown_error() {
        for body in [&b"not-json"[..], b"", br#"{"message":"no reason"}"#] {
            let err = HmcError::from_server_body(body);
            assert_eq!(err.reason, UNKNOWN_REASON);
            assert_eq!(err.message, UNKNOWN_MESSAGE);
        }
    }

    #[test]
    fn envelope_survives_serialization() {
        let original = ErrorEnvelope {
            reason: 5,
            message: "session expired".to_string(),
            http_status: None,
            request_uri: None,
        };
        let body = serde_json::to_vec(&original).unwrap();
        let parsed = HmcError::from_server_body(&body);
        assert_eq!(parsed.reason, original.reason);
        assert_eq!(parsed.message, original.message);
        assert_eq!(parsed.envelope(), original);
    }

    #[test]
    fn error_display_includes_reason() {
        let err = HmcError::new(ErrorKind::EmptyJobUri, "no job URI in response").with_status(202);
        let text = err.to_string();
        assert!(text.contains("no job URI"));
        assert!(text.contains("1008"));
        assert_eq!(err.status, Some(202));
    }
}
