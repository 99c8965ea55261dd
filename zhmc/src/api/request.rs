//! Request and response types shared by the executor and the resource APIs

use async_trait::async_trait;
use bytes::Bytes;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use url::Url;

pub use reqwest::Method;

use super::endpoint::Endpoint;
use super::error::{HmcError, Result};

pub const CONTENT_TYPE_JSON: &str = "application/json";
pub const CONTENT_TYPE_OCTET_STREAM: &str = "application/octet-stream";

/// Statuses the console uses for regular answers. Error bodies that come
/// with 4xx/5xx statuses in this set are left to the caller to decode.
pub const EXPECTED_STATUSES: [u16; 10] = [200, 201, 202, 204, 206, 400, 404, 409, 500, 503];

pub fn is_expected_status(status: u16) -> bool {
    EXPECTED_STATUSES.contains(&status)
}

/// Whether a response means the session is no longer valid.
pub fn need_logon(status: u16, reason: i64) -> bool {
    status == 401 || (status == 403 && (reason == 4 || reason == 5))
}

#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(serde_json::Value),
    Raw(Bytes),
}

impl RequestBody {
    pub(crate) fn to_bytes(&self) -> Result<Option<Bytes>> {
        match self {
            RequestBody::Empty => Ok(None),
            RequestBody::Json(value) => serde_json::to_vec(value)
                .map(|v| Some(Bytes::from(v)))
                .map_err(HmcError::marshal),
            RequestBody::Raw(bytes) => Ok(Some(bytes.clone())),
        }
    }
}

/// One call to the console. Built fresh for every call.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub url: Url,
    pub body: RequestBody,
    pub content_type: Option<String>,
    pub cancel: Option<CancellationToken>,
}

impl Request {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            body: RequestBody::Empty,
            content_type: None,
            cancel: None,
        }
    }

    pub fn get(url: Url) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: Url) -> Self {
        Self::new(Method::POST, url)
    }

    pub fn delete(url: Url) -> Self {
        Self::new(Method::DELETE, url)
    }

    /// Attach a JSON body. Fails with a marshal error if `body` cannot be serialized.
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self> {
        let value = serde_json::to_value(body).map_err(HmcError::marshal)?;
        self.body = RequestBody::Json(value);
        Ok(self)
    }

    pub fn raw(mut self, data: impl Into<Bytes>) -> Self {
        self.body = RequestBody::Raw(data.into());
        self
    }

    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn cancel_on(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn effective_content_type(&self) -> &str {
        self.content_type.as_deref().unwrap_or(CONTENT_TYPE_JSON)
    }

    /// The logon call itself never triggers a logon.
    pub fn is_logon(&self) -> bool {
        self.method == Method::POST && self.url.path().ends_with("/sessions")
    }
}

/// Status and raw body of a completed exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub body: Bytes,
}

impl Response {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_expected(&self) -> bool {
        is_expected_status(self.status)
    }

    /// The body read as a console error document.
    pub fn server_error(&self) -> HmcError {
        HmcError::from_server_body(&self.body).with_status(self.status)
    }
}

/// The HTTP contract every resource API is written against.
///
/// [`Client`](super::Client) is the real implementation; tests substitute an
/// in-memory one.
#[async_trait]
pub trait Transport: Send + Sync {
    fn endpoint(&self) -> &Endpoint;

    /// Send `request`, logging on first if needed.
    ///
    /// `Ok` carries any response with an expected status, including 4xx/5xx
    /// ones whose body the caller decodes. Other statuses come back as `Err`
    /// after the session has been refreshed and the request retried once.
    async fn execute(&self, request: Request) -> Result<Response>;

    /// Send raw bytes as `application/octet-stream`.
    async fn upload(&self, method: Method, url: Url, data: Bytes) -> Result<Response> {
        self.execute(
            Request::new(method, url)
                .raw(data)
                .content_type(CONTENT_TYPE_OCTET_STREAM),
        )
        .await
    }

    /// Token of the current session, if logged on.
    async fn session_id(&self) -> Option<String>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn expected_statuses_across_full_range() {
        for status in 100u16..600 {
            let expected = matches!(
                status,
                200 | 201 | 202 | 204 | 206 | 400 | 404 | 409 | 500 | 503
            );
            assert_eq!(is_expected_status(status), expected, "status {}", status);
        }
    }

    #[test]
    fn need_logon_predicate() {
        for status in 100u16..600 {
            for reason in -1i64..10 {
                let expected = status == 401 || (status == 403 && (reason == 4 || reason == 5));
                assert_eq!(need_logon(status, reason), expected, "{} {}", status, reason);
            }
        }
        assert!(need_logon(401, 1002));
        assert!(!need_logon(403, 1002));
    }

    #[test]
    fn json_body_serializes() {
        let url = Url::parse("https://hmc/api/sessions").unwrap();
        let request = Request::post(url)
            .json(&serde_json::json!({"userid": "admin"}))
            .unwrap();
        let bytes = request.body.to_bytes().unwrap().unwrap();
        assert_eq!(&bytes[..], br#"{"userid":"admin"}"#);
        assert_eq!(request.effective_content_type(), CONTENT_TYPE_JSON);
        assert!(request.is_logon());
    }

    #[test]
    fn unserializable_body_is_marshal_error() {
        let mut body = HashMap::new();
        body.insert((1u8, 2u8), "value");

        let url = Url::parse("https://hmc/api/partitions").unwrap();
        let err = Request::post(url).json(&body).unwrap_err();
        assert_eq!(err.kind(), super::super::ErrorKind::Marshal);
    }

    #[test]
    fn raw_body_keeps_bytes_and_override() {
        let url = Url::parse("https://hmc/api/partitions/1/operations/mount-iso-image").unwrap();
        let request = Request::post(url)
            .raw(vec![1u8, 2, 3])
            .content_type(CONTENT_TYPE_OCTET_STREAM);
        assert_eq!(
            request.body.to_bytes().unwrap().unwrap(),
            Bytes::from_static(&[1, 2, 3])
        );
        assert_eq!(request.effective_content_type(), CONTENT_TYPE_OCTET_STREAM);
        assert!(!request.is_logon());
    }

    #[test]
    fn empty_body_has_no_bytes() {
        let url = Url::parse("https://hmc/api/cpcs").unwrap();
        assert!(Request::get(url).body.to_bytes().unwrap().is_none());
    }

    #[test]
    fn response_server_error_carries_status() {
        let response = Response::new(409, r#"{"reason":8,"message":"busy"}"#);
        let err = response.server_error();
        assert_eq!(err.reason, 8);
        assert_eq!(err.status, Some(409));
    }
}
