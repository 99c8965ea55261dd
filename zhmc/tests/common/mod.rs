//! In-memory transport shared by the integration tests

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use zhmc::api::{ErrorKind, Method, RequestBody};
use zhmc::{Endpoint, HmcError, Request, Response, Result, Transport};

pub const ENDPOINT: &str = "https://hmc.example.com:6794/api";

/// What the transport saw for one call.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub content_type: String,
    pub body: RequestBody,
}

impl Recorded {
    pub fn json(&self) -> serde_json::Value {
        match &self.body {
            RequestBody::Json(value) => value.clone(),
            other => panic!("expected a JSON body, got {:?}", other),
        }
    }

    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let url = url::Url::parse(&format!(
            "https://x{}?{}",
            self.path,
            self.query.clone().unwrap_or_default()
        ))
        .unwrap();
        url.query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }
}

/// Answers calls from a script, in order, and records every request.
///
/// Like the real client it hands back any response in the expected status
/// set and turns the others into errors.
pub struct MockTransport {
    endpoint: Endpoint,
    session: Option<String>,
    responses: Mutex<VecDeque<Response>>,
    requests: Mutex<Vec<Recorded>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            endpoint: Endpoint::parse(ENDPOINT).unwrap(),
            session: Some("S1".to_string()),
            responses: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn respond(self, status: u16, body: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(Response::new(status, body.to_string()));
        self
    }

    pub fn respond_json(self, status: u16, body: serde_json::Value) -> Self {
        self.respond(status, &body.to_string())
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request(&self, index: usize) -> Recorded {
        self.requests()[index].clone()
    }

    pub fn remaining(&self) -> usize {
        self.responses.lock().unwrap().len()
    }
}

#[async_trait]
impl Transport for MockTransport {
    fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    async fn execute(&self, request: Request) -> Result<Response> {
        self.requests.lock().unwrap().push(Recorded {
            method: request.method.clone(),
            path: request.url.path().to_string(),
            query: request.url.query().map(str::to_string),
            content_type: request.effective_content_type().to_string(),
            body: request.body.clone(),
        });

        let response = self.responses.lock().unwrap().pop_front().ok_or_else(|| {
            HmcError::new(
                ErrorKind::Execute,
                format!("no scripted response for {} {}", request.method, request.url),
            )
        })?;

        if response.is_expected() {
            Ok(response)
        } else {
            Err(response.server_error())
        }
    }

    async fn session_id(&self) -> Option<String> {
        self.session.clone()
    }
}
