//! Redacted request/response dumps written to a caller-supplied sink

use std::fmt::Write as _;
use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard};

use reqwest::header::HeaderMap;

use super::request::{Request, RequestBody};
use super::session::SESSION_HEADER;

pub const REDACTED: &str = "********";

const SECRET_FIELDS: [&str; 2] = ["password", "new-password"];

type SharedWriter = Arc<Mutex<Option<Box<dyn Write + Send>>>>;

/// Sink for exchange dumps. Writes are serialized and run on the blocking
/// pool, so a slow writer never stalls the runtime.
#[derive(Default)]
pub struct TraceSink {
    writer: SharedWriter,
}

impl TraceSink {
    pub fn new(writer: Option<Box<dyn Write + Send>>) -> Self {
        Self {
            writer: Arc::new(Mutex::new(writer)),
        }
    }

    pub async fn set(&self, writer: Box<dyn Write + Send>) {
        *lock(&self.writer) = Some(writer);
    }

    pub async fn clear(&self) {
        *lock(&self.writer) = None;
    }

    pub async fn is_enabled(&self) -> bool {
        lock(&self.writer).is_some()
    }

    /// Write one dump. A disabled sink swallows the text.
    pub async fn write(&self, text: &str) -> io::Result<()> {
        let writer = Arc::clone(&self.writer);
        let text = text.to_string();
        tokio::task::spawn_blocking(move || {
            let mut guard = lock(&writer);
            if let Some(writer) = guard.as_mut() {
                writer.write_all(text.as_bytes())?;
                writer.flush()?;
            }
            Ok(())
        })
        .await
        .map_err(io::Error::other)?
    }
}

fn lock(writer: &SharedWriter) -> MutexGuard<'_, Option<Box<dyn Write + Send>>> {
    writer.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub fn dump_request(request: &Request, headers: &HeaderMap) -> String {
    let mut out = String::new();
    let target = match request.url.query() {
        Some(query) => format!("{}?{}", request.url.path(), query),
        None => request.url.path().to_string(),
    };
    let _ = writeln!(out, "{} {} HTTP/1.1\r", request.method, target);
    if let Some(host) = request.url.host_str() {
        match request.url.port() {
            Some(port) => {
                let _ = writeln!(out, "Host: {}:{}\r", host, port);
            }
            None => {
                let _ = writeln!(out, "Host: {}\r", host);
            }
        }
    }
    write_headers(&mut out, headers);
    out.push_str("\r\n");

    match &request.body {
        RequestBody::Empty => {}
        RequestBody::Json(value) => {
            let mut value = value.clone();
            redact_json(&mut value);
            out.push_str(&value.to_string());
            out.push('\n');
        }
        RequestBody::Raw(bytes) => {
            let _ = writeln!(out, "<{} bytes of binary data>", bytes.len());
        }
    }
    out
}

pub fn dump_response(status: u16, headers: &HeaderMap, body: &[u8]) -> String {
    let mut out = String::new();
    let reason = reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("");
    let _ = writeln!(out, "HTTP/1.1 {} {}\r", status, reason);
    write_headers(&mut out, headers);
    out.push_str("\r\n");

    if !body.is_empty() {
        match serde_json::from_slice::<serde_json::Value>(body) {
            Ok(mut value) => {
                redact_json(&mut value);
                out.push_str(&value.to_string());
            }
            Err(_) => out.push_str(&String::from_utf8_lossy(body)),
        }
        out.push('\n');
    }
    out
}

fn write_headers(out: &mut String, headers: &HeaderMap) {
    for (name, value) in headers {
        let shown = if name.as_str().eq_ignore_ascii_case(SESSION_HEADER) {
            REDACTED
        } else {
            value.to_str().unwrap_or("<binary>")
        };
        let _ = writeln!(out, "{}: {}\r", name, shown);
    }
}

/// Replace credential values anywhere in a JSON document.
pub fn redact_json(value: &mut serde_json::Value) {
    match value {
        serde_json::Value::Object(map) => {
            for (key, field) in map.iter_mut() {
                if SECRET_FIELDS.contains(&key.as_str()) || key == "api-session" {
                    *field = serde_json::Value::String(REDACTED.to_string());
                } else {
                    redact_json(field);
                }
            }
        }
        serde_json::Value::Array(items) => items.iter_mut().for_each(redact_json),
        _ => {}
    }
}
