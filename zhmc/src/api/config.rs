//! Client configuration

use serde::Deserialize;
use std::path::PathBuf;

use super::error::{ErrorKind, HmcError, Result};

pub const ENV_ENDPOINT: &str = "ZHMC_ENDPOINT";
pub const ENV_USERNAME: &str = "ZHMC_USERNAME";
pub const ENV_PASSWORD: &str = "ZHMC_PASSWORD";
pub const ENV_SKIP_CERT_VERIFY: &str = "ZHMC_SKIP_CERT_VERIFY";
pub const ENV_CA_CERT: &str = "ZHMC_CA_CERT";
pub const ENV_TRACE: &str = "ZHMC_TRACE";
pub const ENV_TIMEOUT: &str = "ZHMC_REQUEST_TIMEOUT_SECS";

/// Options used to create a [`Client`](super::Client).
///
/// `skip_cert_verify` and tracing can be changed on a live client; everything
/// else is fixed at construction.
#[derive(Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ClientOptions {
    pub username: String,
    pub password: String,
    pub skip_cert_verify: bool,
    /// PEM file holding the console's root certificate.
    pub ca_cert: Option<PathBuf>,
    /// Dump every exchange to stderr.
    pub trace: bool,
    /// Request timeout; 0 disables it.
    pub timeout_seconds: u64,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            username: String::new(),
            password: String::new(),
            skip_cert_verify: false,
            ca_cert: None,
            trace: false,
            timeout_seconds: 30,
        }
    }
}

impl std::fmt::Debug for ClientOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientOptions")
            .field("username", &self.username)
            .field("password", &"********")
            .field("skip_cert_verify", &self.skip_cert_verify)
            .field("ca_cert", &self.ca_cert)
            .field("trace", &self.trace)
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

impl ClientOptions {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            ..Self::default()
        }
    }

    pub fn with_skip_cert_verify(mut self, skip: bool) -> Self {
        self.skip_cert_verify = skip;
        self
    }

    pub fn with_ca_cert(mut self, path: impl Into<PathBuf>) -> Self {
        self.ca_cert = Some(path.into());
        self
    }

    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    pub fn with_timeout_seconds(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    /// Read the endpoint and options from `ZHMC_*` environment variables.
    ///
    /// `ZHMC_ENDPOINT`, `ZHMC_USERNAME` and `ZHMC_PASSWORD` are required.
    pub fn from_env() -> Result<(String, Self)> {
        let endpoint = required_var(ENV_ENDPOINT)?;
        let username = required_var(ENV_USERNAME)?;
        let password = required_var(ENV_PASSWORD)?;

        let skip_cert_verify = flag_var(ENV_SKIP_CERT_VERIFY);
        let trace = flag_var(ENV_TRACE);
        let ca_cert = std::env::var(ENV_CA_CERT)
            .ok()
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);

        let timeout_seconds = match std::env::var(ENV_TIMEOUT) {
            Ok(v) => v.parse::<u64>().map_err(|e| {
                HmcError::new(
                    ErrorKind::BadRequest,
                    format!("invalid {}: {}", ENV_TIMEOUT, e),
                )
            })?,
            Err(_) => Self::default().timeout_seconds,
        };

        Ok((
            endpoint,
            Self {
                username,
                password,
                skip_cert_verify,
                ca_cert,
                trace,
                timeout_seconds,
            },
        ))
    }
}

fn required_var(name: &str) -> Result<String> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| HmcError::new(ErrorKind::BadRequest, format!("{} is required", name)))
}

fn flag_var(name: &str) -> bool {
    std::env::var(name)
        .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
        .unwrap_or(false)
}
