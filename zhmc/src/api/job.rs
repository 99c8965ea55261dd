//! Asynchronous jobs started by 202 responses

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::common::JobHandle;
use super::error::{ErrorKind, HmcError, Result, UNKNOWN_REASON};
use super::request::{Request, Transport};
use super::response::ResponseHandler;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobStatus {
    Running,
    CancelPending,
    Canceled,
    Complete,
    #[serde(other)]
    Unknown,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Complete | JobStatus::Canceled)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobStatus::Running => "running",
            JobStatus::CancelPending => "cancel-pending",
            JobStatus::Canceled => "canceled",
            JobStatus::Complete => "complete",
            JobStatus::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Job record as returned by `GET <job-uri>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    #[serde(skip)]
    pub uri: String,
    pub status: JobStatus,
    #[serde(rename = "job-status-code", default)]
    pub status_code: Option<u16>,
    #[serde(rename = "job-reason-code", default)]
    pub reason_code: Option<i64>,
    #[serde(rename = "job-results", default)]
    pub results: Option<serde_json::Value>,
}

impl Job {
    pub fn result_message(&self) -> Option<&str> {
        self.results
            .as_ref()
            .and_then(|r| r.get("message"))
            .and_then(|m| m.as_str())
    }

    /// Completed, and the underlying operation answered with a 2xx status.
    pub fn succeeded(&self) -> bool {
        self.status == JobStatus::Complete
            && self
                .status_code
                .map(|code| (200..300).contains(&code))
                .unwrap_or(false)
    }

    /// `Ok` for a successful job, otherwise the failure as an [`HmcError`]
    /// carrying the job's reason code.
    pub fn into_result(self) -> Result<Job> {
        if self.succeeded() {
            return Ok(self);
        }

        let message = match self.result_message() {
            Some(message) if !message.is_empty() => message.to_string(),
            _ => match self.status_code {
                Some(code) => format!("job {} {} with status {}", self.uri, self.status, code),
                None => format!("job {} {}", self.uri, self.status),
            },
        };

        let error = HmcError::server(self.reason_code.unwrap_or(UNKNOWN_REASON), message);
        Err(match self.status_code {
            Some(status) => error.with_status(status),
            None => error,
        })
    }
}

#[derive(Debug, Clone)]
pub struct JobPollConfig {
    pub interval: Duration,
    /// `None` waits forever.
    pub timeout: Option<Duration>,
}

impl Default for JobPollConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            timeout: None,
        }
    }
}

impl JobPollConfig {
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

pub struct JobApi<'a> {
    transport: &'a dyn Transport,
}

impl<'a> JobApi<'a> {
    pub fn new(transport: &'a dyn Transport) -> Self {
        Self { transport }
    }

    /// GET <job-uri>
    pub async fn query(&self, uri: &str) -> Result<Job> {
        self.fetch(uri, None).await
    }

    /// POST <job-uri>/operations/cancel
    pub async fn cancel(&self, uri: &str) -> Result<()> {
        let url = self
            .transport
            .endpoint()
            .resource_url(&format!("{}/operations/cancel", uri));
        let response = self.transport.execute(Request::post(url)).await?;
        ResponseHandler::empty(response, &[204])
    }

    /// DELETE <job-uri>
    pub async fn delete(&self, uri: &str) -> Result<()> {
        let url = self.transport.endpoint().resource_url(uri);
        let response = self.transport.execute(Request::delete(url)).await?;
        ResponseHandler::empty(response, &[204])
    }

    /// Poll until the job reaches a terminal state.
    ///
    /// Cancelling `cancel` or running past `config.timeout` only stops the
    /// polling; the job keeps running on the console.
    pub async fn wait_for_job(
        &self,
        uri: &str,
        config: &JobPollConfig,
        cancel: Option<&CancellationToken>,
    ) -> Result<Job> {
        let started = Instant::now();

        loop {
            let job = self.fetch(uri, cancel).await?;
            if job.status.is_terminal() {
                tracing::debug!("Job {} finished: {}", uri, job.status);
                return Ok(job);
            }

            if let Some(timeout) = config.timeout {
                if started.elapsed() + config.interval > timeout {
                    return Err(HmcError::new(
                        ErrorKind::Execute,
                        format!("timed out after {:?} waiting for job {}", timeout, uri),
                    ));
                }
            }

            tracing::debug!("Job {} is {}, polling again in {:?}", uri, job.status, config.interval);
            match cancel {
                Some(token) => tokio::select! {
                    biased;
                    _ = token.cancelled() => {
                        return Err(HmcError::new(
                            ErrorKind::Execute,
                            format!("waiting for job {} cancelled", uri),
                        ));
                    }
                    _ = tokio::time::sleep(config.interval) => {}
                },
                None => tokio::time::sleep(config.interval).await,
            }
        }
    }

    /// Wait for the job behind `handle` and fail unless it succeeded.
    pub async fn wait_for_success(&self, handle: &JobHandle, config: &JobPollConfig) -> Result<Job> {
        self.wait_for_job(&handle.uri, config, None)
            .await?
            .into_result()
    }

    async fn fetch(&self, uri: &str, cancel: Option<&CancellationToken>) -> Result<Job> {
        let mut request = Request::get(self.transport.endpoint().resource_url(uri));
        if let Some(token) = cancel {
            request = request.cancel_on(token.clone());
        }

        let response = self.transport.execute(request).await?;
        let mut job: Job = ResponseHandler::json(response, &[200])?;
        job.uri = uri.to_string();
        Ok(job)
    }
}
