use std::future::Future;
use std::io::Write;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE, USER_AGENT};
use tokio::sync::RwLock;
use url::Url;

use super::adapter::AdapterApi;
use super::config::ClientOptions;
use super::connection::{ConnectionConfig, ConnectionManager, ConnectionStats};
use super::cpc::CpcApi;
use super::endpoint::Endpoint;
use super::error::{ErrorKind, HmcError, Result};
use super::common::JobHandle;
use super::job::{Job, JobApi, JobPollConfig};
use super::metrics::{MetricsApi, MetricsContext, MetricsSample};
use super::nic::NicApi;
use super::partition::PartitionApi;
use super::request::{need_logon, Request, Response, Transport};
use super::response::ResponseHandler;
use super::session::{
    LogonData, LogonRequest, NotificationTopics, Session, SESSIONS_PATH, SESSION_HEADER,
    THIS_SESSION_PATH,
};
use super::storage_group::StorageGroupApi;
use super::tls::build_tls_config;
use super::trace::{self, TraceSink};
use super::vswitch::VirtualSwitchApi;

pub const LIBRARY_NAME: &str = env!("CARGO_PKG_NAME");
pub const LIBRARY_VERSION: &str = env!("CARGO_PKG_VERSION");

/// `ZHMC (<os>; <arch>) <library>/<version>`
pub fn user_agent() -> String {
    format!(
        "ZHMC ({}; {}) {}/{}",
        std::env::consts::OS,
        std::env::consts::ARCH,
        LIBRARY_NAME,
        LIBRARY_VERSION
    )
}

/// Console API client.
///
/// Cheap to clone; clones share the session, the HTTPS connection pool and
/// the trace sink, so one client can serve many concurrent callers.
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    endpoint: Endpoint,
    options: RwLock<ClientOptions>,
    http: RwLock<reqwest::Client>,
    session: RwLock<Session>,
    trace: TraceSink,
    connection: ConnectionManager,
}

impl Client {
    /// Create a client for an `https://` endpoint. Nothing is sent until the
    /// first request; the first request logs on.
    pub fn new(endpoint: &str, options: ClientOptions) -> Result<Self> {
        Self::with_endpoint(Endpoint::parse(endpoint)?, options)
    }

    pub fn with_endpoint(endpoint: Endpoint, options: ClientOptions) -> Result<Self> {
        let connection = ConnectionManager::new(ConnectionConfig::from_options(&options));
        let http = connection.build_client(build_tls_config(&options)?)?;

        let writer: Option<Box<dyn Write + Send>> = if options.trace {
            Some(Box::new(std::io::stderr()))
        } else {
            None
        };

        Ok(Self {
            inner: Arc::new(ClientInner {
                endpoint,
                options: RwLock::new(options),
                http: RwLock::new(http),
                session: RwLock::new(Session::default()),
                trace: TraceSink::new(writer),
                connection,
            }),
        })
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.inner.endpoint
    }

    pub fn clone_endpoint_url(&self) -> Url {
        self.inner.endpoint.clone_url()
    }

    /// Log on and install the new session. Concurrent callers queue behind
    /// the session lock, so only one logon is in flight at a time.
    pub async fn logon(&self) -> Result<()> {
        let mut session = self.inner.session.write().await;
        let data = self.request_logon(None).await?;
        session.install(&data);
        Ok(())
    }

    /// Delete the current session. The local token is dropped even when the
    /// console rejects the request.
    pub async fn logoff(&self) -> Result<()> {
        let mut session = self.inner.session.write().await;
        let token = match session.token() {
            Some(token) => token.to_string(),
            None => return Ok(()),
        };
        session.clear();

        tracing::info!("Logging off from {}", self.inner.endpoint);
        let request = Request::delete(self.inner.endpoint.resource_url(THIS_SESSION_PATH));
        let response = self.dispatch(&request, Some(&token)).await?;
        ResponseHandler::empty(response, &[200, 204])
    }

    /// Open an extra session without touching the client's own.
    pub async fn logon_console(&self) -> Result<LogonData> {
        self.request_logon(None).await
    }

    /// Delete a session opened with [`Client::logon_console`].
    pub async fn logoff_console(&self, session_id: &str) -> Result<()> {
        let request = Request::delete(self.inner.endpoint.resource_url(THIS_SESSION_PATH));
        let response = self.dispatch(&request, Some(session_id)).await?;
        ResponseHandler::empty(response, &[200, 204])
    }

    /// Change the password of `options.username` by logging on with a new
    /// password, then close the session that logon opened.
    pub async fn change_password(
        endpoint: &str,
        options: ClientOptions,
        new_password: &str,
    ) -> Result<()> {
        let client = Client::new(endpoint, options)?;
        client.change_password_with(new_password).await
    }

    pub(crate) async fn change_password_with(&self, new_password: &str) -> Result<()> {
        let data = self.request_logon(Some(new_password)).await?;
        self.logoff_console(&data.session_id).await
    }

    /// With `refresh`, ask the console whether the token is still accepted;
    /// otherwise only check that a token is held.
    pub async fn is_logged_on(&self, refresh: bool) -> bool {
        let token = match self.current_token().await {
            Some(token) => token,
            None => return false,
        };
        if !refresh {
            return true;
        }

        let request = Request::get(self.inner.endpoint.resource_url("/console"));
        match self.dispatch(&request, Some(&token)).await {
            Ok(response) if response.status == 200 => true,
            Ok(response) => {
                if need_logon(response.status, response.server_error().reason) {
                    let mut session = self.inner.session.write().await;
                    if session.token() == Some(token.as_str()) {
                        tracing::info!("Session on {} has expired", self.inner.endpoint);
                        session.clear();
                    }
                }
                false
            }
            Err(e) => {
                tracing::debug!("Session check failed: {}", e);
                false
            }
        }
    }

    /// Rebuild the HTTPS client with certificate verification switched on or off.
    pub async fn set_skip_cert_verify(&self, skip: bool) -> Result<()> {
        let mut options = self.inner.options.write().await;
        let mut updated = options.clone();
        updated.skip_cert_verify = skip;

        let http = self
            .inner
            .connection
            .build_client(build_tls_config(&updated)?)?;
        *self.inner.http.write().await = http;
        *options = updated;
        Ok(())
    }

    pub async fn trace_on(&self, writer: Box<dyn Write + Send>) {
        self.inner.trace.set(writer).await;
    }

    pub async fn trace_off(&self) {
        self.inner.trace.clear().await;
    }

    pub async fn notification_topics(&self) -> NotificationTopics {
        self.inner.session.read().await.topics()
    }

    pub async fn connection_stats(&self) -> ConnectionStats {
        self.inner.connection.get_stats().await
    }

    /// Create a metrics context for `groups`.
    pub async fn get_metrics_context(
        &self,
        groups: &[&str],
        frequency_seconds: u32,
    ) -> Result<MetricsContext> {
        self.metrics()
            .create_context(groups, frequency_seconds)
            .await
    }

    pub async fn get_metrics(&self, context_uri: &str) -> Result<Vec<MetricsSample>> {
        self.metrics().get_metrics(context_uri).await
    }

    pub async fn delete_metrics_context(&self, context_uri: &str) -> Result<()> {
        self.metrics().delete_context(context_uri).await
    }

    /// Poll the job behind `handle` and fail unless it completed successfully.
    pub async fn wait_job_success(&self, handle: &JobHandle, config: &JobPollConfig) -> Result<Job> {
        self.jobs().wait_for_success(handle, config).await
    }

    pub fn cpcs(&self) -> CpcApi<'_> {
        CpcApi::new(self)
    }

    pub fn partitions(&self) -> PartitionApi<'_> {
        PartitionApi::new(self)
    }

    pub fn nics(&self) -> NicApi<'_> {
        NicApi::new(self)
    }

    pub fn adapters(&self) -> AdapterApi<'_> {
        AdapterApi::new(self)
    }

    pub fn virtual_switches(&self) -> VirtualSwitchApi<'_> {
        VirtualSwitchApi::new(self)
    }

    pub fn storage_groups(&self) -> StorageGroupApi<'_> {
        StorageGroupApi::new(self)
    }

    pub fn jobs(&self) -> JobApi<'_> {
        JobApi::new(self)
    }

    pub fn metrics(&self) -> MetricsApi<'_> {
        MetricsApi::new(self)
    }

    async fn current_token(&self) -> Option<String> {
        self.inner.session.read().await.token().map(str::to_string)
    }

    async fn request_logon(&self, new_password: Option<&str>) -> Result<LogonData> {
        let (username, password) = {
            let options = self.inner.options.read().await;
            (options.username.clone(), options.password.clone())
        };

        let request = Request::post(self.inner.endpoint.resource_url(SESSIONS_PATH)).json(
            &LogonRequest {
                userid: &username,
                password: &password,
                new_password,
            },
        )?;

        let response = self.dispatch(&request, None).await;
        self.inner.connection.record_logon().await;

        let status = response.as_ref().map(|r| r.status).unwrap_or_default();
        let data: LogonData = ResponseHandler::json(response?, &[200, 201])?;
        if data.session_id.is_empty() {
            return Err(HmcError::new(
                ErrorKind::EmptyResponse,
                "logon response carries no session id",
            )
            .with_status(status));
        }

        tracing::info!("Logged on to {} as {}", self.inner.endpoint, username);
        Ok(data)
    }

    async fn ensure_logged_on(&self) -> Result<()> {
        if self.inner.session.read().await.is_authenticated() {
            return Ok(());
        }

        let mut session = self.inner.session.write().await;
        if session.is_authenticated() {
            return Ok(());
        }
        let data = self.request_logon(None).await?;
        session.install(&data);
        Ok(())
    }

    /// Replace a session the console rejected. `stale` is the token the
    /// rejected request carried; if the session already moved on, another
    /// caller did the logon and this one only needs to retry.
    async fn relogon(&self, stale: Option<&str>) -> Result<()> {
        let mut session = self.inner.session.write().await;
        if session.is_authenticated() && session.token() != stale {
            tracing::debug!("Session already refreshed by a concurrent request");
            return Ok(());
        }

        match self.request_logon(None).await {
            Ok(data) => {
                session.install(&data);
                Ok(())
            }
            Err(e) => {
                session.clear();
                Err(e)
            }
        }
    }

    async fn execute_request(&self, request: Request) -> Result<Response> {
        let logon_call = request.is_logon();
        if !logon_call {
            until_cancelled(&request, self.ensure_logged_on()).await?;
        }

        let token = self.current_token().await;
        let response = self.dispatch(&request, token.as_deref()).await?;
        if response.is_expected() {
            return Ok(response);
        }

        let error = response.server_error();
        if logon_call || !need_logon(response.status, error.reason) {
            return Err(error);
        }

        tracing::warn!(
            "{} {} returned {} (reason {}), logging on again",
            request.method,
            request.url,
            response.status,
            error.reason
        );
        until_cancelled(&request, self.relogon(token.as_deref())).await?;

        let token = self.current_token().await;
        let retry = self.dispatch(&request, token.as_deref()).await?;
        if retry.is_expected() {
            Ok(retry)
        } else {
            Err(retry.server_error())
        }
    }

    /// One HTTP round trip, no session handling.
    async fn dispatch(&self, request: &Request, token: Option<&str>) -> Result<Response> {
        let headers = build_headers(request, token)?;
        let body = request.body.to_bytes()?;

        if self.inner.trace.is_enabled().await {
            self.write_trace(&trace::dump_request(request, &headers))
                .await;
        }

        tracing::debug!("{} request to: {}", request.method, request.url);

        let http = self.inner.http.read().await.clone();
        let mut builder = http
            .request(request.method.clone(), request.url.clone())
            .headers(headers);
        if let Some(body) = body {
            builder = builder.body(body);
        }

        let exchange = async move {
            let response = builder.send().await?;
            let status = response.status().as_u16();
            let headers = response.headers().clone();
            let body = response.bytes().await.map_err(|e| {
                HmcError::new(
                    ErrorKind::ReadResponse,
                    format!("failed to read response body: {}", e),
                )
                .with_status(status)
            })?;
            Ok::<_, HmcError>((status, headers, body))
        };

        let outcome = until_cancelled(request, exchange).await;

        self.inner
            .connection
            .record_request(outcome.is_ok())
            .await;
        let (status, headers, body) = outcome?;
        tracing::debug!("Response status: {}", status);

        if self.inner.trace.is_enabled().await {
            self.write_trace(&trace::dump_response(status, &headers, &body))
                .await;
        }

        Ok(Response { status, body })
    }

    async fn write_trace(&self, text: &str) {
        if let Err(e) = self.inner.trace.write(text).await {
            let error = HmcError::new(
                ErrorKind::TraceRequest,
                format!("failed to write trace: {}", e),
            );
            tracing::warn!("{}", error);
        }
    }

    #[cfg(test)]
    pub(crate) async fn set_session_token(&self, token: &str) {
        let data = LogonData {
            session_id: token.to_string(),
            notif_topic: String::new(),
            job_notif_topic: String::new(),
            api_major_version: None,
            api_minor_version: None,
            password_expires: None,
        };
        self.inner.session.write().await.install(&data);
    }
}

#[async_trait]
impl Transport for Client {
    fn endpoint(&self) -> &Endpoint {
        &self.inner.endpoint
    }

    async fn execute(&self, request: Request) -> Result<Response> {
        self.execute_request(request).await
    }

    async fn session_id(&self) -> Option<String> {
        self.current_token().await
    }
}

/// Run `work` unless the request is cancelled first. A logon dropped here
/// never installs its session.
async fn until_cancelled<T>(
    request: &Request,
    work: impl Future<Output = Result<T>>,
) -> Result<T> {
    match &request.cancel {
        Some(cancel) => tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(HmcError::new(
                ErrorKind::Execute,
                format!("{} {} cancelled", request.method, request.url),
            )),
            result = work => result,
        },
        None => work.await,
    }
}

fn build_headers(request: &Request, token: Option<&str>) -> Result<HeaderMap> {
    let invalid = |what: &str, e: reqwest::header::InvalidHeaderValue| {
        HmcError::new(
            ErrorKind::BadRequest,
            format!("invalid {} header: {}", what, e),
        )
    };

    let mut headers = HeaderMap::new();
    headers.insert(
        USER_AGENT,
        HeaderValue::from_str(&user_agent()).map_err(|e| invalid("user-agent", e))?,
    );
    headers.insert(
        CONTENT_TYPE,
        HeaderValue::from_str(request.effective_content_type())
            .map_err(|e| invalid("content-type", e))?,
    );

    if let Some(token) = token {
        let mut value = HeaderValue::from_str(token).map_err(|e| invalid("session", e))?;
        value.set_sensitive(true);
        headers.insert(HeaderName::from_static(SESSION_HEADER), value);
    }

    Ok(headers)
}

#[cfg(test)]
#[path = "client_test.rs"]
mod client_test;
