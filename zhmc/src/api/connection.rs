//! HTTPS client construction and request statistics

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use super::config::ClientOptions;
use super::error::{ErrorKind, HmcError, Result};

pub struct ConnectionConfig {
    pub max_idle_connections: usize,
    pub idle_timeout: Duration,
    pub connection_timeout: Duration,
    /// `None` lets a request run until the console answers.
    pub request_timeout: Option<Duration>,
    pub tcp_keepalive: Option<Duration>,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            max_idle_connections: 10,
            idle_timeout: Duration::from_secs(90),
            connection_timeout: Duration::from_secs(10),
            request_timeout: Some(Duration::from_secs(30)),
            tcp_keepalive: Some(Duration::from_secs(30)),
        }
    }
}

impl ConnectionConfig {
    pub fn from_options(options: &ClientOptions) -> Self {
        Self {
            request_timeout: match options.timeout_seconds {
                0 => None,
                seconds => Some(Duration::from_secs(seconds)),
            },
            ..Default::default()
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct ConnectionStats {
    pub total_requests: u64,
    pub failed_requests: u64,
    pub logons: u64,
    pub last_request: Option<Instant>,
}

pub struct ConnectionManager {
    stats: Arc<RwLock<ConnectionStats>>,
    config: ConnectionConfig,
}

impl ConnectionManager {
    pub fn new(config: ConnectionConfig) -> Self {
        Self {
            stats: Arc::new(RwLock::new(ConnectionStats::default())),
            config,
        }
    }

    /// A request counts as failed when no HTTP response came back.
    pub async fn record_request(&self, success: bool) {
        let mut stats = self.stats.write().await;
        stats.total_requests += 1;
        if !success {
            stats.failed_requests += 1;
        }
        stats.last_request = Some(Instant::now());
    }

    pub async fn record_logon(&self) {
        self.stats.write().await.logons += 1;
    }

    pub async fn get_stats(&self) -> ConnectionStats {
        self.stats.read().await.clone()
    }

    pub fn build_client(&self, tls: Option<rustls::ClientConfig>) -> Result<reqwest::Client> {
        let mut builder = reqwest::Client::builder()
            .connect_timeout(self.config.connection_timeout)
            .pool_idle_timeout(self.config.idle_timeout)
            .pool_max_idle_per_host(self.config.max_idle_connections);

        if let Some(timeout) = self.config.request_timeout {
            builder = builder.timeout(timeout);
        }

        if let Some(keepalive) = self.config.tcp_keepalive {
            builder = builder.tcp_keepalive(keepalive);
        }

        if let Some(tls) = tls {
            builder = builder.use_preconfigured_tls(tls);
        }

        builder.build().map_err(|e| {
            HmcError::new(
                ErrorKind::InvalidUrl,
                format!("failed to build HTTPS client: {}", e),
            )
        })
    }
}
