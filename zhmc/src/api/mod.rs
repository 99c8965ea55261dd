pub mod adapter;
pub mod client;
pub mod common;
pub mod config;
pub mod connection;
pub mod cpc;
pub mod endpoint;
pub mod error;
pub mod job;
pub mod metrics;
pub mod nic;
pub mod partition;
pub mod request;
pub mod response;
pub mod session;
pub mod storage_group;
pub mod tls;
pub mod trace;
pub mod vswitch;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use client::{user_agent, Client, LIBRARY_NAME, LIBRARY_VERSION};
pub use common::{JobHandle, ListFilter, QueryParams};
pub use config::ClientOptions;
pub use connection::ConnectionStats;
pub use endpoint::Endpoint;
pub use error::{ErrorEnvelope, ErrorKind, HmcError, Result};
pub use job::{Job, JobPollConfig, JobStatus};
pub use request::{Method, Request, RequestBody, Response, Transport};
pub use session::{LogonData, NotificationTopics};
