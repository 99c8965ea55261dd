//! Async client for the IBM Z Hardware Management Console REST API.
//!
//! A [`Client`] owns the HTTPS connection, the console session and the
//! optional trace sink. Resource operations live on small façades borrowed
//! from the client:
//!
//! ```no_run
//! # async fn run() -> zhmc::Result<()> {
//! use zhmc::{Client, ClientOptions, ListFilter};
//!
//! let client = Client::new("https://hmc.example.com:6794/api", ClientOptions::new("admin", "secret"))?;
//! for cpc in client.cpcs().list().await? {
//!     let partitions = client.partitions().list(&cpc.object_uri, &ListFilter::new()).await?;
//!     println!("{}: {} partitions", cpc.name, partitions.len());
//! }
//! client.logoff().await?;
//! # Ok(())
//! # }
//! ```

pub mod api;

pub use api::{
    Client, ClientOptions, Endpoint, ErrorKind, HmcError, Job, JobHandle, JobPollConfig,
    ListFilter, Request, Response, Result, Transport,
};
