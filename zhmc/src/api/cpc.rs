//! Central processing complexes

use serde::{Deserialize, Serialize};

use super::error::Result;
use super::request::{Request, Transport};
use super::response::ResponseHandler;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Cpc {
    pub object_uri: String,
    pub name: String,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CpcProperties {
    pub object_uri: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub dpm_enabled: Option<bool>,
    #[serde(default)]
    pub se_version: Option<String>,
    #[serde(default)]
    pub machine_type: Option<String>,
    #[serde(default)]
    pub machine_model: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// CPCs are read-only through this API.
pub struct CpcApi<'a> {
    transport: &'a dyn Transport,
}

impl<'a> CpcApi<'a> {
    pub fn new(transport: &'a dyn Transport) -> Self {
        Self { transport }
    }

    /// GET /cpcs
    pub async fn list(&self) -> Result<Vec<Cpc>> {
        let url = self.transport.endpoint().resource_url("/cpcs");
        let response = self.transport.execute(Request::get(url)).await?;
        ResponseHandler::list(response, "cpcs")
    }

    /// GET <cpc-uri>
    pub async fn get(&self, cpc_uri: &str) -> Result<CpcProperties> {
        let url = self.transport.endpoint().resource_url(cpc_uri);
        let response = self.transport.execute(Request::get(url)).await?;
        ResponseHandler::json(response, &[200])
    }
}
