use serde::{Deserialize, Serialize};

use super::common::ListFilter;
use super::error::Result;
use super::request::{Request, Transport};
use super::response::ResponseHandler;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct VirtualSwitch {
    pub object_uri: String,
    pub name: String,
    #[serde(default, rename = "type")]
    pub type_: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct VirtualSwitchProperties {
    pub object_uri: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, rename = "type")]
    pub type_: Option<String>,
    #[serde(default)]
    pub backing_adapter_uri: Option<String>,
    #[serde(default)]
    pub port: Option<u32>,
    #[serde(default)]
    pub connected_vnic_uris: Vec<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

pub struct VirtualSwitchApi<'a> {
    transport: &'a dyn Transport,
}

impl<'a> VirtualSwitchApi<'a> {
    pub fn new(transport: &'a dyn Transport) -> Self {
        Self { transport }
    }

    /// GET <cpc-uri>/virtual-switches
    pub async fn list(&self, cpc_uri: &str, filter: &ListFilter) -> Result<Vec<VirtualSwitch>> {
        let mut url = self
            .transport
            .endpoint()
            .resource_url(&format!("{}/virtual-switches", cpc_uri));
        filter.to_query_params().apply(&mut url);
        let response = self.transport.execute(Request::get(url)).await?;
        ResponseHandler::list(response, "virtual-switches")
    }

    /// GET <virtual-switch-uri>
    pub async fn get(&self, vswitch_uri: &str) -> Result<VirtualSwitchProperties> {
        let url = self.transport.endpoint().resource_url(vswitch_uri);
        let response = self.transport.execute(Request::get(url)).await?;
        ResponseHandler::json(response, &[200])
    }
}
