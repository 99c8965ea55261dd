//! I/O adapters of a CPC and their ports

use serde::{Deserialize, Serialize};

use super::common::ListFilter;
use super::error::Result;
use super::request::{Request, Transport};
use super::response::ResponseHandler;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Adapter {
    pub object_uri: String,
    pub name: String,
    #[serde(default)]
    pub adapter_id: Option<String>,
    #[serde(default)]
    pub adapter_family: Option<String>,
    #[serde(default, rename = "type")]
    pub type_: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AdapterProperties {
    pub object_uri: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub adapter_id: Option<String>,
    #[serde(default)]
    pub adapter_family: Option<String>,
    #[serde(default, rename = "type")]
    pub type_: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub network_port_uris: Vec<String>,
    #[serde(default)]
    pub storage_port_uris: Vec<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct HipersocketCreate {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum_transmission_unit_size: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct NetworkPort {
    pub element_uri: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub index: Option<u32>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct StoragePort {
    pub element_uri: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub index: Option<u32>,
    #[serde(default)]
    pub fabric_id: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

pub struct AdapterApi<'a> {
    transport: &'a dyn Transport,
}

impl<'a> AdapterApi<'a> {
    pub fn new(transport: &'a dyn Transport) -> Self {
        Self { transport }
    }

    /// GET <cpc-uri>/adapters
    pub async fn list(&self, cpc_uri: &str, filter: &ListFilter) -> Result<Vec<Adapter>> {
        let mut url = self
            .transport
            .endpoint()
            .resource_url(&format!("{}/adapters", cpc_uri));
        filter.to_query_params().apply(&mut url);
        let response = self.transport.execute(Request::get(url)).await?;
        ResponseHandler::list(response, "adapters")
    }

    /// GET <adapter-uri>
    pub async fn get(&self, adapter_uri: &str) -> Result<AdapterProperties> {
        let url = self.transport.endpoint().resource_url(adapter_uri);
        let response = self.transport.execute(Request::get(url)).await?;
        ResponseHandler::json(response, &[200])
    }

    /// POST <cpc-uri>/adapters
    pub async fn create_hipersocket(
        &self,
        cpc_uri: &str,
        adapter: &HipersocketCreate,
    ) -> Result<String> {
        let url = self
            .transport
            .endpoint()
            .resource_url(&format!("{}/adapters", cpc_uri));
        let response = self
            .transport
            .execute(Request::post(url).json(adapter)?)
            .await?;
        ResponseHandler::created_uri(response)
    }

    /// DELETE <adapter-uri>
    pub async fn delete_hipersocket(&self, adapter_uri: &str) -> Result<()> {
        let url = self.transport.endpoint().resource_url(adapter_uri);
        let response = self.transport.execute(Request::delete(url)).await?;
        ResponseHandler::empty(response, &[204])
    }

    pub async fn get_network_port(&self, port_uri: &str) -> Result<NetworkPort> {
        let url = self.transport.endpoint().resource_url(port_uri);
        let response = self.transport.execute(Request::get(url)).await?;
        ResponseHandler::json(response, &[200])
    }

    pub async fn get_storage_port(&self, port_uri: &str) -> Result<StoragePort> {
        let url = self.transport.endpoint().resource_url(port_uri);
        let response = self.transport.execute(Request::get(url)).await?;
        ResponseHandler::json(response, &[200])
    }
}
