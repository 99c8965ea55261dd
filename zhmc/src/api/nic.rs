//! Virtual NICs of a partition

use serde::{Deserialize, Serialize};

use super::error::Result;
use super::request::{Request, Transport};
use super::response::ResponseHandler;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct NicProperties {
    pub element_uri: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, rename = "type")]
    pub type_: Option<String>,
    #[serde(default)]
    pub device_number: Option<String>,
    #[serde(default)]
    pub mac_address: Option<String>,
    #[serde(default)]
    pub virtual_switch_uri: Option<String>,
    #[serde(default)]
    pub network_adapter_port_uri: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Body of `POST <partition-uri>/nics`. Hipersocket and OSA NICs name a
/// virtual switch, RoCE NICs name an adapter port.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct NicCreate {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub virtual_switch_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_adapter_port_uri: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct NicUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_number: Option<String>,
}

pub struct NicApi<'a> {
    transport: &'a dyn Transport,
}

impl<'a> NicApi<'a> {
    pub fn new(transport: &'a dyn Transport) -> Self {
        Self { transport }
    }

    /// POST <partition-uri>/nics
    pub async fn create(&self, partition_uri: &str, nic: &NicCreate) -> Result<String> {
        let url = self
            .transport
            .endpoint()
            .resource_url(&format!("{}/nics", partition_uri));
        let response = self.transport.execute(Request::post(url).json(nic)?).await?;
        ResponseHandler::created_uri(response)
    }

    /// GET <nic-uri>
    pub async fn get(&self, nic_uri: &str) -> Result<NicProperties> {
        let url = self.transport.endpoint().resource_url(nic_uri);
        let response = self.transport.execute(Request::get(url)).await?;
        ResponseHandler::json(response, &[200])
    }

    /// POST <nic-uri>
    pub async fn update(&self, nic_uri: &str, update: &NicUpdate) -> Result<()> {
        let url = self.transport.endpoint().resource_url(nic_uri);
        let response = self
            .transport
            .execute(Request::post(url).json(update)?)
            .await?;
        ResponseHandler::empty(response, &[204])
    }

    /// DELETE <nic-uri>
    pub async fn delete(&self, nic_uri: &str) -> Result<()> {
        let url = self.transport.endpoint().resource_url(nic_uri);
        let response = self.transport.execute(Request::delete(url)).await?;
        ResponseHandler::empty(response, &[204])
    }
}
