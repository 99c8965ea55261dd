//! Storage groups, their volumes, and the partitions they are attached to

use serde::{Deserialize, Serialize};

use super::common::{JobHandle, ListFilter};
use super::error::Result;
use super::partition::Partition;
use super::request::{Request, Transport};
use super::response::ResponseHandler;

pub const STORAGE_GROUPS_PATH: &str = "/storage-groups";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct StorageGroup {
    pub object_uri: String,
    pub name: String,
    #[serde(default, rename = "type")]
    pub type_: Option<String>,
    #[serde(default)]
    pub fulfillment_state: Option<String>,
    #[serde(default)]
    pub cpc_uri: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct StorageGroupProperties {
    pub object_uri: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, rename = "type")]
    pub type_: Option<String>,
    #[serde(default)]
    pub shared: Option<bool>,
    #[serde(default)]
    pub fulfillment_state: Option<String>,
    #[serde(default)]
    pub cpc_uri: Option<String>,
    #[serde(default)]
    pub storage_volume_uris: Vec<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct StorageVolume {
    pub element_uri: String,
    pub name: String,
    #[serde(default)]
    pub fulfillment_state: Option<String>,
    #[serde(default)]
    pub size: Option<f64>,
    #[serde(default)]
    pub usage: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum VolumeOperation {
    Create,
    Modify,
    Delete,
}

/// One entry of the `storage-volumes` array in create and modify requests.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct VolumeRequest {
    pub operation: VolumeOperation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub element_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// GiB
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,
    /// `boot` or `data`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<String>,
}

impl VolumeRequest {
    pub fn create(size: f64, usage: impl Into<String>) -> Self {
        Self {
            operation: VolumeOperation::Create,
            element_uri: None,
            name: None,
            description: None,
            size: Some(size),
            usage: Some(usage.into()),
        }
    }

    pub fn modify(element_uri: impl Into<String>) -> Self {
        Self {
            operation: VolumeOperation::Modify,
            element_uri: Some(element_uri.into()),
            name: None,
            description: None,
            size: None,
            usage: None,
        }
    }

    pub fn delete(element_uri: impl Into<String>) -> Self {
        Self {
            operation: VolumeOperation::Delete,
            ..Self::modify(element_uri)
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_size(mut self, size: f64) -> Self {
        self.size = Some(size);
        self
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct StorageGroupCreate {
    pub name: String,
    pub cpc_uri: String,
    /// `fcp` or `fc`
    #[serde(rename = "type")]
    pub type_: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shared: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_partitions: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub storage_volumes: Vec<VolumeRequest>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct StorageGroupModify {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub storage_volumes: Vec<VolumeRequest>,
}

/// Body of `accept-mismatched-storage-volumes`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct MismatchedVolumes {
    pub adapter_port_uri: String,
    pub host_world_wide_port_name: String,
}

pub struct StorageGroupApi<'a> {
    transport: &'a dyn Transport,
}

impl<'a> StorageGroupApi<'a> {
    pub fn new(transport: &'a dyn Transport) -> Self {
        Self { transport }
    }

    /// GET /storage-groups, optionally limited to one CPC.
    pub async fn list(
        &self,
        cpc_uri: Option<&str>,
        filter: &ListFilter,
    ) -> Result<Vec<StorageGroup>> {
        let mut url = self.transport.endpoint().resource_url(STORAGE_GROUPS_PATH);
        filter
            .to_query_params()
            .add_optional("cpc-uri", cpc_uri)
            .apply(&mut url);
        let response = self.transport.execute(Request::get(url)).await?;
        ResponseHandler::list(response, "storage-groups")
    }

    pub async fn get(&self, storage_group_uri: &str) -> Result<StorageGroupProperties> {
        let url = self.transport.endpoint().resource_url(storage_group_uri);
        let response = self.transport.execute(Request::get(url)).await?;
        ResponseHandler::json(response, &[200])
    }

    pub async fn list_volumes(&self, storage_group_uri: &str) -> Result<Vec<StorageVolume>> {
        let url = self
            .transport
            .endpoint()
            .resource_url(&format!("{}/storage-volumes", storage_group_uri));
        let response = self.transport.execute(Request::get(url)).await?;
        ResponseHandler::list(response, "storage-volumes")
    }

    pub async fn get_volume(&self, volume_uri: &str) -> Result<StorageVolume> {
        let url = self.transport.endpoint().resource_url(volume_uri);
        let response = self.transport.execute(Request::get(url)).await?;
        ResponseHandler::json(response, &[200])
    }

    /// POST <storage-group-uri>/operations/modify
    ///
    /// Returns a job when the console finishes the change asynchronously.
    pub async fn update(
        &self,
        storage_group_uri: &str,
        modify: &StorageGroupModify,
    ) -> Result<Option<JobHandle>> {
        let url = self
            .transport
            .endpoint()
            .resource_url(&format!("{}/operations/modify", storage_group_uri));
        let response = self
            .transport
            .execute(Request::post(url).json(modify)?)
            .await?;
        ResponseHandler::maybe_job(response)
    }

    /// POST <storage-group-uri>/operations/accept-mismatched-storage-volumes
    pub async fn fulfill(
        &self,
        storage_group_uri: &str,
        volumes: &MismatchedVolumes,
    ) -> Result<()> {
        let url = self.transport.endpoint().resource_url(&format!(
            "{}/operations/accept-mismatched-storage-volumes",
            storage_group_uri
        ));
        let response = self
            .transport
            .execute(Request::post(url).json(volumes)?)
            .await?;
        ResponseHandler::empty(response, &[204])
    }

    /// POST /storage-groups
    pub async fn create(&self, group: &StorageGroupCreate) -> Result<String> {
        let url = self.transport.endpoint().resource_url(STORAGE_GROUPS_PATH);
        let response = self
            .transport
            .execute(Request::post(url).json(group)?)
            .await?;
        ResponseHandler::created_uri(response)
    }

    /// POST <storage-group-uri>/operations/delete
    pub async fn delete(&self, storage_group_uri: &str) -> Result<()> {
        let url = self
            .transport
            .endpoint()
            .resource_url(&format!("{}/operations/delete", storage_group_uri));
        let response = self.transport.execute(Request::post(url)).await?;
        ResponseHandler::empty(response, &[204])
    }

    /// GET <storage-group-uri>/operations/get-partitions
    pub async fn get_partitions(&self, storage_group_uri: &str) -> Result<Vec<Partition>> {
        let url = self
            .transport
            .endpoint()
            .resource_url(&format!("{}/operations/get-partitions", storage_group_uri));
        let response = self.transport.execute(Request::get(url)).await?;
        ResponseHandler::list(response, "partitions")
    }
}
