//! Partitions (LPARs) of a CPC

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use super::common::{JobHandle, ListFilter, QueryParams};
use super::error::{ErrorKind, HmcError, Result};
use super::metrics::MetricsApi;
use super::request::{Method, Request, Response, Transport};
use super::response::ResponseHandler;

pub const LPAR_USAGE_GROUP: &str = "logical-partition-usage";
pub const POWER_METRIC: &str = "power-consumption-watts";

const LIVE_ENERGY_FREQUENCY_SECONDS: u32 = 15;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Partition {
    pub object_uri: String,
    pub name: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, rename = "type")]
    pub type_: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PartitionProperties {
    pub object_uri: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, rename = "type")]
    pub type_: Option<String>,
    #[serde(default)]
    pub short_name: Option<String>,
    #[serde(default)]
    pub ifl_processors: Option<u32>,
    #[serde(default)]
    pub cp_processors: Option<u32>,
    #[serde(default)]
    pub initial_memory: Option<u64>,
    #[serde(default)]
    pub maximum_memory: Option<u64>,
    #[serde(default)]
    pub boot_device: Option<String>,
    #[serde(default)]
    pub boot_iso_image_name: Option<String>,
    #[serde(default)]
    pub nic_uris: Vec<String>,
    #[serde(default)]
    pub storage_group_uris: Vec<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Body of `POST <cpc-uri>/partitions`. Memory sizes are in MiB.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct PartitionCreate {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", rename = "type")]
    pub type_: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ifl_processors: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cp_processors: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processor_mode: Option<String>,
    pub initial_memory: u64,
    pub maximum_memory: u64,
}

/// Body of `POST <partition-uri>`; only the set fields change.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct PartitionUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ifl_processors: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cp_processors: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_memory: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum_memory: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boot_device: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boot_iso_ins_file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boot_timeout: Option<u32>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct CryptoDomainConfig {
    pub domain_index: u32,
    /// `control` or `control-usage`
    pub access_mode: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct CryptoConfig {
    pub crypto_adapter_uris: Vec<String>,
    pub crypto_domain_configurations: Vec<CryptoDomainConfig>,
}

#[derive(Serialize)]
#[serde(rename_all = "kebab-case")]
struct StorageGroupRef<'a> {
    storage_group_uri: &'a str,
}

/// Where to reach a partition's ASCII console.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsciiConsole {
    pub websocket_uri: String,
    /// Session the websocket must authenticate with.
    pub session_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "kebab-case")]
struct WebsocketUri {
    websocket_uri: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct SustainabilityQuery {
    /// `last-day`, `last-week`, `last-month`, ...
    pub range: String,
    /// `fifteen-minutes`, `one-hour`, `one-day`, ...
    pub resolution: String,
}

impl Default for SustainabilityQuery {
    fn default() -> Self {
        Self {
            range: "last-day".to_string(),
            resolution: "fifteen-minutes".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WattageSample {
    pub data: f64,
    /// Milliseconds since the epoch.
    pub timestamp: i64,
}

#[derive(Deserialize)]
struct SustainabilityData {
    #[serde(default)]
    wattage: Vec<WattageSample>,
}

pub struct PartitionApi<'a> {
    transport: &'a dyn Transport,
}

impl<'a> PartitionApi<'a> {
    pub fn new(transport: &'a dyn Transport) -> Self {
        Self { transport }
    }

    /// GET <cpc-uri>/partitions
    pub async fn list(&self, cpc_uri: &str, filter: &ListFilter) -> Result<Vec<Partition>> {
        let mut url = self
            .transport
            .endpoint()
            .resource_url(&format!("{}/partitions", cpc_uri));
        filter.to_query_params().apply(&mut url);
        let response = self.transport.execute(Request::get(url)).await?;
        ResponseHandler::list(response, "partitions")
    }

    /// GET <partition-uri>
    pub async fn get(&self, partition_uri: &str) -> Result<PartitionProperties> {
        let url = self.transport.endpoint().resource_url(partition_uri);
        let response = self.transport.execute(Request::get(url)).await?;
        ResponseHandler::json(response, &[200])
    }

    /// POST <cpc-uri>/partitions, returns the new partition's URI.
    pub async fn create(&self, cpc_uri: &str, partition: &PartitionCreate) -> Result<String> {
        let url = self
            .transport
            .endpoint()
            .resource_url(&format!("{}/partitions", cpc_uri));
        let response = self
            .transport
            .execute(Request::post(url).json(partition)?)
            .await?;
        ResponseHandler::created_uri(response)
    }

    /// POST <partition-uri>
    pub async fn update(&self, partition_uri: &str, update: &PartitionUpdate) -> Result<()> {
        let url = self.transport.endpoint().resource_url(partition_uri);
        let response = self
            .transport
            .execute(Request::post(url).json(update)?)
            .await?;
        ResponseHandler::empty(response, &[204])
    }

    /// DELETE <partition-uri>
    pub async fn delete(&self, partition_uri: &str) -> Result<()> {
        let url = self.transport.endpoint().resource_url(partition_uri);
        let response = self.transport.execute(Request::delete(url)).await?;
        ResponseHandler::empty(response, &[204])
    }

    /// POST <partition-uri>/operations/start
    pub async fn start(&self, partition_uri: &str) -> Result<JobHandle> {
        let response = self.operation(partition_uri, "start").await?;
        ResponseHandler::job(response)
    }

    /// POST <partition-uri>/operations/stop
    pub async fn stop(&self, partition_uri: &str) -> Result<JobHandle> {
        let response = self.operation(partition_uri, "stop").await?;
        ResponseHandler::job(response)
    }

    /// Upload an ISO image and mount it, together with the INS file inside
    /// it that drives the boot.
    pub async fn mount_iso(
        &self,
        partition_uri: &str,
        image: Bytes,
        image_name: &str,
        ins_file_name: &str,
    ) -> Result<()> {
        let mut url = self
            .transport
            .endpoint()
            .resource_url(&format!("{}/operations/mount-iso-image", partition_uri));
        QueryParams::new()
            .add("image-name", image_name)
            .add("ins-file-name", ins_file_name)
            .apply(&mut url);

        tracing::debug!(
            "Mounting {} ({} bytes) on {}",
            image_name,
            image.len(),
            partition_uri
        );
        let response = self.transport.upload(Method::POST, url, image).await?;
        ResponseHandler::empty(response, &[204])
    }

    /// POST <partition-uri>/operations/unmount-iso-image
    pub async fn unmount_iso(&self, partition_uri: &str) -> Result<()> {
        let response = self.operation(partition_uri, "unmount-iso-image").await?;
        ResponseHandler::empty(response, &[204])
    }

    /// URIs of the partition's NICs.
    pub async fn list_nics(&self, partition_uri: &str) -> Result<Vec<String>> {
        Ok(self.get(partition_uri).await?.nic_uris)
    }

    pub async fn attach_storage_group(
        &self,
        partition_uri: &str,
        storage_group_uri: &str,
    ) -> Result<()> {
        self.storage_group_operation(partition_uri, "attach-storage-group", storage_group_uri)
            .await
    }

    pub async fn detach_storage_group(
        &self,
        partition_uri: &str,
        storage_group_uri: &str,
    ) -> Result<()> {
        self.storage_group_operation(partition_uri, "detach-storage-group", storage_group_uri)
            .await
    }

    /// POST <partition-uri>/operations/increase-crypto-configuration
    pub async fn increase_crypto_configuration(
        &self,
        partition_uri: &str,
        config: &CryptoConfig,
    ) -> Result<()> {
        let url = self.transport.endpoint().resource_url(&format!(
            "{}/operations/increase-crypto-configuration",
            partition_uri
        ));
        let response = self
            .transport
            .execute(Request::post(url).json(config)?)
            .await?;
        ResponseHandler::empty(response, &[204])
    }

    /// Websocket URI of the ASCII console, with the session it belongs to.
    pub async fn ascii_console(&self, partition_uri: &str) -> Result<AsciiConsole> {
        let response = self
            .operation(partition_uri, "get-ascii-console-websocket-uri")
            .await?;
        let status = response.status;
        let ws: WebsocketUri = ResponseHandler::json(response, &[200])?;

        let session_id = self.transport.session_id().await.ok_or_else(|| {
            HmcError::new(ErrorKind::EmptyResponse, "no session for the console websocket")
                .with_status(status)
        })?;

        Ok(AsciiConsole {
            websocket_uri: ws.websocket_uri,
            session_id,
        })
    }

    /// Historical power draw of the partition.
    pub async fn energy(
        &self,
        partition_uri: &str,
        query: &SustainabilityQuery,
    ) -> Result<Vec<WattageSample>> {
        let url = self.transport.endpoint().resource_url(&format!(
            "{}/operations/get-historical-sustainability-data",
            partition_uri
        ));
        let response = self
            .transport
            .execute(Request::post(url).json(query)?)
            .await?;
        let data: SustainabilityData = ResponseHandler::json(response, &[200])?;
        Ok(data.wattage)
    }

    /// Current power draw in watts, read through a short-lived metrics context.
    pub async fn live_energy(&self, partition_uri: &str) -> Result<f64> {
        let metrics = MetricsApi::new(self.transport);
        let context = metrics
            .create_context(&[LPAR_USAGE_GROUP], LIVE_ENERGY_FREQUENCY_SECONDS)
            .await?;

        let reading = async {
            let index = context
                .metric_index(LPAR_USAGE_GROUP, POWER_METRIC)
                .ok_or_else(|| {
                    HmcError::new(
                        ErrorKind::EmptyResponse,
                        format!("metrics context does not offer {}", POWER_METRIC),
                    )
                })?;

            metrics
                .get_metrics(&context.uri)
                .await?
                .iter()
                .filter(|s| s.group == LPAR_USAGE_GROUP && s.object_uri == partition_uri)
                .find_map(|s| s.value(index).and_then(|v| v.as_f64()))
                .ok_or_else(|| {
                    HmcError::new(
                        ErrorKind::EmptyResponse,
                        format!("no {} reading for {}", POWER_METRIC, partition_uri),
                    )
                })
        }
        .await;

        if let Err(e) = metrics.delete_context(&context.uri).await {
            tracing::warn!("Failed to delete metrics context {}: {}", context.uri, e);
        }
        reading
    }

    async fn operation(&self, partition_uri: &str, operation: &str) -> Result<Response> {
        let url = self
            .transport
            .endpoint()
            .resource_url(&format!("{}/operations/{}", partition_uri, operation));
        self.transport.execute(Request::post(url)).await
    }

    async fn storage_group_operation(
        &self,
        partition_uri: &str,
        operation: &str,
        storage_group_uri: &str,
    ) -> Result<()> {
        let url = self
            .transport
            .endpoint()
            .resource_url(&format!("{}/operations/{}", partition_uri, operation));
        let request = Request::post(url).json(&StorageGroupRef { storage_group_uri })?;
        let response = self.transport.execute(request).await?;
        ResponseHandler::empty(response, &[204])
    }
}
