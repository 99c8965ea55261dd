use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use zhmc::{Client, ClientOptions, ListFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_target(false)
        .init();

    // ZHMC_ENDPOINT, ZHMC_USERNAME, ZHMC_PASSWORD, optionally ZHMC_SKIP_CERT_VERIFY,
    // ZHMC_CA_CERT, ZHMC_TRACE
    let (endpoint, options) = ClientOptions::from_env()?;
    info!("Endpoint: {}", endpoint);

    let client = Client::new(&endpoint, options)?;

    let cpcs = match client.cpcs().list().await {
        Ok(cpcs) => cpcs,
        Err(e) => {
            error!("Failed to list CPCs: {}", e);
            return Err(e.into());
        }
    };

    for cpc in cpcs {
        info!("CPC {} ({})", cpc.name, cpc.object_uri);
        let partitions = client
            .partitions()
            .list(&cpc.object_uri, &ListFilter::new())
            .await?;

        for partition in partitions {
            info!(
                "  {:<16} {:<12} {}",
                partition.name,
                partition.status.as_deref().unwrap_or("-"),
                partition.object_uri
            );
        }
    }

    let stats = client.connection_stats().await;
    info!(
        "{} requests, {} failed, {} logons",
        stats.total_requests, stats.failed_requests, stats.logons
    );

    client.logoff().await?;
    Ok(())
}
