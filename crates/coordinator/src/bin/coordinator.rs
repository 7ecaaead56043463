//! Coordinator binary entry point
//!
//! Starts the region coordinator HTTP API.

use std::net::SocketAddr;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use coordinator::{CoordinatorServer, CoordinatorService};
use region_core::RuntimeConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "coordinator=info,region_catalog=info,region_core=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = match std::env::var("COORDINATOR_CONFIG") {
        Ok(path) => RuntimeConfig::from_file(path)?,
        Err(_) => RuntimeConfig::default(),
    };

    // Bind address from args overrides the config file
    if let Some(arg) = std::env::args().nth(1) {
        let addr: SocketAddr = arg.parse()?;
        config.coordinator.bind_address = addr.ip().to_string();
        config.coordinator.port = addr.port();
    }

    tracing::info!(
        bind_address = %config.coordinator.bind_address,
        port = config.coordinator.port,
        "Starting region coordinator"
    );

    let service = CoordinatorService::with_config(config);
    CoordinatorServer::new(service)?.run().await?;

    Ok(())
}
