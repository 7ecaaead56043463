//! HTTP server with graceful shutdown
//!
//! Binds the coordinator API, applies the request timeout and stops on
//! Ctrl+C or SIGTERM.

use std::future::Future;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::timeout::TimeoutLayer;
use tracing::{error, info};

use region_core::{CoordinatorConfig, Error, Result};

use crate::http_api::create_router;
use crate::service::CoordinatorService;

/// Coordinator server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to
    pub addr: SocketAddr,

    /// Request timeout
    pub request_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 2379)),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl TryFrom<&CoordinatorConfig> for ServerConfig {
    type Error = Error;

    fn try_from(config: &CoordinatorConfig) -> Result<Self> {
        let ip: IpAddr = config.bind_address.parse().map_err(|e| Error::InvalidConfig {
            message: format!("invalid bind address '{}': {}", config.bind_address, e),
        })?;

        Ok(Self {
            addr: SocketAddr::new(ip, config.port),
            request_timeout: config.request_timeout,
        })
    }
}

/// Coordinator HTTP server
pub struct CoordinatorServer {
    config: ServerConfig,
    service: Arc<CoordinatorService>,
}

impl CoordinatorServer {
    /// Create a server from the service's own configuration
    pub fn new(service: CoordinatorService) -> Result<Self> {
        let config = ServerConfig::try_from(&service.config().coordinator)?;
        Ok(Self::with_config(service, config))
    }

    /// Create with custom configuration
    pub fn with_config(service: CoordinatorService, config: ServerConfig) -> Self {
        Self {
            config,
            service: Arc::new(service),
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.config.addr
    }

    /// Full router including the timeout layer
    pub fn router(&self) -> Router {
        create_router(Arc::clone(&self.service))
            .layer(TimeoutLayer::new(self.config.request_timeout))
    }

    /// Run the server until Ctrl+C or SIGTERM
    pub async fn run(self) -> Result<()> {
        let listener = TcpListener::bind(self.config.addr).await?;
        self.serve(listener, shutdown_signal()).await
    }

    /// Serve on an already bound listener until `shutdown` resolves
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        info!(address = %addr, "Coordinator HTTP API listening");

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| {
                error!(error = %e, "Server error");
                Error::Io(e)
            })?;

        info!("Coordinator server shutdown complete");
        Ok(())
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
