//! ServerBuilder for fluent API to build HTTP servers

use super::exposure::RestExposure;
use super::host::ServerHost;
use crate::config::ServerConfig;
use crate::registry::ApiRegistry;
use anyhow::Result;
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Builder for the dynamic API server
///
/// # Example
///
/// ```ignore
/// let app = ServerBuilder::new()
///     .with_config(ServerConfig::from_yaml_file("config.yaml")?)
///     .build()?;
/// ```
pub struct ServerBuilder {
    config: Option<ServerConfig>,
    registry: Option<ApiRegistry>,
    custom_routes: Vec<Router>,
}

impl ServerBuilder {
    /// Create a new ServerBuilder
    pub fn new() -> Self {
        Self {
            config: None,
            registry: None,
            custom_routes: Vec::new(),
        }
    }

    /// Use this configuration instead of the defaults
    pub fn with_config(mut self, config: ServerConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Use an existing registry, e.g. one shared with a test
    ///
    /// Without one, an in-memory registry is created with the configured
    /// default usage limit.
    pub fn with_registry(mut self, registry: ApiRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Add custom routes to the server
    pub fn with_custom_routes(mut self, routes: Router) -> Self {
        self.custom_routes.push(routes);
        self
    }

    /// Build the transport-agnostic host
    pub fn build_host(&mut self) -> Result<ServerHost> {
        let config = self.config.take().unwrap_or_default();
        let registry = self.registry.take().unwrap_or_else(|| {
            ApiRegistry::in_memory().with_default_usage_limit(config.keys.default_usage_limit)
        });
        ServerHost::from_parts(config, registry)
    }

    /// Build the final REST router
    pub fn build(mut self) -> Result<Router> {
        let host = Arc::new(self.build_host()?);
        RestExposure::build_router(host, std::mem::take(&mut self.custom_routes))
    }

    /// Serve on the configured bind address with graceful shutdown
    pub async fn serve_configured(self) -> Result<()> {
        let addr = self.config.clone().unwrap_or_default().bind_addr()?;
        self.serve(&addr.to_string()).await
    }

    /// Serve the application with graceful shutdown
    ///
    /// Handles SIGTERM and SIGINT (Ctrl+C).
    pub async fn serve(self, addr: &str) -> Result<()> {
        let app = self.build()?;
        let listener = TcpListener::bind(addr).await?;

        tracing::info!("Server listening on {}", listener.local_addr()?);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Wait for shutdown signal (SIGTERM or Ctrl+C)
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {}", e);
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
                tracing::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal, initiating graceful shutdown...");
        },
    }
}
