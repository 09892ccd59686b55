//! Server host for transport-agnostic API exposure
//!
//! The host owns everything the exposures need: configuration, the model
//! registry and the tool client. It knows nothing about HTTP.

use crate::config::ServerConfig;
use crate::registry::ApiRegistry;
use crate::sandbox::{ApiTestRunner, Sandbox};
use crate::tools::ToolClient;
use anyhow::Result;
use std::sync::Arc;
use std::time::Instant;

/// Host context containing all service state
pub struct ServerHost {
    /// Validated configuration
    pub config: Arc<ServerConfig>,

    /// Models, records and API keys
    pub registry: ApiRegistry,

    /// Dispatcher for `server__tool` calls
    pub tools: ToolClient,

    /// When the host was built, for the health endpoint
    pub started_at: Instant,
}

impl ServerHost {
    /// Build the host from a configuration and a registry
    ///
    /// The configuration is checked first; the sandbox and the test runner
    /// are derived from it.
    pub fn from_parts(config: ServerConfig, registry: ApiRegistry) -> Result<Self> {
        config.check()?;

        let sandbox = Sandbox::new(&config.sandbox);
        let runner = ApiTestRunner::new(config.test_runner.base_url.clone());
        let tools = ToolClient::new(registry.clone(), sandbox, runner);

        Ok(Self {
            config: Arc::new(config),
            registry,
            tools,
            started_at: Instant::now(),
        })
    }

    /// Seconds since the host was built
    pub fn uptime(&self) -> f64 {
        self.started_at.elapsed().as_secs_f64()
    }
}
