//! Dynamic API server
//!
//! Usage: `dynapi-server [config.yaml]`. Log filtering follows `RUST_LOG`
//! (default `info`).

use anyhow::Result;
use dynapi::prelude::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => {
            tracing::info!(path = %path, "loading configuration");
            ServerConfig::from_yaml_file(&path)?
        }
        None => ServerConfig::default(),
    };

    tracing::info!(
        environment = %config.server.environment,
        agent_role = %config.server.agent_role,
        "starting dynapi server"
    );

    ServerBuilder::new()
        .with_config(config)
        .serve_configured()
        .await
}
