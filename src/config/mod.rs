//! Configuration loading and management
//!
//! Every section has defaults, so an empty YAML document (or no file at all)
//! yields a working configuration.

use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use validator::Validate;

/// Complete service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ServerConfig {
    #[validate(nested)]
    pub server: HttpConfig,

    #[validate(nested)]
    pub keys: KeysConfig,

    #[validate(nested)]
    pub pagination: PaginationConfig,

    #[validate(nested)]
    pub sandbox: SandboxConfig,

    #[validate(nested)]
    pub test_runner: TestRunnerConfig,
}

/// HTTP listener and health metadata
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct HttpConfig {
    /// Address to bind, e.g. `127.0.0.1:3000`
    #[validate(length(min = 1))]
    pub bind: String,

    /// Reported by the health endpoint
    pub agent_role: String,

    /// Reported by the health endpoint
    pub environment: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3000".to_string(),
            agent_role: "api-builder".to_string(),
            environment: "development".to_string(),
        }
    }
}

/// API key defaults
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct KeysConfig {
    /// Usage limit given to new keys
    #[validate(range(min = 1))]
    pub default_usage_limit: u64,
}

impl Default for KeysConfig {
    fn default() -> Self {
        Self {
            default_usage_limit: 1000,
        }
    }
}

/// List endpoint paging bounds
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct PaginationConfig {
    #[validate(range(min = 1))]
    pub default_limit: usize,

    #[validate(range(min = 1, max = 1000))]
    pub max_limit: usize,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_limit: 10,
            max_limit: 100,
        }
    }
}

/// Code execution sandbox
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct SandboxConfig {
    /// Interpreter used to run snippets
    #[validate(length(min = 1))]
    pub interpreter: String,

    /// Directory holding per-run temp directories
    pub root_dir: PathBuf,

    /// Milliseconds
    #[validate(range(min = 1, max = 300_000))]
    pub default_timeout_ms: u64,

    /// e.g. `128MB`
    #[validate(length(min = 1))]
    pub default_memory: String,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            interpreter: "node".to_string(),
            root_dir: std::env::temp_dir().join("dynapi-sandbox"),
            default_timeout_ms: 5000,
            default_memory: "128MB".to_string(),
        }
    }
}

/// API smoke-test runner
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct TestRunnerConfig {
    /// Base URL the generated tests are sent to
    #[validate(url)]
    pub base_url: String,
}

impl Default for TestRunnerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:3000".to_string(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| anyhow!("Failed to read {}: {}", path.as_ref().display(), e))?;
        Self::from_yaml_str(&content)
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(yaml)?
        };
        config.check()?;
        Ok(config)
    }

    /// Run the field validators and cross-field checks
    pub fn check(&self) -> Result<()> {
        self.validate()
            .map_err(|e| anyhow!("Invalid configuration: {}", e))?;

        if self.pagination.default_limit > self.pagination.max_limit {
            return Err(anyhow!(
                "Invalid configuration: pagination.default_limit ({}) exceeds max_limit ({})",
                self.pagination.default_limit,
                self.pagination.max_limit
            ));
        }
        self.bind_addr()?;
        Ok(())
    }

    /// Parsed bind address
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        self.server
            .bind
            .parse()
            .map_err(|e| anyhow!("Invalid bind address '{}': {}", self.server.bind, e))
    }

    /// Configuration for tests: port 0, sandbox under the system temp dir
    pub fn default_config() -> Self {
        let mut config = Self::default();
        config.server.bind = "127.0.0.1:0".to_string();
        config.server.environment = "test".to_string();
        config
    }
}
