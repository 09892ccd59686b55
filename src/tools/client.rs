//! Dispatch of `server__tool` calls

use crate::core::api_key::{generate_api_key, is_valid_api_key_format};
use crate::core::error::ToolError;
use crate::core::model::NewApiModel;
use crate::core::schema::Schema;
use crate::registry::ApiRegistry;
use crate::sandbox::{ApiTestConfig, ApiTestRunner, ExecutionConfig, Sandbox, validate_code};
use crate::tools::catalog::ToolServer;
use crate::tools::prisma;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

#[derive(Debug, Deserialize)]
struct KeyInput {
    key: String,
}

#[derive(Debug, Deserialize)]
struct CodeInput {
    code: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RunTestsInput {
    api_name: String,
    schema: Value,
}

/// Routes tool calls to the registry, the sandbox and the test runner
#[derive(Clone)]
pub struct ToolClient {
    registry: ApiRegistry,
    sandbox: Sandbox,
    runner: ApiTestRunner,
}

impl ToolClient {
    pub fn new(registry: ApiRegistry, sandbox: Sandbox, runner: ApiTestRunner) -> Self {
        Self {
            registry,
            sandbox,
            runner,
        }
    }

    /// Call a tool by its full `server__tool` name
    pub async fn call(&self, name: &str, input: Value) -> Result<Value, ToolError> {
        let (server_name, tool) = name
            .split_once("__")
            .filter(|(server, tool)| !server.is_empty() && !tool.is_empty())
            .ok_or_else(|| ToolError::MalformedName {
                name: name.to_string(),
            })?;
        let server = ToolServer::parse(server_name).ok_or_else(|| ToolError::UnknownServer {
            server: server_name.to_string(),
        })?;

        tracing::debug!(server = server.as_str(), tool, "tool call");

        match server {
            ToolServer::Prisma => self.call_prisma(tool, input).await,
            ToolServer::Apikey => call_apikey(tool, input),
            ToolServer::Sandbox => self.call_sandbox(tool, input).await,
        }
    }

    async fn call_prisma(&self, tool: &str, input: Value) -> Result<Value, ToolError> {
        let registry = &self.registry;
        let state = match tool {
            "create_model" => {
                let input: NewApiModel = parse_input(tool, input)?;
                prisma::create_model(registry, input).await
            }
            "get_models" => prisma::get_models(registry).await,
            "get_model" => prisma::get_model(registry, parse_input(tool, input)?).await,
            "delete_model" => prisma::delete_model(registry, parse_input(tool, input)?).await,
            "create_api_key" => prisma::create_api_key(registry, parse_input(tool, input)?).await,
            "get_api_keys" => prisma::get_api_keys(registry, parse_input(tool, input)?).await,
            "delete_api_key" => prisma::delete_api_key(registry, parse_input(tool, input)?).await,
            "toggle_api_key" => prisma::toggle_api_key(registry, parse_input(tool, input)?).await,
            "reset_api_key_usage" => {
                prisma::reset_api_key_usage(registry, parse_input(tool, input)?).await
            }
            "get_api_key_usage" => {
                prisma::get_api_key_usage(registry, parse_input(tool, input)?).await
            }
            _ => return Err(unknown_tool(ToolServer::Prisma, tool)),
        };
        to_value(tool, &state)
    }

    async fn call_sandbox(&self, tool: &str, input: Value) -> Result<Value, ToolError> {
        match tool {
            "execute_code" => {
                let config: ExecutionConfig = parse_input(tool, input)?;
                let result = self.sandbox.execute(&config).await;
                to_value(tool, &result)
            }
            "validate_code" => {
                let input: CodeInput = parse_input(tool, input)?;
                to_value(tool, &validate_code(&input.code))
            }
            "test_api" => {
                let config: ApiTestConfig = parse_input(tool, input)?;
                let result = self
                    .runner
                    .test_api(&config)
                    .await
                    .map_err(|e| ToolError::InvalidInput {
                        tool: tool.to_string(),
                        message: e.to_string(),
                    })?;
                to_value(tool, &result)
            }
            "run_tests" => {
                let input: RunTestsInput = parse_input(tool, input)?;
                let schema =
                    Schema::from_value(&input.schema).map_err(|e| ToolError::InvalidInput {
                        tool: tool.to_string(),
                        message: e.to_string(),
                    })?;
                let result = self.runner.run_validation_suite(&input.api_name, &schema).await;
                to_value(tool, &result)
            }
            _ => Err(unknown_tool(ToolServer::Sandbox, tool)),
        }
    }
}

fn call_apikey(tool: &str, input: Value) -> Result<Value, ToolError> {
    match tool {
        "generate" => Ok(json!({ "key": generate_api_key() })),
        "validate" => {
            let input: KeyInput = parse_input(tool, input)?;
            Ok(json!({ "valid": is_valid_api_key_format(&input.key) }))
        }
        _ => Err(unknown_tool(ToolServer::Apikey, tool)),
    }
}

fn parse_input<T: DeserializeOwned>(tool: &str, input: Value) -> Result<T, ToolError> {
    // Tools without parameters may be called with no body at all
    let input = if input.is_null() { json!({}) } else { input };
    serde_json::from_value(input).map_err(|e| ToolError::InvalidInput {
        tool: tool.to_string(),
        message: e.to_string(),
    })
}

fn to_value<T: serde::Serialize>(tool: &str, output: &T) -> Result<Value, ToolError> {
    serde_json::to_value(output).map_err(|e| ToolError::Failed {
        tool: tool.to_string(),
        message: e.to_string(),
    })
}

fn unknown_tool(server: ToolServer, tool: &str) -> ToolError {
    ToolError::UnknownTool {
        server: server.as_str().to_string(),
        tool: tool.to_string(),
    }
}
