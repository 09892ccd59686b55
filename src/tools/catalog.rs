//! Tool catalog: names, descriptions and search

use serde::Serialize;

/// A tool server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolServer {
    Prisma,
    Apikey,
    Sandbox,
}

impl ToolServer {
    pub const ALL: [ToolServer; 3] = [ToolServer::Prisma, ToolServer::Apikey, ToolServer::Sandbox];

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "prisma" => Some(ToolServer::Prisma),
            "apikey" => Some(ToolServer::Apikey),
            "sandbox" => Some(ToolServer::Sandbox),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ToolServer::Prisma => "prisma",
            ToolServer::Apikey => "apikey",
            ToolServer::Sandbox => "sandbox",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ToolServer::Prisma => "Database operations for API models, data, and authentication keys",
            ToolServer::Apikey => "Secure API key generation and validation",
            ToolServer::Sandbox => "Safe code execution environment for testing generated APIs",
        }
    }
}

/// Every tool, as `(name, description)`
pub const TOOLS: &[(&str, &str)] = &[
    ("prisma__create_model", "Create a new API model in the database"),
    ("prisma__get_models", "Get all API models"),
    ("prisma__get_model", "Get a specific API model by name"),
    ("prisma__delete_model", "Delete an API model"),
    ("prisma__create_api_key", "Create a new API key for a model"),
    ("prisma__get_api_keys", "Get all API keys for a model"),
    ("prisma__delete_api_key", "Delete an API key"),
    ("prisma__toggle_api_key", "Enable/disable an API key"),
    ("prisma__reset_api_key_usage", "Reset the usage counter of an API key"),
    ("prisma__get_api_key_usage", "Get usage statistics for an API key"),
    ("apikey__generate", "Generate a new secure API key"),
    ("apikey__validate", "Validate API key format"),
    ("sandbox__execute_code", "Execute code safely in isolated environment"),
    ("sandbox__validate_code", "Check code for dangerous patterns before execution"),
    ("sandbox__test_api", "Test API endpoints with validation"),
    ("sandbox__run_tests", "Run comprehensive test suite for an API"),
];

/// A catalog entry as returned by search
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ToolInfo {
    pub name: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<&'static str>,
}

/// Server descriptions for discovery
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ServerInfo {
    pub name: &'static str,
    pub description: &'static str,
}

/// Case-insensitive substring search over tool names and descriptions
///
/// An empty query matches every tool.
pub fn search_tools(query: &str, names_only: bool) -> Vec<ToolInfo> {
    let query = query.to_lowercase();
    TOOLS
        .iter()
        .filter(|(name, description)| {
            name.to_lowercase().contains(&query) || description.to_lowercase().contains(&query)
        })
        .map(|&(name, description)| ToolInfo {
            name,
            description: (!names_only).then_some(description),
        })
        .collect()
}

pub fn list_servers() -> Vec<ServerInfo> {
    ToolServer::ALL
        .iter()
        .map(|server| ServerInfo {
            name: server.as_str(),
            description: server.description(),
        })
        .collect()
}

/// Whether the catalog lists a tool
pub fn is_known_tool(name: &str) -> bool {
    TOOLS.iter().any(|(tool, _)| *tool == name)
}
