//! HTTP surface of the tool servers

use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::core::error::{ApiResult, ToolError};
use crate::tools::catalog::{list_servers, search_tools};
use crate::tools::client::ToolClient;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolSearchParams {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub names_only: bool,
}

/// `GET /mcp/tools?query=&namesOnly=`
pub async fn list_tools(Query(params): Query<ToolSearchParams>) -> Json<Value> {
    let tools = search_tools(&params.query, params.names_only);
    Json(json!({ "tools": tools, "count": tools.len() }))
}

/// `GET /mcp/servers`
pub async fn get_servers() -> Json<Value> {
    Json(json!({ "servers": list_servers() }))
}

/// `POST /mcp/tools/{tool_name}`: the JSON body is the tool input
///
/// Bodies that are not `application/json` are refused, so a browser cannot
/// reach a tool without a CORS preflight.
pub async fn call_tool(
    State(client): State<ToolClient>,
    Path(tool_name): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let input = match payload {
        Ok(Json(input)) => input,
        Err(JsonRejection::MissingJsonContentType(_)) => {
            tracing::warn!(tool = %tool_name, "tool call without a JSON content type");
            return Err(ToolError::UnsupportedMediaType { tool: tool_name }.into());
        }
        Err(rejection) => {
            return Err(ToolError::InvalidInput {
                tool: tool_name,
                message: rejection.body_text(),
            }
            .into());
        }
    };

    let output = client.call(&tool_name, input).await?;
    tracing::info!(tool = %tool_name, "tool called");
    Ok(Json(output))
}
