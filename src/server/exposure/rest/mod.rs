//! REST API exposure
//!
//! Consumes a `ServerHost` and produces the Axum `Router`:
//! - `/api/health`
//! - `/api/{model}` and `/api/{model}/docs` for every dynamic API
//! - `/mcp/tools` and `/mcp/servers` for the tool servers

use super::super::host::ServerHost;
use crate::records::{
    RecordState, api_docs, create_record, delete_record, list_records, update_record,
};
use crate::tools::handlers::{call_tool, get_servers, list_tools};
use anyhow::Result;
use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use chrono::Utc;
use serde_json::{Value, json};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// REST API exposure implementation
pub struct RestExposure;

impl RestExposure {
    /// Build the REST router from a host
    ///
    /// Custom routes are merged after the built-in ones. Health, record and
    /// custom routes allow any origin; `/mcp` routes send no CORS headers.
    pub fn build_router(host: Arc<ServerHost>, custom_routes: Vec<Router>) -> Result<Router> {
        let record_state = RecordState::new(host.registry.clone(), host.config.pagination.clone());

        let mut public = Self::health_routes(host.clone()).merge(Self::record_routes(record_state));
        for custom_router in custom_routes {
            public = public.merge(custom_router);
        }

        // Tool routes administer the server and get no cross-origin access
        let app = public
            .layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            )
            .merge(Self::tool_routes(host));

        Ok(app.layer(TraceLayer::new_for_http()))
    }

    fn health_routes(host: Arc<ServerHost>) -> Router {
        Router::new()
            .route("/api/health", get(Self::health_check))
            .with_state(host)
    }

    fn record_routes(state: RecordState) -> Router {
        Router::new()
            .route(
                "/api/{model}",
                get(list_records)
                    .post(create_record)
                    .put(update_record)
                    .delete(delete_record),
            )
            .route("/api/{model}/docs", get(api_docs))
            .with_state(state)
    }

    fn tool_routes(host: Arc<ServerHost>) -> Router {
        Router::new()
            .route("/mcp/tools", get(list_tools))
            .route("/mcp/servers", get(get_servers))
            .route("/mcp/tools/{tool_name}", post(call_tool))
            .with_state(host.tools.clone())
    }

    /// Health check endpoint handler
    async fn health_check(State(host): State<Arc<ServerHost>>) -> Json<Value> {
        Json(json!({
            "status": "healthy",
            "agentRole": host.config.server.agent_role,
            "uptime": host.uptime(),
            "timestamp": Utc::now().to_rfc3339(),
            "environment": host.config.server.environment,
        }))
    }
}
