//! # dynapi
//!
//! Schema-defined REST endpoints created at runtime.
//!
//! A model is a name plus a JSON schema mapping field names to type tags
//! (`string`, `number`, `boolean`, `array`, `object`). Once registered, the
//! model is served under `/api/{name}` with validation on create, filtering
//! and sorting from query parameters, pagination, optional API key
//! authentication with per-key quotas, and a generated OpenAPI document.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use dynapi::prelude::*;
//!
//! let registry = ApiRegistry::in_memory();
//! registry
//!     .create_model(NewApiModel {
//!         name: "Products".to_string(),
//!         schema: r#"{"name":"string","price":"number"}"#.to_string(),
//!         generated_by_ai: false,
//!         ai_prompt: None,
//!         requires_auth: false,
//!     })
//!     .await?;
//!
//! ServerBuilder::new()
//!     .with_registry(registry)
//!     .serve("127.0.0.1:3000")
//!     .await?;
//! ```
//!
//! The query builder and the validator are usable on their own:
//!
//! ```rust,ignore
//! let schema = Schema::from_json_str(r#"{"price":"number"}"#)?;
//! let filter = build_filter(&params, &schema);
//! let errors = validate_record(&schema, &record);
//! ```

pub mod config;
pub mod core;
pub mod records;
pub mod registry;
pub mod sandbox;
pub mod server;
pub mod storage;
pub mod tools;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core ===
    pub use crate::core::{
        api_key::{ApiKey, KeyUsage},
        auth::{API_KEY_HEADER, authenticate},
        error::{ApiError, ApiResult, AuthError, ModelError, RecordError, ToolError},
        filter::{FilterCondition, FilterExpression, FilterOp, SortDirection, SortSpec},
        model::{ApiModel, NewApiModel},
        query::{QueryParams, build_filter, build_sort},
        record::StoredRecord,
        schema::{FieldType, Schema},
        service::{ApiKeyService, ModelService, RecordService},
        validation::validate_record,
    };

    // === Registry and storage ===
    pub use crate::registry::ApiRegistry;
    pub use crate::storage::{InMemoryApiKeyService, InMemoryModelService, InMemoryRecordService};

    // === Sandbox and tools ===
    pub use crate::sandbox::{ApiTestRunner, ExecutionConfig, ExecutionResult, Sandbox};
    pub use crate::tools::{FormState, ToolClient};

    // === Config ===
    pub use crate::config::ServerConfig;

    // === Server ===
    pub use crate::server::{RestExposure, ServerBuilder, ServerHost};

    // === External dependencies ===
    pub use anyhow::Result;
    pub use async_trait::async_trait;
    pub use chrono::{DateTime, Utc};
    pub use serde::{Deserialize, Serialize};
    pub use serde_json::{Value, json};
    pub use uuid::Uuid;
}
