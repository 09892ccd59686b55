//! Typed error handling for the dynapi service
//!
//! Handlers return [`ApiError`], which renders as a JSON body of the form
//! `{"error": <title>, "message": <text>, "code": <CODE>}` with the matching
//! HTTP status. Validation failures also carry the violation list under
//! `errors`.
//!
//! # Error Categories
//!
//! - [`ModelError`]: model registry failures (unknown API, duplicate name, bad schema)
//! - [`RecordError`]: record lookups and request bodies
//! - [`AuthError`]: API key authentication and quota
//! - [`ToolError`]: tool dispatch
//!
//! Stores return `anyhow::Result`; those errors become [`ApiError::Storage`]
//! at the handler boundary.

use crate::core::schema::SchemaError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::fmt;
use uuid::Uuid;

/// The main error type of the service
#[derive(Debug)]
pub enum ApiError {
    /// Model registry errors
    Model(ModelError),

    /// Record errors
    Record(RecordError),

    /// API key authentication errors
    Auth(AuthError),

    /// Tool dispatch errors
    Tool(ToolError),

    /// Record failed schema validation
    Validation(Vec<String>),

    /// Some other resource (an API key) was not found
    NotFound { resource: &'static str, id: String },

    /// Storage backend failure
    Storage(String),

    /// Unexpected internal failure
    Internal(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Model(e) => write!(f, "{}", e),
            ApiError::Record(e) => write!(f, "{}", e),
            ApiError::Auth(e) => write!(f, "{}", e),
            ApiError::Tool(e) => write!(f, "{}", e),
            ApiError::Validation(errors) => {
                write!(f, "Record has {} validation error(s)", errors.len())
            }
            ApiError::NotFound { resource, id } => {
                write!(f, "No {} found with id \"{}\"", resource, id)
            }
            ApiError::Storage(msg) => write!(f, "Storage error: {}", msg),
            ApiError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ApiError::Model(e) => Some(e),
            ApiError::Record(e) => Some(e),
            ApiError::Auth(e) => Some(e),
            ApiError::Tool(e) => Some(e),
            _ => None,
        }
    }
}

/// Error response structure for HTTP responses
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Short title
    pub error: String,
    /// Human-readable message
    pub message: String,
    /// Error code for programmatic handling
    pub code: String,
    /// Validation violations, in schema order
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
}

impl ApiError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Model(e) => e.status_code(),
            ApiError::Record(e) => e.status_code(),
            ApiError::Auth(e) => e.status_code(),
            ApiError::Tool(e) => e.status_code(),
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::Model(e) => e.error_code(),
            ApiError::Record(e) => e.error_code(),
            ApiError::Auth(e) => e.error_code(),
            ApiError::Tool(e) => e.error_code(),
            ApiError::Validation(_) => "VALIDATION_FAILED",
            ApiError::NotFound { .. } => "NOT_FOUND",
            ApiError::Storage(_) => "STORAGE_ERROR",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Short title used as the `error` member of the body
    pub fn title(&self) -> &'static str {
        match self {
            ApiError::Model(e) => e.title(),
            ApiError::Record(e) => e.title(),
            ApiError::Auth(e) => e.title(),
            ApiError::Tool(_) => "Tool error",
            ApiError::Validation(_) => "Validation failed",
            ApiError::NotFound { .. } => "Not found",
            ApiError::Storage(_) | ApiError::Internal(_) => "Internal server error",
        }
    }

    /// Convert to an error response
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            error: self.title().to_string(),
            message: self.to_string(),
            code: self.error_code().to_string(),
            errors: match self {
                ApiError::Validation(errors) => Some(errors.clone()),
                _ => None,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = Json(self.to_response());
        (status, body).into_response()
    }
}

// =============================================================================
// Model Errors
// =============================================================================

/// Errors raised by the model registry
#[derive(Debug)]
pub enum ModelError {
    /// No model with that name
    NotFound { name: String },

    /// No model with that id
    NotFoundById { id: Uuid },

    /// Normalized name already taken
    AlreadyExists { name: String },

    /// Name empty or whitespace only
    EmptyName,

    /// Schema string empty
    EmptySchema,

    /// Schema failed to parse
    InvalidSchema(SchemaError),

    /// Request failed field validation
    InvalidDefinition { message: String },
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::NotFound { name } => {
                write!(f, "No API exists with name \"{}\"", name)
            }
            ModelError::NotFoundById { id } => {
                write!(f, "No API exists with id \"{}\"", id)
            }
            ModelError::AlreadyExists { name } => {
                write!(f, "An API with the name \"{}\" already exists", name)
            }
            ModelError::EmptyName => write!(f, "API name cannot be empty"),
            ModelError::EmptySchema => write!(f, "Schema cannot be empty"),
            ModelError::InvalidSchema(e) => write!(f, "Invalid schema: {}", e),
            ModelError::InvalidDefinition { message } => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for ModelError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ModelError::InvalidSchema(e) => Some(e),
            _ => None,
        }
    }
}

impl ModelError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ModelError::NotFound { .. } | ModelError::NotFoundById { .. } => StatusCode::NOT_FOUND,
            ModelError::AlreadyExists { .. } => StatusCode::CONFLICT,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ModelError::NotFound { .. } | ModelError::NotFoundById { .. } => "API_NOT_FOUND",
            ModelError::AlreadyExists { .. } => "API_ALREADY_EXISTS",
            ModelError::EmptyName => "EMPTY_API_NAME",
            ModelError::EmptySchema => "EMPTY_SCHEMA",
            ModelError::InvalidSchema(_) => "INVALID_SCHEMA",
            ModelError::InvalidDefinition { .. } => "INVALID_API_DEFINITION",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ModelError::NotFound { .. } | ModelError::NotFoundById { .. } => "API not found",
            ModelError::AlreadyExists { .. } => "API already exists",
            _ => "Invalid API definition",
        }
    }
}

impl From<ModelError> for ApiError {
    fn from(err: ModelError) -> Self {
        ApiError::Model(err)
    }
}

impl From<SchemaError> for ApiError {
    fn from(err: SchemaError) -> Self {
        ApiError::Model(ModelError::InvalidSchema(err))
    }
}

// =============================================================================
// Record Errors
// =============================================================================

/// Errors related to record access
#[derive(Debug)]
pub enum RecordError {
    /// No record with that id under the model
    NotFound { id: String },

    /// `id` query parameter required but absent
    MissingId,

    /// Body was not a JSON object
    InvalidBody { message: String },
}

impl fmt::Display for RecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordError::NotFound { id } => write!(f, "No record found with id \"{}\"", id),
            RecordError::MissingId => write!(f, "Record ID is required"),
            RecordError::InvalidBody { message } => {
                write!(f, "Request body must be a JSON object: {}", message)
            }
        }
    }
}

impl std::error::Error for RecordError {}

impl RecordError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            RecordError::NotFound { .. } => StatusCode::NOT_FOUND,
            RecordError::MissingId | RecordError::InvalidBody { .. } => StatusCode::BAD_REQUEST,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            RecordError::NotFound { .. } => "RECORD_NOT_FOUND",
            RecordError::MissingId => "MISSING_ID",
            RecordError::InvalidBody { .. } => "INVALID_JSON",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            RecordError::NotFound { .. } => "Record not found",
            RecordError::MissingId => "Missing ID",
            RecordError::InvalidBody { .. } => "Invalid JSON",
        }
    }
}

impl From<RecordError> for ApiError {
    fn from(err: RecordError) -> Self {
        ApiError::Record(err)
    }
}

// =============================================================================
// Auth Errors
// =============================================================================

/// API key authentication failures
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    MissingKey,
    InvalidKey,
    WrongModel,
    Disabled,
    QuotaExceeded { used: u64, limit: u64 },
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::MissingKey => write!(f, "Missing API key. Include X-API-Key header."),
            AuthError::InvalidKey => write!(f, "Invalid API key."),
            AuthError::WrongModel => write!(f, "API key not valid for this endpoint."),
            AuthError::Disabled => write!(f, "API key has been disabled."),
            AuthError::QuotaExceeded { used, limit } => write!(
                f,
                "API key quota exceeded ({}/{} requests used)",
                used, limit
            ),
        }
    }
}

impl std::error::Error for AuthError {}

impl AuthError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::QuotaExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::UNAUTHORIZED,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingKey => "MISSING_API_KEY",
            AuthError::InvalidKey => "INVALID_API_KEY",
            AuthError::WrongModel => "API_KEY_WRONG_ENDPOINT",
            AuthError::Disabled => "API_KEY_DISABLED",
            AuthError::QuotaExceeded { .. } => "QUOTA_EXCEEDED",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            AuthError::QuotaExceeded { .. } => "Quota exceeded",
            _ => "Unauthorized",
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        ApiError::Auth(err)
    }
}

// =============================================================================
// Tool Errors
// =============================================================================

/// Errors raised while dispatching a tool call
#[derive(Debug)]
pub enum ToolError {
    /// Tool name without the `server__tool` shape
    MalformedName { name: String },

    /// No server with that name
    UnknownServer { server: String },

    /// Server exists but has no such tool
    UnknownTool { server: String, tool: String },

    /// Input did not match the tool's parameters
    InvalidInput { tool: String, message: String },

    /// Body was not sent as `application/json`
    UnsupportedMediaType { tool: String },

    /// Tool ran but failed outside its normal reporting
    Failed { tool: String, message: String },
}

impl fmt::Display for ToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolError::MalformedName { name } => {
                write!(f, "Invalid tool name format: {}", name)
            }
            ToolError::UnknownServer { server } => write!(f, "Unknown server: {}", server),
            ToolError::UnknownTool { server, tool } => {
                write!(f, "Unknown {} tool: {}", server, tool)
            }
            ToolError::InvalidInput { tool, message } => {
                write!(f, "Invalid input for {}: {}", tool, message)
            }
            ToolError::UnsupportedMediaType { tool } => {
                write!(f, "Input for {} must be sent as application/json", tool)
            }
            ToolError::Failed { tool, message } => write!(f, "Tool {} failed: {}", tool, message),
        }
    }
}

impl std::error::Error for ToolError {}

impl ToolError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ToolError::MalformedName { .. } | ToolError::InvalidInput { .. } => {
                StatusCode::BAD_REQUEST
            }
            ToolError::UnknownServer { .. } | ToolError::UnknownTool { .. } => {
                StatusCode::NOT_FOUND
            }
            ToolError::UnsupportedMediaType { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ToolError::Failed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ToolError::MalformedName { .. } => "MALFORMED_TOOL_NAME",
            ToolError::UnknownServer { .. } => "UNKNOWN_SERVER",
            ToolError::UnknownTool { .. } => "UNKNOWN_TOOL",
            ToolError::InvalidInput { .. } => "INVALID_TOOL_INPUT",
            ToolError::UnsupportedMediaType { .. } => "UNSUPPORTED_MEDIA_TYPE",
            ToolError::Failed { .. } => "TOOL_FAILED",
        }
    }
}

impl From<ToolError> for ApiError {
    fn from(err: ToolError) -> Self {
        ApiError::Tool(err)
    }
}

// =============================================================================
// Conversions from external error types
// =============================================================================

/// Store traits return anyhow errors
impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Storage(err.to_string())
    }
}

// =============================================================================
// Result type alias
// =============================================================================

/// A specialized Result type for handlers
pub type ApiResult<T> = Result<T, ApiError>;

// =============================================================================
// Tests
// =============================================================================
