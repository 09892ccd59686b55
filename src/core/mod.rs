//! Core types: schemas, validation, query building, models, records and keys

pub mod api_key;
pub mod auth;
pub mod error;
pub mod filter;
pub mod model;
pub mod query;
pub mod record;
pub mod schema;
pub mod service;
pub mod validation;

pub use api_key::{ApiKey, KeyCheck, KeyUsage, generate_api_key, is_valid_api_key_format, mask_key};
pub use auth::{API_KEY_HEADER, AccessContext, authenticate};
pub use error::{ApiError, ApiResult, AuthError, ModelError, RecordError, ToolError};
pub use filter::{FilterCondition, FilterExpression, FilterOp, SortDirection, SortSpec};
pub use model::{ApiModel, NewApiModel, normalize_name};
pub use query::{PaginatedResponse, PaginationMeta, QueryParams, build_filter, build_sort};
pub use record::StoredRecord;
pub use schema::{FieldType, Schema, SchemaError};
pub use service::{ApiKeyService, ModelService, RecordService};
pub use validation::validate_record;
