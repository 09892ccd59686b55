//! HTTP handlers for dynamic APIs
//!
//! One set of handlers serves every model: the `{model}` path segment picks
//! the model, whose schema drives validation, filtering and sorting.

use axum::{
    Json,
    body::Bytes,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use serde_json::{Map, Value, json};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::config::PaginationConfig;
use crate::core::auth::authenticate;
use crate::core::error::{ApiError, ApiResult, RecordError};
use crate::core::model::ApiModel;
use crate::core::query::{PaginatedResponse, PaginationMeta, QueryParams};
use crate::core::record::StoredRecord;
use crate::core::schema::Schema;
use crate::core::validation::validate_record;
use crate::records::docs::openapi_document;
use crate::registry::ApiRegistry;

/// State shared by the record handlers
#[derive(Clone)]
pub struct RecordState {
    pub registry: ApiRegistry,
    pub pagination: Arc<PaginationConfig>,
}

impl RecordState {
    pub fn new(registry: ApiRegistry, pagination: PaginationConfig) -> Self {
        Self {
            registry,
            pagination: Arc::new(pagination),
        }
    }

    fn params(&self, raw: HashMap<String, String>) -> QueryParams {
        QueryParams::with_limits(raw, self.pagination.default_limit, self.pagination.max_limit)
    }

    /// Resolve the model and admit the request
    async fn admit(&self, name: &str, headers: &HeaderMap) -> ApiResult<(ApiModel, Schema)> {
        let model = self.registry.get_model(name).await?;
        authenticate(headers, &model, self.registry.keys().as_ref()).await?;
        let schema = model.parsed_schema()?;
        Ok((model, schema))
    }
}

/// `GET /api/{model}`: one record with `?id=`, otherwise a filtered page
pub async fn list_records(
    State(state): State<RecordState>,
    Path(model_name): Path<String>,
    headers: HeaderMap,
    Query(raw): Query<HashMap<String, String>>,
) -> ApiResult<Json<Value>> {
    let (model, schema) = state.admit(&model_name, &headers).await?;
    let params = state.params(raw);

    if let Some(id) = params.id() {
        let record = find_record(&state, &model, id).await?;
        return Ok(Json(record.to_json()));
    }

    let filter = params.filter(&schema);
    let sort = params.sort(&schema);
    let (page, limit) = (params.page(), params.limit());

    let (records, total) = state
        .registry
        .records()
        .query(&model.id, &filter, &sort, params.offset(), limit)
        .await?;

    tracing::debug!(
        model = %model.name,
        filters = filter.len(),
        sort = %sort.field,
        total,
        "records listed"
    );

    let response = PaginatedResponse {
        data: records.iter().map(|record| record.to_json()).collect::<Vec<_>>(),
        pagination: PaginationMeta::new(page, limit, total),
    };
    Ok(Json(json!(response)))
}

/// `POST /api/{model}`
pub async fn create_record(
    State(state): State<RecordState>,
    Path(model_name): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<impl IntoResponse> {
    let (model, schema) = state.admit(&model_name, &headers).await?;
    let data = parse_object(&body)?;

    let errors = validate_record(&schema, &data);
    if !errors.is_empty() {
        tracing::debug!(model = %model.name, violations = errors.len(), "record rejected");
        return Err(ApiError::Validation(errors));
    }

    let record = state.registry.records().create(&model.id, data).await?;
    tracing::info!(model = %model.name, record_id = %record.id, "record created");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Record created successfully",
            "data": record.to_json(),
        })),
    ))
}

/// `PUT /api/{model}?id=`: shallow-merge the body into the record
pub async fn update_record(
    State(state): State<RecordState>,
    Path(model_name): Path<String>,
    headers: HeaderMap,
    Query(raw): Query<HashMap<String, String>>,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    let (model, _schema) = state.admit(&model_name, &headers).await?;
    let params = state.params(raw);
    let id = params.id().ok_or(RecordError::MissingId)?;

    let existing = find_record(&state, &model, id).await?;
    let patch = parse_object(&body)?;
    let merged = existing.merged_data(&patch);

    let record = state
        .registry
        .records()
        .update(&model.id, &existing.id, merged)
        .await?
        .ok_or_else(|| RecordError::NotFound { id: id.to_string() })?;
    tracing::info!(model = %model.name, record_id = %record.id, "record updated");

    Ok(Json(json!({
        "message": "Record updated successfully",
        "data": record.to_json(),
    })))
}

/// `DELETE /api/{model}?id=`
pub async fn delete_record(
    State(state): State<RecordState>,
    Path(model_name): Path<String>,
    headers: HeaderMap,
    Query(raw): Query<HashMap<String, String>>,
) -> ApiResult<Json<Value>> {
    let (model, _schema) = state.admit(&model_name, &headers).await?;
    let params = state.params(raw);
    let id = params.id().ok_or(RecordError::MissingId)?;

    let record_id = parse_record_id(id)?;
    if !state.registry.records().delete(&model.id, &record_id).await? {
        return Err(RecordError::NotFound { id: id.to_string() }.into());
    }
    tracing::info!(model = %model.name, record_id = %record_id, "record deleted");

    Ok(Json(json!({
        "message": "Record deleted successfully",
        "id": record_id,
    })))
}

/// `GET /api/{model}/docs`
pub async fn api_docs(
    State(state): State<RecordState>,
    Path(model_name): Path<String>,
) -> ApiResult<Json<Value>> {
    let model = state.registry.get_model(&model_name).await?;
    let schema = model.parsed_schema()?;
    Ok(Json(openapi_document(&model, &schema)))
}

async fn find_record(
    state: &RecordState,
    model: &ApiModel,
    id: &str,
) -> ApiResult<StoredRecord> {
    let record_id = parse_record_id(id)?;
    state
        .registry
        .records()
        .get(&model.id, &record_id)
        .await?
        .ok_or_else(|| RecordError::NotFound { id: id.to_string() }.into())
}

/// A malformed id can never match a record
fn parse_record_id(id: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(id).map_err(|_| RecordError::NotFound { id: id.to_string() }.into())
}

fn parse_object(body: &[u8]) -> ApiResult<Map<String, Value>> {
    let value: Value = serde_json::from_slice(body).map_err(|e| RecordError::InvalidBody {
        message: e.to_string(),
    })?;
    match value {
        Value::Object(map) => Ok(map),
        other => Err(RecordError::InvalidBody {
            message: format!("expected an object, got {}", json_type(&other)),
        }
        .into()),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
