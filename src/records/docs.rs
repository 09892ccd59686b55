//! OpenAPI documents for dynamic APIs
//!
//! Generated from the model's schema alone, so the same model always yields
//! the same document.

use crate::core::model::ApiModel;
use crate::core::schema::{FieldType, Schema};
use serde_json::{Map, Value, json};

/// Name of the security scheme added for key-protected models
pub const SECURITY_SCHEME: &str = "ApiKeyAuth";

/// Build an OpenAPI 3.0 document for a model
pub fn openapi_document(model: &ApiModel, schema: &Schema) -> Value {
    let component = component_name(&model.name);
    let item_ref = json!({ "$ref": format!("#/components/schemas/{}", component) });
    let input_ref = json!({ "$ref": format!("#/components/schemas/{}Input", component) });
    let path = format!("/api/{}", model.name);

    let mut list_params = vec![
        query_param("id", "Fetch a single record by ID", json!({"type": "string", "format": "uuid"}), false),
        query_param("page", "Page number (starts at 1)", json!({"type": "integer", "minimum": 1, "default": 1}), false),
        query_param("limit", "Records per page", json!({"type": "integer", "minimum": 1, "maximum": 100, "default": 10}), false),
        query_param("sort", "Field to sort by", json!({"type": "string", "default": "createdAt"}), false),
        query_param("order", "Sort direction", json!({"type": "string", "enum": ["asc", "desc"], "default": "desc"}), false),
    ];
    for (field, field_type) in schema.iter() {
        list_params.extend(filter_params(field, field_type));
    }

    let id_param = query_param("id", "Record ID", json!({"type": "string", "format": "uuid"}), true);

    let mut operations = Map::new();
    operations.insert(
        "get".to_string(),
        json!({
            "summary": format!("List {} records, or fetch one with ?id=", model.name),
            "operationId": format!("list_{}", operation_suffix(&model.name)),
            "parameters": list_params,
            "responses": {
                "200": {
                    "description": "A page of records, or the requested record",
                    "content": {
                        "application/json": {
                            "schema": {
                                "oneOf": [
                                    {
                                        "type": "object",
                                        "properties": {
                                            "data": { "type": "array", "items": item_ref },
                                            "pagination": { "$ref": "#/components/schemas/Pagination" }
                                        }
                                    },
                                    item_ref
                                ]
                            }
                        }
                    }
                },
                "404": error_response("Record not found")
            }
        }),
    );
    operations.insert(
        "post".to_string(),
        json!({
            "summary": format!("Create a {} record", model.name),
            "operationId": format!("create_{}", operation_suffix(&model.name)),
            "requestBody": json_body(&input_ref),
            "responses": {
                "201": message_response("Record created", &item_ref),
                "400": error_response("Validation failed")
            }
        }),
    );
    operations.insert(
        "put".to_string(),
        json!({
            "summary": format!("Update a {} record (fields are merged)", model.name),
            "operationId": format!("update_{}", operation_suffix(&model.name)),
            "parameters": [id_param.clone()],
            "requestBody": json_body(&json!({"type": "object"})),
            "responses": {
                "200": message_response("Record updated", &item_ref),
                "400": error_response("Missing ID"),
                "404": error_response("Record not found")
            }
        }),
    );
    operations.insert(
        "delete".to_string(),
        json!({
            "summary": format!("Delete a {} record", model.name),
            "operationId": format!("delete_{}", operation_suffix(&model.name)),
            "parameters": [id_param],
            "responses": {
                "200": {
                    "description": "Record deleted",
                    "content": {
                        "application/json": {
                            "schema": {
                                "type": "object",
                                "properties": {
                                    "message": { "type": "string" },
                                    "id": { "type": "string", "format": "uuid" }
                                }
                            }
                        }
                    }
                },
                "400": error_response("Missing ID"),
                "404": error_response("Record not found")
            }
        }),
    );

    if model.requires_auth {
        for operation in operations.values_mut() {
            if let Some(responses) = operation.get_mut("responses").and_then(Value::as_object_mut) {
                responses.insert("401".to_string(), error_response("Missing or invalid API key"));
                responses.insert("429".to_string(), error_response("API key quota exceeded"));
            }
        }
    }

    let mut paths = Map::new();
    paths.insert(path, Value::Object(operations));

    let mut schemas = Map::new();
    schemas.insert(component.clone(), record_schema(schema, true));
    schemas.insert(format!("{}Input", component), record_schema(schema, false));
    schemas.insert("Pagination".to_string(), pagination_schema());
    schemas.insert("Error".to_string(), error_schema());

    let mut components = Map::new();
    components.insert("schemas".to_string(), Value::Object(schemas));

    let mut document = Map::new();
    document.insert("openapi".to_string(), json!("3.0.0"));
    document.insert(
        "info".to_string(),
        json!({
            "title": format!("{} API", component),
            "version": "1.0.0",
            "description": description(model),
        }),
    );
    document.insert("paths".to_string(), Value::Object(paths));

    if model.requires_auth {
        components.insert(
            "securitySchemes".to_string(),
            json!({
                SECURITY_SCHEME: {
                    "type": "apiKey",
                    "in": "header",
                    "name": "X-API-Key"
                }
            }),
        );
        document.insert("security".to_string(), json!([{ SECURITY_SCHEME: [] }]));
    }
    document.insert("components".to_string(), Value::Object(components));

    Value::Object(document)
}

/// JSON Schema fragment for a field type
fn field_schema(field_type: FieldType) -> Value {
    match field_type {
        FieldType::String => json!({"type": "string"}),
        FieldType::Number => json!({"type": "number"}),
        FieldType::Boolean => json!({"type": "boolean"}),
        FieldType::Array => json!({"type": "array", "items": {}}),
        FieldType::Object => json!({"type": "object"}),
    }
}

fn record_schema(schema: &Schema, with_metadata: bool) -> Value {
    let mut properties = Map::new();
    if with_metadata {
        properties.insert("id".to_string(), json!({"type": "string", "format": "uuid"}));
    }
    for (field, field_type) in schema.iter() {
        properties.insert(field.to_string(), field_schema(field_type));
    }
    if with_metadata {
        properties.insert("createdAt".to_string(), json!({"type": "string", "format": "date-time"}));
        properties.insert("updatedAt".to_string(), json!({"type": "string", "format": "date-time"}));
    }

    let required: Vec<&str> = schema.iter().map(|(field, _)| field).collect();
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

/// Query parameters for filtering on one field
fn filter_params(field: &str, field_type: FieldType) -> Vec<Value> {
    match field_type {
        FieldType::String => {
            let mut params = vec![query_param(field, "Exact match", field_schema(field_type), false)];
            for (suffix, label) in [
                ("contains", "Case-insensitive substring"),
                ("startsWith", "Case-insensitive prefix"),
                ("endsWith", "Case-insensitive suffix"),
            ] {
                params.push(query_param(
                    &format!("{}_{}", field, suffix),
                    label,
                    json!({"type": "string"}),
                    false,
                ));
            }
            params
        }
        FieldType::Number => {
            let mut params = vec![query_param(field, "Exact match", field_schema(field_type), false)];
            for (suffix, label) in [
                ("gt", "Greater than"),
                ("lt", "Less than"),
                ("gte", "Greater than or equal"),
                ("lte", "Less than or equal"),
            ] {
                params.push(query_param(
                    &format!("{}_{}", field, suffix),
                    label,
                    json!({"type": "number"}),
                    false,
                ));
            }
            params
        }
        FieldType::Boolean => vec![query_param(
            field,
            "true/1/yes or anything else for false",
            json!({"type": "boolean"}),
            false,
        )],
        FieldType::Array | FieldType::Object => Vec::new(),
    }
}

fn query_param(name: &str, description: &str, schema: Value, required: bool) -> Value {
    json!({
        "name": name,
        "in": "query",
        "description": description,
        "required": required,
        "schema": schema,
    })
}

fn json_body(schema: &Value) -> Value {
    json!({
        "required": true,
        "content": { "application/json": { "schema": schema } }
    })
}

fn message_response(description: &str, item_ref: &Value) -> Value {
    json!({
        "description": description,
        "content": {
            "application/json": {
                "schema": {
                    "type": "object",
                    "properties": {
                        "message": { "type": "string" },
                        "data": item_ref
                    }
                }
            }
        }
    })
}

fn error_response(description: &str) -> Value {
    json!({
        "description": description,
        "content": {
            "application/json": {
                "schema": { "$ref": "#/components/schemas/Error" }
            }
        }
    })
}

fn pagination_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "page": { "type": "integer" },
            "limit": { "type": "integer" },
            "total": { "type": "integer" },
            "totalPages": { "type": "integer" },
            "hasNext": { "type": "boolean" },
            "hasPrev": { "type": "boolean" }
        }
    })
}

fn error_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "error": { "type": "string" },
            "message": { "type": "string" },
            "code": { "type": "string" },
            "errors": { "type": "array", "items": { "type": "string" } }
        },
        "required": ["error", "message", "code"]
    })
}

fn description(model: &ApiModel) -> String {
    let mut text = format!("CRUD endpoint for `{}` records.", model.name);
    if model.requires_auth {
        text.push_str(" Requests must carry an `X-API-Key` header.");
    }
    if let Some(prompt) = &model.ai_prompt {
        text.push_str(&format!(" Generated from: {}", prompt));
    }
    text
}

/// `blog-posts` → `BlogPosts`
fn component_name(name: &str) -> String {
    let joined: String = name
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect();
    if joined.is_empty() {
        "Record".to_string()
    } else {
        joined
    }
}

fn operation_suffix(name: &str) -> String {
    name.replace('-', "_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::NewApiModel;

    fn model(requires_auth: bool) -> (ApiModel, Schema) {
        let model = ApiModel::new(&NewApiModel {
            name: "blog-posts".to_string(),
            schema: r#"{"title":"string","views":"number","tags":"array"}"#.to_string(),
            generated_by_ai: false,
            ai_prompt: None,
            requires_auth,
        });
        let schema = model.parsed_schema().unwrap();
        (model, schema)
    }

    #[test]
    fn test_component_name() {
        assert_eq!(component_name("blog-posts"), "BlogPosts");
        assert_eq!(component_name("products"), "Products");
        assert_eq!(component_name("---"), "Record");
    }

    #[test]
    fn test_document_describes_all_operations() {
        let (model, schema) = model(false);
        let doc = openapi_document(&model, &schema);

        assert_eq!(doc["openapi"], "3.0.0");
        let ops = &doc["paths"]["/api/blog-posts"];
        for method in ["get", "post", "put", "delete"] {
            assert!(ops.get(method).is_some(), "missing {method}");
        }
        assert!(doc.get("security").is_none());
        assert!(doc["components"].get("securitySchemes").is_none());
    }

    #[test]
    fn test_component_schema_follows_field_types() {
        let (model, schema) = model(false);
        let doc = openapi_document(&model, &schema);
        let component = &doc["components"]["schemas"]["BlogPosts"];

        assert_eq!(component["properties"]["title"]["type"], "string");
        assert_eq!(component["properties"]["views"]["type"], "number");
        assert_eq!(component["properties"]["tags"]["type"], "array");
        assert_eq!(component["required"], json!(["title", "views", "tags"]));
    }

    #[test]
    fn test_filter_parameters_listed() {
        let (model, schema) = model(false);
        let doc = openapi_document(&model, &schema);
        let names: Vec<&str> = doc["paths"]["/api/blog-posts"]["get"]["parameters"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|p| p["name"].as_str())
            .collect();

        assert!(names.contains(&"views_gte"));
        assert!(names.contains(&"title_contains"));
        assert!(!names.contains(&"tags"));
    }

    #[test]
    fn test_protected_model_has_security_scheme() {
        let (model, schema) = model(true);
        let doc = openapi_document(&model, &schema);

        assert_eq!(
            doc["components"]["securitySchemes"]["ApiKeyAuth"]["name"],
            "X-API-Key"
        );
        assert_eq!(doc["security"], json!([{"ApiKeyAuth": []}]));
        assert!(doc["paths"]["/api/blog-posts"]["post"]["responses"]["429"].is_object());
    }

    #[test]
    fn test_document_is_deterministic() {
        let (model, schema) = model(true);
        assert_eq!(
            openapi_document(&model, &schema),
            openapi_document(&model, &schema)
        );
    }
}
