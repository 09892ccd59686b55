//! Schema definitions for dynamic API models
//!
//! A schema maps field names to one of five type tags. It is stored on the
//! model as the raw JSON string submitted by the administrator and parsed
//! into a [`Schema`] whenever records are validated or queried.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Type tag attached to a schema field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Number,
    Boolean,
    Array,
    Object,
}

impl FieldType {
    /// Parse a type tag, accepting `integer` as an alias of `number`
    pub fn parse_tag(tag: &str) -> Option<Self> {
        match tag {
            "string" => Some(FieldType::String),
            "number" | "integer" => Some(FieldType::Number),
            "boolean" => Some(FieldType::Boolean),
            "array" => Some(FieldType::Array),
            "object" => Some(FieldType::Object),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::Array => "array",
            FieldType::Object => "object",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised while parsing a stored schema document
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemaError {
    #[error("The schema must be valid JSON: {0}")]
    InvalidJson(String),

    #[error("The schema must be a JSON object mapping field names to types")]
    NotAnObject,

    #[error("Field \"{field}\" has an unsupported type: {tag}")]
    UnknownType { field: String, tag: String },
}

/// Field name → type tag mapping, in declaration order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schema {
    fields: IndexMap<String, FieldType>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style field insertion
    pub fn with_field(mut self, name: impl Into<String>, field_type: FieldType) -> Self {
        self.fields.insert(name.into(), field_type);
        self
    }

    /// Parse a schema from its stored JSON string
    pub fn from_json_str(raw: &str) -> Result<Self, SchemaError> {
        let value: Value =
            serde_json::from_str(raw).map_err(|e| SchemaError::InvalidJson(e.to_string()))?;
        Self::from_value(&value)
    }

    /// Parse a schema from a JSON document
    ///
    /// Each entry is either a bare tag (`"price": "number"`) or an object
    /// with a `type` member (`"price": {"type": "number"}`).
    pub fn from_value(value: &Value) -> Result<Self, SchemaError> {
        let obj = value.as_object().ok_or(SchemaError::NotAnObject)?;

        let mut fields = IndexMap::with_capacity(obj.len());
        for (name, def) in obj {
            let tag = match def {
                Value::String(tag) => Some(tag.as_str()),
                Value::Object(inner) => inner.get("type").and_then(Value::as_str),
                _ => None,
            };

            let field_type = tag.and_then(FieldType::parse_tag).ok_or_else(|| {
                SchemaError::UnknownType {
                    field: name.clone(),
                    tag: tag.map(str::to_string).unwrap_or_else(|| def.to_string()),
                }
            })?;

            fields.insert(name.clone(), field_type);
        }

        Ok(Self { fields })
    }

    pub fn get(&self, field: &str) -> Option<FieldType> {
        self.fields.get(field).copied()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, FieldType)> {
        self.fields.iter().map(|(name, ty)| (name.as_str(), *ty))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, FieldType)> for Schema {
    fn from_iter<I: IntoIterator<Item = (K, FieldType)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_bare_tags() {
        let schema = Schema::from_json_str(r#"{"name":"string","price":"number"}"#).unwrap();
        assert_eq!(schema.len(), 2);
        assert_eq!(schema.get("name"), Some(FieldType::String));
        assert_eq!(schema.get("price"), Some(FieldType::Number));
    }

    #[test]
    fn test_parse_preserves_declaration_order() {
        let schema =
            Schema::from_json_str(r#"{"zeta":"string","alpha":"number","mid":"array"}"#).unwrap();
        let names: Vec<&str> = schema.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_parse_nested_type_objects() {
        let schema = Schema::from_value(&json!({
            "tags": {"type": "array"},
            "count": {"type": "integer", "description": "how many"}
        }))
        .unwrap();
        assert_eq!(schema.get("tags"), Some(FieldType::Array));
        assert_eq!(schema.get("count"), Some(FieldType::Number));
    }

    #[test]
    fn test_parse_unknown_tag_is_error() {
        let err = Schema::from_value(&json!({"when": "date"})).unwrap_err();
        assert_eq!(
            err,
            SchemaError::UnknownType {
                field: "when".to_string(),
                tag: "date".to_string()
            }
        );
    }

    #[test]
    fn test_parse_non_object_is_error() {
        assert_eq!(
            Schema::from_value(&json!(["string"])).unwrap_err(),
            SchemaError::NotAnObject
        );
    }

    #[test]
    fn test_parse_invalid_json_is_error() {
        assert!(matches!(
            Schema::from_json_str("{not json"),
            Err(SchemaError::InvalidJson(_))
        ));
    }

    #[test]
    fn test_field_type_display() {
        assert_eq!(FieldType::Boolean.to_string(), "boolean");
        assert_eq!(FieldType::parse_tag("object"), Some(FieldType::Object));
        assert_eq!(FieldType::parse_tag("String"), None);
    }
}
