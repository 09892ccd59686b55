//! Record validation against a model schema
//!
//! Validation collects every violation instead of stopping at the first one,
//! so the caller can report the complete list back to the client.

pub mod validators;

use crate::core::schema::Schema;
use serde_json::{Map, Value};

/// Validate a record against a schema
///
/// Every schema field is required. Fields the schema does not declare are
/// ignored. Returns the violation messages in schema order; an empty list
/// means the record is valid.
pub fn validate_record(schema: &Schema, record: &Map<String, Value>) -> Vec<String> {
    let mut errors = Vec::new();

    for (field, field_type) in schema.iter() {
        match record.get(field) {
            None => errors.push(format!("Missing required field: {}", field)),
            Some(value) => {
                if let Err(message) = validators::check_type(field_type, field, value) {
                    errors.push(message);
                }
            }
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::schema::FieldType;
    use serde_json::json;

    fn product_schema() -> Schema {
        Schema::new()
            .with_field("name", FieldType::String)
            .with_field("price", FieldType::Number)
    }

    fn as_map(value: Value) -> Map<String, Value> {
        value.as_object().cloned().expect("test record must be an object")
    }

    #[test]
    fn test_valid_record_has_no_violations() {
        let record = as_map(json!({"name": "Lamp", "price": 19.5}));
        assert!(validate_record(&product_schema(), &record).is_empty());
    }

    #[test]
    fn test_missing_required_field() {
        let record = as_map(json!({"price": 9.99}));
        assert_eq!(
            validate_record(&product_schema(), &record),
            vec!["Missing required field: name".to_string()]
        );
    }

    #[test]
    fn test_collects_all_violations_in_schema_order() {
        let schema = Schema::new()
            .with_field("name", FieldType::String)
            .with_field("price", FieldType::Number)
            .with_field("in-stock", FieldType::Boolean)
            .with_field("tags", FieldType::Array);
        let record = as_map(json!({"price": "cheap", "in-stock": 1, "tags": "a,b"}));

        assert_eq!(
            validate_record(&schema, &record),
            vec![
                "Missing required field: name".to_string(),
                "Field \"price\" should be a number".to_string(),
                "Field \"in-stock\" should be a boolean".to_string(),
                "Field \"tags\" should be an array".to_string(),
            ]
        );
    }

    #[test]
    fn test_extra_fields_are_ignored() {
        let record = as_map(json!({"name": "Lamp", "price": 3, "color": "red"}));
        assert!(validate_record(&product_schema(), &record).is_empty());
    }

    #[test]
    fn test_object_fields_only_require_presence() {
        let schema = Schema::new().with_field("meta", FieldType::Object);
        assert!(validate_record(&schema, &as_map(json!({"meta": 5}))).is_empty());
        assert_eq!(
            validate_record(&schema, &as_map(json!({}))),
            vec!["Missing required field: meta".to_string()]
        );
    }

    #[test]
    fn test_validation_is_idempotent() {
        let record = as_map(json!({"name": 1}));
        let first = validate_record(&product_schema(), &record);
        let second = validate_record(&product_schema(), &record);
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn test_empty_schema_accepts_anything() {
        assert!(validate_record(&Schema::new(), &as_map(json!({"x": 1}))).is_empty());
    }
}
