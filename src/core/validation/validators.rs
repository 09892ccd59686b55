//! Field validators for dynamic records
//!
//! Each validator checks one present field value against the type tag the
//! schema declares for it. Presence itself is checked by
//! [`validate_record`](super::validate_record).

use crate::core::schema::FieldType;
use serde_json::Value;

/// Validator: value must be a JSON number
pub fn number() -> impl Fn(&str, &Value) -> Result<(), String> + Send + Sync + Clone {
    |field: &str, value: &Value| {
        if value.is_number() {
            Ok(())
        } else {
            Err(format!("Field \"{}\" should be a number", field))
        }
    }
}

/// Validator: value must be a JSON string
pub fn string() -> impl Fn(&str, &Value) -> Result<(), String> + Send + Sync + Clone {
    |field: &str, value: &Value| {
        if value.is_string() {
            Ok(())
        } else {
            Err(format!("Field \"{}\" should be a string", field))
        }
    }
}

/// Validator: value must be a JSON boolean
pub fn boolean() -> impl Fn(&str, &Value) -> Result<(), String> + Send + Sync + Clone {
    |field: &str, value: &Value| {
        if value.is_boolean() {
            Ok(())
        } else {
            Err(format!("Field \"{}\" should be a boolean", field))
        }
    }
}

/// Validator: value must be a JSON array
pub fn array() -> impl Fn(&str, &Value) -> Result<(), String> + Send + Sync + Clone {
    |field: &str, value: &Value| {
        if value.is_array() {
            Ok(())
        } else {
            Err(format!("Field \"{}\" should be an array", field))
        }
    }
}

/// Validator: anything goes
///
/// `object` fields are deliberately left unchecked.
pub fn any() -> impl Fn(&str, &Value) -> Result<(), String> + Send + Sync + Clone {
    |_: &str, _: &Value| Ok(())
}

/// Check a present value against its declared type tag
pub fn check_type(field_type: FieldType, field: &str, value: &Value) -> Result<(), String> {
    match field_type {
        FieldType::Number => number()(field, value),
        FieldType::String => string()(field, value),
        FieldType::Boolean => boolean()(field, value),
        FieldType::Array => array()(field, value),
        FieldType::Object => any()(field, value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // === number() ===

    #[test]
    fn test_number_accepts_integer_and_float() {
        let v = number();
        assert!(v("price", &json!(10)).is_ok());
        assert!(v("price", &json!(9.99)).is_ok());
        assert!(v("price", &json!(-3)).is_ok());
    }

    #[test]
    fn test_number_rejects_numeric_string() {
        let v = number();
        assert_eq!(
            v("price", &json!("10")).unwrap_err(),
            "Field \"price\" should be a number"
        );
    }

    // === string() ===

    #[test]
    fn test_string_accepts_empty_string() {
        let v = string();
        assert!(v("name", &json!("")).is_ok());
    }

    #[test]
    fn test_string_rejects_number() {
        let v = string();
        assert_eq!(
            v("name", &json!(42)).unwrap_err(),
            "Field \"name\" should be a string"
        );
    }

    // === boolean() ===

    #[test]
    fn test_boolean_rejects_string_true() {
        let v = boolean();
        assert!(v("active", &json!(false)).is_ok());
        assert_eq!(
            v("active", &json!("true")).unwrap_err(),
            "Field \"active\" should be a boolean"
        );
    }

    // === array() ===

    #[test]
    fn test_array_rejects_object() {
        let v = array();
        assert!(v("tags", &json!([])).is_ok());
        assert_eq!(
            v("tags", &json!({"0": "a"})).unwrap_err(),
            "Field \"tags\" should be an array"
        );
    }

    // === check_type() ===

    #[test]
    fn test_object_tag_accepts_anything() {
        assert!(check_type(FieldType::Object, "meta", &json!("text")).is_ok());
        assert!(check_type(FieldType::Object, "meta", &json!(null)).is_ok());
        assert!(check_type(FieldType::Object, "meta", &json!([1, 2])).is_ok());
    }

    #[test]
    fn test_null_fails_checked_tags() {
        assert!(check_type(FieldType::String, "name", &json!(null)).is_err());
        assert!(check_type(FieldType::Number, "price", &json!(null)).is_err());
        assert!(check_type(FieldType::Boolean, "flag", &json!(null)).is_err());
        assert!(check_type(FieldType::Array, "tags", &json!(null)).is_err());
    }
}
