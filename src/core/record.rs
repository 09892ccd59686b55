//! Records stored under a dynamic API model

use crate::core::filter::{SortSpec, timestamp_key};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value, json};
use std::cmp::Ordering;
use uuid::Uuid;

/// One record of a dynamic API
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    pub id: Uuid,
    pub model_id: Uuid,
    pub data: Map<String, Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StoredRecord {
    pub fn new(model_id: Uuid, data: Map<String, Value>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            model_id,
            data,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace the data and bump `updated_at`
    pub fn replace_data(&mut self, data: Map<String, Value>) {
        self.data = data;
        self.updated_at = Utc::now();
    }

    /// Shallow-merge a patch over the current data
    pub fn merged_data(&self, patch: &Map<String, Value>) -> Map<String, Value> {
        let mut merged = self.data.clone();
        for (key, value) in patch {
            merged.insert(key.clone(), value.clone());
        }
        merged
    }

    /// Sort key for a field: the data value, or a timestamp for
    /// `createdAt` / `updatedAt` when the data has no such field
    pub fn sort_key(&self, field: &str) -> Option<Value> {
        match self.data.get(field) {
            Some(value) => Some(value.clone()),
            None => match field {
                "createdAt" => Some(timestamp_key(&self.created_at)),
                "updatedAt" => Some(timestamp_key(&self.updated_at)),
                _ => None,
            },
        }
    }

    /// Compare two records under a sort specification
    pub fn compare(&self, other: &Self, sort: &SortSpec) -> Ordering {
        sort.compare(
            self.sort_key(&sort.field).as_ref(),
            other.sort_key(&sort.field).as_ref(),
        )
    }

    /// Client-facing JSON: `{ id, ...data, createdAt, updatedAt }`
    ///
    /// The metadata keys win over data keys of the same name.
    pub fn to_json(&self) -> Value {
        let mut out = Map::with_capacity(self.data.len() + 3);
        out.insert("id".to_string(), json!(self.id));
        for (key, value) in &self.data {
            if !matches!(key.as_str(), "id" | "createdAt" | "updatedAt") {
                out.insert(key.clone(), value.clone());
            }
        }
        out.insert("createdAt".to_string(), json!(self.created_at));
        out.insert("updatedAt".to_string(), json!(self.updated_at));
        Value::Object(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::filter::SortDirection;

    fn data(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_to_json_flattens_data() {
        let record = StoredRecord::new(Uuid::new_v4(), data(json!({"name": "Lamp", "id": "spoof"})));
        let json = record.to_json();
        assert_eq!(json["name"], "Lamp");
        assert_eq!(json["id"], record.id.to_string());
        assert!(json["createdAt"].is_string());
        assert!(json["updatedAt"].is_string());
    }

    #[test]
    fn test_json_keys_start_with_id() {
        let record = StoredRecord::new(
            Uuid::new_v4(),
            data(json!({"name": "Lamp", "id": "spoofed", "createdAt": "never", "price": 4})),
        );
        let json = record.to_json();
        let keys: Vec<&str> = json.as_object().unwrap().keys().map(String::as_str).collect();

        assert_eq!(keys, vec!["id", "name", "price", "createdAt", "updatedAt"]);
        assert_eq!(json["id"], record.id.to_string());
        assert_ne!(json["createdAt"], "never");
    }

    #[test]
    fn test_merged_data_is_shallow() {
        let record = StoredRecord::new(
            Uuid::new_v4(),
            data(json!({"name": "Lamp", "meta": {"a": 1, "b": 2}})),
        );
        let merged = record.merged_data(&data(json!({"meta": {"a": 3}, "price": 4})));
        assert_eq!(
            Value::Object(merged),
            json!({"name": "Lamp", "meta": {"a": 3}, "price": 4})
        );
    }

    #[test]
    fn test_sort_key_falls_back_to_timestamps() {
        let record = StoredRecord::new(Uuid::new_v4(), data(json!({"price": 3})));
        assert_eq!(record.sort_key("price"), Some(json!(3)));
        assert!(record.sort_key("createdAt").is_some());
        assert!(record.sort_key("color").is_none());
    }

    #[test]
    fn test_compare_by_created_at() {
        let older = StoredRecord::new(Uuid::new_v4(), Map::new());
        let mut newer = StoredRecord::new(Uuid::new_v4(), Map::new());
        newer.created_at = older.created_at + chrono::Duration::seconds(1);

        let desc = SortSpec::default_order();
        assert_eq!(newer.compare(&older, &desc), Ordering::Less);

        let asc = SortSpec::new("createdAt", SortDirection::Asc);
        assert_eq!(newer.compare(&older, &asc), Ordering::Greater);
    }
}
