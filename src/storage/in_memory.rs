//! In-memory implementations of the service traits
//!
//! Useful for testing and development. Every store is an `Arc<RwLock<..>>`
//! so clones share state; locks are never held across an `.await`.

use crate::core::api_key::{ApiKey, KeyCheck};
use crate::core::filter::{FilterExpression, SortSpec};
use crate::core::model::ApiModel;
use crate::core::record::StoredRecord;
use crate::core::service::{ApiKeyService, ModelService, RecordService};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::Utc;
use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

// =============================================================================
// Models
// =============================================================================

/// In-memory model store
#[derive(Clone)]
pub struct InMemoryModelService {
    models: Arc<RwLock<HashMap<Uuid, ApiModel>>>,
}

impl InMemoryModelService {
    pub fn new() -> Self {
        Self {
            models: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for InMemoryModelService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ModelService for InMemoryModelService {
    async fn create(&self, model: ApiModel) -> Result<Option<ApiModel>> {
        let mut models = self
            .models
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

        if models.values().any(|m| m.name == model.name) {
            return Ok(None);
        }
        models.insert(model.id, model.clone());

        Ok(Some(model))
    }

    async fn get(&self, id: &Uuid) -> Result<Option<ApiModel>> {
        let models = self
            .models
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        Ok(models.get(id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<ApiModel>> {
        let models = self
            .models
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        Ok(models.values().find(|m| m.name == name).cloned())
    }

    async fn list(&self) -> Result<Vec<ApiModel>> {
        let models = self
            .models
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        let mut list: Vec<ApiModel> = models.values().cloned().collect();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(list)
    }

    async fn delete(&self, id: &Uuid) -> Result<Option<ApiModel>> {
        let mut models = self
            .models
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

        Ok(models.remove(id))
    }
}

// =============================================================================
// Records
// =============================================================================

/// In-memory record store
///
/// Records are grouped per model and kept in insertion order, so equal sort
/// keys come back in the order the records were created.
#[derive(Clone)]
pub struct InMemoryRecordService {
    records: Arc<RwLock<HashMap<Uuid, IndexMap<Uuid, StoredRecord>>>>,
}

impl InMemoryRecordService {
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for InMemoryRecordService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordService for InMemoryRecordService {
    async fn create(&self, model_id: &Uuid, data: Map<String, Value>) -> Result<StoredRecord> {
        let mut records = self
            .records
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

        let record = StoredRecord::new(*model_id, data);
        records
            .entry(*model_id)
            .or_default()
            .insert(record.id, record.clone());

        Ok(record)
    }

    async fn get(&self, model_id: &Uuid, id: &Uuid) -> Result<Option<StoredRecord>> {
        let records = self
            .records
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        Ok(records
            .get(model_id)
            .and_then(|by_id| by_id.get(id))
            .cloned())
    }

    async fn query(
        &self,
        model_id: &Uuid,
        filter: &FilterExpression,
        sort: &SortSpec,
        offset: usize,
        limit: usize,
    ) -> Result<(Vec<StoredRecord>, usize)> {
        let records = self
            .records
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        let Some(by_id) = records.get(model_id) else {
            return Ok((Vec::new(), 0));
        };

        let mut matching: Vec<&StoredRecord> = by_id
            .values()
            .filter(|record| filter.matches(&record.data))
            .collect();
        matching.sort_by(|a, b| a.compare(b, sort));

        let total = matching.len();
        let page = matching
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect();

        Ok((page, total))
    }

    async fn update(
        &self,
        model_id: &Uuid,
        id: &Uuid,
        data: Map<String, Value>,
    ) -> Result<Option<StoredRecord>> {
        let mut records = self
            .records
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

        let Some(record) = records.get_mut(model_id).and_then(|by_id| by_id.get_mut(id)) else {
            return Ok(None);
        };
        record.replace_data(data);

        Ok(Some(record.clone()))
    }

    async fn delete(&self, model_id: &Uuid, id: &Uuid) -> Result<bool> {
        let mut records = self
            .records
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

        Ok(records
            .get_mut(model_id)
            .and_then(|by_id| by_id.shift_remove(id))
            .is_some())
    }

    async fn delete_by_model(&self, model_id: &Uuid) -> Result<usize> {
        let mut records = self
            .records
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

        Ok(records.remove(model_id).map_or(0, |by_id| by_id.len()))
    }
}

// =============================================================================
// API keys
// =============================================================================

/// In-memory API key store
#[derive(Clone)]
pub struct InMemoryApiKeyService {
    keys: Arc<RwLock<HashMap<Uuid, ApiKey>>>,
}

impl InMemoryApiKeyService {
    pub fn new() -> Self {
        Self {
            keys: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for InMemoryApiKeyService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ApiKeyService for InMemoryApiKeyService {
    async fn create(&self, key: ApiKey) -> Result<ApiKey> {
        let mut keys = self
            .keys
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

        keys.insert(key.id, key.clone());

        Ok(key)
    }

    async fn get(&self, id: &Uuid) -> Result<Option<ApiKey>> {
        let keys = self
            .keys
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        Ok(keys.get(id).cloned())
    }

    async fn list_for_model(&self, model_id: &Uuid) -> Result<Vec<ApiKey>> {
        let keys = self
            .keys
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        let mut list: Vec<ApiKey> = keys
            .values()
            .filter(|key| &key.model_id == model_id)
            .cloned()
            .collect();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(list)
    }

    async fn delete(&self, id: &Uuid) -> Result<bool> {
        let mut keys = self
            .keys
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

        Ok(keys.remove(id).is_some())
    }

    async fn toggle(&self, id: &Uuid) -> Result<Option<ApiKey>> {
        let mut keys = self
            .keys
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

        Ok(keys.get_mut(id).map(|key| {
            key.is_active = !key.is_active;
            key.clone()
        }))
    }

    async fn reset_usage(&self, id: &Uuid) -> Result<Option<ApiKey>> {
        let mut keys = self
            .keys
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

        Ok(keys.get_mut(id).map(|key| {
            key.usage_count = 0;
            key.clone()
        }))
    }

    async fn authorize(&self, presented: &str, model_id: &Uuid) -> Result<KeyCheck> {
        let mut keys = self
            .keys
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

        let Some(key) = keys.values_mut().find(|key| key.key == presented) else {
            return Ok(KeyCheck::Unknown);
        };
        if &key.model_id != model_id {
            return Ok(KeyCheck::WrongModel);
        }
        if !key.is_active {
            return Ok(KeyCheck::Disabled);
        }
        if key.quota_exhausted() {
            return Ok(KeyCheck::QuotaExceeded {
                used: key.usage_count,
                limit: key.usage_limit,
            });
        }

        key.usage_count += 1;
        key.last_used_at = Some(Utc::now());
        Ok(KeyCheck::Accepted)
    }

    async fn delete_by_model(&self, model_id: &Uuid) -> Result<usize> {
        let mut keys = self
            .keys
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

        let before = keys.len();
        keys.retain(|_, key| &key.model_id != model_id);
        Ok(before - keys.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::filter::{FilterCondition, FilterOp, SortDirection};
    use crate::core::model::NewApiModel;
    use serde_json::json;

    fn new_model(name: &str) -> ApiModel {
        ApiModel::new(&NewApiModel {
            name: name.to_string(),
            schema: r#"{"name":"string","price":"number"}"#.to_string(),
            generated_by_ai: false,
            ai_prompt: None,
            requires_auth: false,
        })
    }

    fn data(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_model_names_are_unique() {
        let service = InMemoryModelService::new();

        let created = service.create(new_model("products")).await.unwrap();
        assert!(created.is_some());

        let duplicate = service.create(new_model("products")).await.unwrap();
        assert!(duplicate.is_none());
        assert_eq!(service.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_find_and_delete_model() {
        let service = InMemoryModelService::new();
        let model = service.create(new_model("notes")).await.unwrap().unwrap();

        let found = service.find_by_name("notes").await.unwrap();
        assert_eq!(found.map(|m| m.id), Some(model.id));

        let deleted = service.delete(&model.id).await.unwrap();
        assert!(deleted.is_some());
        assert!(service.get(&model.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_models_listed_newest_first() {
        let service = InMemoryModelService::new();
        let mut older = new_model("older");
        older.created_at -= chrono::Duration::seconds(10);
        service.create(older).await.unwrap();
        service.create(new_model("newer")).await.unwrap();

        let names: Vec<String> = service
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.name)
            .collect();
        assert_eq!(names, vec!["newer", "older"]);
    }

    #[tokio::test]
    async fn test_records_are_scoped_to_their_model() {
        let service = InMemoryRecordService::new();
        let model_a = Uuid::new_v4();
        let model_b = Uuid::new_v4();

        let record = service
            .create(&model_a, data(json!({"name": "Lamp"})))
            .await
            .unwrap();

        assert!(service.get(&model_a, &record.id).await.unwrap().is_some());
        assert!(service.get(&model_b, &record.id).await.unwrap().is_none());
        assert!(!service.delete(&model_b, &record.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_query_filters_sorts_and_pages() {
        let service = InMemoryRecordService::new();
        let model_id = Uuid::new_v4();
        for (name, price) in [("a", 5), ("b", 50), ("c", 150), ("d", 500)] {
            service
                .create(&model_id, data(json!({"name": name, "price": price})))
                .await
                .unwrap();
        }

        let mut filter = FilterExpression::new();
        filter.push(
            "price",
            FilterCondition::Compare {
                op: FilterOp::GreaterThan,
                value: json!(10),
                case_insensitive: false,
            },
        );
        let sort = SortSpec::new("price", SortDirection::Asc);

        let (page, total) = service
            .query(&model_id, &filter, &sort, 0, 2)
            .await
            .unwrap();
        assert_eq!(total, 3);
        let names: Vec<&Value> = page.iter().map(|r| &r.data["name"]).collect();
        assert_eq!(names, vec![&json!("b"), &json!("c")]);

        let (second, _) = service
            .query(&model_id, &filter, &sort, 2, 2)
            .await
            .unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].data["name"], "d");
    }

    #[tokio::test]
    async fn test_update_replaces_data() {
        let service = InMemoryRecordService::new();
        let model_id = Uuid::new_v4();
        let record = service
            .create(&model_id, data(json!({"name": "Lamp", "price": 3})))
            .await
            .unwrap();

        let updated = service
            .update(&model_id, &record.id, data(json!({"name": "Desk"})))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(Value::Object(updated.data), json!({"name": "Desk"}));
        assert!(updated.updated_at >= record.updated_at);

        let missing = service
            .update(&model_id, &Uuid::new_v4(), Map::new())
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_delete_records_by_model() {
        let service = InMemoryRecordService::new();
        let model_id = Uuid::new_v4();
        service.create(&model_id, Map::new()).await.unwrap();
        service.create(&model_id, Map::new()).await.unwrap();

        assert_eq!(service.delete_by_model(&model_id).await.unwrap(), 2);
        let (_, total) = service
            .query(&model_id, &FilterExpression::new(), &SortSpec::default(), 0, 10)
            .await
            .unwrap();
        assert_eq!(total, 0);
    }

    #[tokio::test]
    async fn test_toggle_and_reset_key() {
        let service = InMemoryApiKeyService::new();
        let mut key = ApiKey::new(Uuid::new_v4(), "ci", 5);
        key.usage_count = 4;
        let key = service.create(key).await.unwrap();

        let toggled = service.toggle(&key.id).await.unwrap().unwrap();
        assert!(!toggled.is_active);
        let toggled = service.toggle(&key.id).await.unwrap().unwrap();
        assert!(toggled.is_active);

        let reset = service.reset_usage(&key.id).await.unwrap().unwrap();
        assert_eq!(reset.usage_count, 0);
    }

    #[tokio::test]
    async fn test_authorize_counts_usage() {
        let service = InMemoryApiKeyService::new();
        let model_id = Uuid::new_v4();
        let key = service
            .create(ApiKey::new(model_id, "ci", 1))
            .await
            .unwrap();

        assert_eq!(
            service.authorize(&key.key, &model_id).await.unwrap(),
            KeyCheck::Accepted
        );
        assert_eq!(
            service.authorize(&key.key, &model_id).await.unwrap(),
            KeyCheck::QuotaExceeded { used: 1, limit: 1 }
        );
        assert_eq!(
            service.authorize("ak_unknown", &model_id).await.unwrap(),
            KeyCheck::Unknown
        );
    }

    #[tokio::test]
    async fn test_delete_keys_by_model() {
        let service = InMemoryApiKeyService::new();
        let model_id = Uuid::new_v4();
        service.create(ApiKey::new(model_id, "a", 5)).await.unwrap();
        service.create(ApiKey::new(model_id, "b", 5)).await.unwrap();
        service
            .create(ApiKey::new(Uuid::new_v4(), "other", 5))
            .await
            .unwrap();

        assert_eq!(service.delete_by_model(&model_id).await.unwrap(), 2);
        assert!(service.list_for_model(&model_id).await.unwrap().is_empty());
    }
}
