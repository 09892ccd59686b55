//! Service traits for models, records and API keys
//!
//! The HTTP layer and the tool servers only talk to these traits. The crate
//! ships in-memory implementations in [`crate::storage`].

use crate::core::api_key::{ApiKey, KeyCheck};
use crate::core::filter::{FilterExpression, SortSpec};
use crate::core::model::ApiModel;
use crate::core::record::StoredRecord;
use anyhow::Result;
use async_trait::async_trait;
use serde_json::{Map, Value};
use uuid::Uuid;

/// Storage for API model definitions
#[async_trait]
pub trait ModelService: Send + Sync {
    /// Insert a model
    ///
    /// Returns `None` without inserting when the name is already taken.
    async fn create(&self, model: ApiModel) -> Result<Option<ApiModel>>;

    /// Get a model by ID
    async fn get(&self, id: &Uuid) -> Result<Option<ApiModel>>;

    /// Get a model by its normalized name
    async fn find_by_name(&self, name: &str) -> Result<Option<ApiModel>>;

    /// List all models, newest first
    async fn list(&self) -> Result<Vec<ApiModel>>;

    /// Delete a model, returning it if it existed
    async fn delete(&self, id: &Uuid) -> Result<Option<ApiModel>>;
}

/// Storage for records of dynamic APIs
#[async_trait]
pub trait RecordService: Send + Sync {
    /// Create a record under a model
    async fn create(&self, model_id: &Uuid, data: Map<String, Value>) -> Result<StoredRecord>;

    /// Get a record of a model by ID
    async fn get(&self, model_id: &Uuid, id: &Uuid) -> Result<Option<StoredRecord>>;

    /// Filter, sort and page the records of a model
    ///
    /// Returns the requested page and the total number of matching records.
    async fn query(
        &self,
        model_id: &Uuid,
        filter: &FilterExpression,
        sort: &SortSpec,
        offset: usize,
        limit: usize,
    ) -> Result<(Vec<StoredRecord>, usize)>;

    /// Replace the data of a record
    async fn update(
        &self,
        model_id: &Uuid,
        id: &Uuid,
        data: Map<String, Value>,
    ) -> Result<Option<StoredRecord>>;

    /// Delete a record, returning whether it existed
    async fn delete(&self, model_id: &Uuid, id: &Uuid) -> Result<bool>;

    /// Delete every record of a model, returning how many were removed
    async fn delete_by_model(&self, model_id: &Uuid) -> Result<usize>;
}

/// Storage for API keys
#[async_trait]
pub trait ApiKeyService: Send + Sync {
    /// Store a new key
    async fn create(&self, key: ApiKey) -> Result<ApiKey>;

    /// Get a key by ID
    async fn get(&self, id: &Uuid) -> Result<Option<ApiKey>>;

    /// List the keys of a model, newest first
    async fn list_for_model(&self, model_id: &Uuid) -> Result<Vec<ApiKey>>;

    /// Delete a key, returning whether it existed
    async fn delete(&self, id: &Uuid) -> Result<bool>;

    /// Flip the active flag, returning the updated key
    async fn toggle(&self, id: &Uuid) -> Result<Option<ApiKey>>;

    /// Set the usage counter back to zero
    async fn reset_usage(&self, id: &Uuid) -> Result<Option<ApiKey>>;

    /// Check a presented key for a model and record one use on success
    ///
    /// The quota check and the increment happen atomically.
    async fn authorize(&self, key: &str, model_id: &Uuid) -> Result<KeyCheck>;

    /// Delete every key of a model, returning how many were removed
    async fn delete_by_model(&self, model_id: &Uuid) -> Result<usize>;
}
