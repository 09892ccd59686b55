//! Model registry and API key manager
//!
//! [`ApiRegistry`] owns the three stores and enforces the rules that sit
//! above raw storage: name normalization and uniqueness, schema checks at
//! creation time, cascading deletes, and key masking.

use crate::core::api_key::{ApiKey, KeyUsage};
use crate::core::error::{ApiError, ApiResult, ModelError};
use crate::core::model::{ApiModel, NewApiModel};
use crate::core::schema::Schema;
use crate::core::service::{ApiKeyService, ModelService, RecordService};
use crate::storage::{InMemoryApiKeyService, InMemoryModelService, InMemoryRecordService};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

/// Default usage limit of new API keys
pub const DEFAULT_USAGE_LIMIT: u64 = 1000;

/// Shared registry of models, records and keys
#[derive(Clone)]
pub struct ApiRegistry {
    models: Arc<dyn ModelService>,
    records: Arc<dyn RecordService>,
    keys: Arc<dyn ApiKeyService>,
    default_usage_limit: u64,
}

impl ApiRegistry {
    pub fn new(
        models: Arc<dyn ModelService>,
        records: Arc<dyn RecordService>,
        keys: Arc<dyn ApiKeyService>,
    ) -> Self {
        Self {
            models,
            records,
            keys,
            default_usage_limit: DEFAULT_USAGE_LIMIT,
        }
    }

    /// Registry backed by the in-memory stores
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(InMemoryModelService::new()),
            Arc::new(InMemoryRecordService::new()),
            Arc::new(InMemoryApiKeyService::new()),
        )
    }

    /// Set the usage limit given to new keys
    pub fn with_default_usage_limit(mut self, limit: u64) -> Self {
        self.default_usage_limit = limit;
        self
    }

    pub fn default_usage_limit(&self) -> u64 {
        self.default_usage_limit
    }

    pub fn records(&self) -> &Arc<dyn RecordService> {
        &self.records
    }

    pub fn keys(&self) -> &Arc<dyn ApiKeyService> {
        &self.keys
    }

    // -------------------------------------------------------------------------
    // Models
    // -------------------------------------------------------------------------

    /// Create a model after checking its name and schema
    pub async fn create_model(&self, request: NewApiModel) -> ApiResult<ApiModel> {
        if request.name.trim().is_empty() {
            return Err(ModelError::EmptyName.into());
        }
        if request.schema.trim().is_empty() {
            return Err(ModelError::EmptySchema.into());
        }
        if let Err(errors) = request.validate() {
            return Err(ModelError::InvalidDefinition {
                message: errors.to_string(),
            }
            .into());
        }
        Schema::from_json_str(&request.schema)?;

        let model = ApiModel::new(&request);
        let name = model.name.clone();
        match self.models.create(model).await? {
            Some(created) => {
                tracing::info!(model = %created.name, requires_auth = created.requires_auth, "API created");
                Ok(created)
            }
            None => Err(ModelError::AlreadyExists { name }.into()),
        }
    }

    /// All models, newest first
    pub async fn list_models(&self) -> ApiResult<Vec<ApiModel>> {
        Ok(self.models.list().await?)
    }

    /// Look up a model by its path name
    pub async fn get_model(&self, name: &str) -> ApiResult<ApiModel> {
        self.models
            .find_by_name(name)
            .await?
            .ok_or_else(|| {
                ModelError::NotFound {
                    name: name.to_string(),
                }
                .into()
            })
    }

    pub async fn get_model_by_id(&self, id: &Uuid) -> ApiResult<ApiModel> {
        self.models
            .get(id)
            .await?
            .ok_or_else(|| ModelError::NotFoundById { id: *id }.into())
    }

    /// Delete a model together with its records and keys
    pub async fn delete_model(&self, id: &Uuid) -> ApiResult<ApiModel> {
        let model = self
            .models
            .delete(id)
            .await?
            .ok_or(ModelError::NotFoundById { id: *id })?;

        let records = self.records.delete_by_model(id).await?;
        let keys = self.keys.delete_by_model(id).await?;
        tracing::info!(model = %model.name, records, keys, "API deleted");

        Ok(model)
    }

    // -------------------------------------------------------------------------
    // API keys
    // -------------------------------------------------------------------------

    /// Create a key for a model; the returned key is the only unmasked copy
    pub async fn create_api_key(&self, model_id: &Uuid, name: &str) -> ApiResult<ApiKey> {
        let model = self.get_model_by_id(model_id).await?;
        let key = self
            .keys
            .create(ApiKey::new(model.id, name, self.default_usage_limit))
            .await?;
        tracing::info!(model = %model.name, key_id = %key.id, "API key created");
        Ok(key)
    }

    /// Keys of a model, newest first, masked
    pub async fn list_api_keys(&self, model_id: &Uuid) -> ApiResult<Vec<ApiKey>> {
        let keys = self.keys.list_for_model(model_id).await?;
        Ok(keys.iter().map(ApiKey::masked).collect())
    }

    pub async fn delete_api_key(&self, id: &Uuid) -> ApiResult<()> {
        if self.keys.delete(id).await? {
            Ok(())
        } else {
            Err(key_not_found(id))
        }
    }

    /// Flip a key between active and disabled
    pub async fn toggle_api_key(&self, id: &Uuid) -> ApiResult<ApiKey> {
        let key = self.keys.toggle(id).await?.ok_or_else(|| key_not_found(id))?;
        Ok(key.masked())
    }

    pub async fn reset_api_key_usage(&self, id: &Uuid) -> ApiResult<ApiKey> {
        let key = self
            .keys
            .reset_usage(id)
            .await?
            .ok_or_else(|| key_not_found(id))?;
        Ok(key.masked())
    }

    pub async fn api_key_usage(&self, id: &Uuid) -> ApiResult<KeyUsage> {
        let key = self.keys.get(id).await?.ok_or_else(|| key_not_found(id))?;
        Ok(key.usage())
    }
}

impl Default for ApiRegistry {
    fn default() -> Self {
        Self::in_memory()
    }
}

fn key_not_found(id: &Uuid) -> ApiError {
    ApiError::NotFound {
        resource: "API key",
        id: id.to_string(),
    }
}
