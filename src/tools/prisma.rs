//! Model and key management tools
//!
//! Each tool answers with a [`FormState`]. Business failures (unknown API,
//! duplicate name, missing key) come back as `success: false` with the
//! error title as `message` and the detail as `error`.

use crate::core::error::{ApiError, ApiResult};
use crate::core::model::NewApiModel;
use crate::registry::ApiRegistry;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use uuid::Uuid;

/// Envelope returned by every model/key tool
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FormState {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FormState {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
            error: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn failure(err: &ApiError) -> Self {
        Self {
            success: false,
            message: err.title().to_string(),
            data: None,
            error: Some(err.to_string()),
        }
    }

    fn from_result(result: ApiResult<FormState>) -> Self {
        result.unwrap_or_else(|err| {
            tracing::debug!(error = %err, "tool call failed");
            Self::failure(&err)
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GetModelInput {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IdInput {
    pub id: Uuid,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateApiKeyInput {
    pub model_id: Uuid,
    pub key_name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelIdInput {
    pub model_id: Uuid,
}

pub async fn create_model(registry: &ApiRegistry, input: NewApiModel) -> FormState {
    FormState::from_result(async {
        let model = registry.create_model(input).await?;
        Ok(
            FormState::ok(format!("API \"{}\" created successfully!", model.name))
                .with_data(json!({ "model": model })),
        )
    }
    .await)
}

pub async fn get_models(registry: &ApiRegistry) -> FormState {
    FormState::from_result(async {
        let models = registry.list_models().await?;
        Ok(FormState::ok("Models fetched successfully").with_data(json!({ "models": models })))
    }
    .await)
}

pub async fn get_model(registry: &ApiRegistry, input: GetModelInput) -> FormState {
    FormState::from_result(async {
        let model = registry.get_model(&input.name).await?;
        Ok(FormState::ok("Model fetched successfully").with_data(json!({ "model": model })))
    }
    .await)
}

pub async fn delete_model(registry: &ApiRegistry, input: IdInput) -> FormState {
    FormState::from_result(async {
        registry.delete_model(&input.id).await?;
        Ok(FormState::ok("API deleted successfully!"))
    }
    .await)
}

pub async fn create_api_key(registry: &ApiRegistry, input: CreateApiKeyInput) -> FormState {
    FormState::from_result(async {
        let key = registry
            .create_api_key(&input.model_id, &input.key_name)
            .await?;
        Ok(FormState::ok("API key created successfully!").with_data(json!({ "apiKey": key })))
    }
    .await)
}

pub async fn get_api_keys(registry: &ApiRegistry, input: ModelIdInput) -> FormState {
    FormState::from_result(async {
        let keys = registry.list_api_keys(&input.model_id).await?;
        Ok(FormState::ok("API keys fetched successfully").with_data(json!({ "apiKeys": keys })))
    }
    .await)
}

pub async fn delete_api_key(registry: &ApiRegistry, input: IdInput) -> FormState {
    FormState::from_result(async {
        registry.delete_api_key(&input.id).await?;
        Ok(FormState::ok("API key deleted successfully!"))
    }
    .await)
}

pub async fn toggle_api_key(registry: &ApiRegistry, input: IdInput) -> FormState {
    FormState::from_result(async {
        let key = registry.toggle_api_key(&input.id).await?;
        let state = if key.is_active { "enabled" } else { "disabled" };
        Ok(FormState::ok(format!("API key {} successfully!", state))
            .with_data(json!({ "apiKey": key })))
    }
    .await)
}

pub async fn reset_api_key_usage(registry: &ApiRegistry, input: IdInput) -> FormState {
    FormState::from_result(async {
        let key = registry.reset_api_key_usage(&input.id).await?;
        Ok(FormState::ok("API key usage reset successfully!").with_data(json!({ "apiKey": key })))
    }
    .await)
}

pub async fn get_api_key_usage(registry: &ApiRegistry, input: IdInput) -> FormState {
    FormState::from_result(async {
        let usage = registry.api_key_usage(&input.id).await?;
        Ok(FormState::ok("API key usage fetched successfully").with_data(json!({ "usage": usage })))
    }
    .await)
}
