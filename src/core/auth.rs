//! API key authentication for dynamic endpoints
//!
//! Models created with `requires_auth` demand an `X-API-Key` header. The key
//! must belong to the model, be active, and have quota left; each accepted
//! request counts against the quota.

use crate::core::api_key::KeyCheck;
use crate::core::error::{ApiResult, AuthError};
use crate::core::model::ApiModel;
use crate::core::service::ApiKeyService;
use axum::http::HeaderMap;

/// Header carrying the API key
pub const API_KEY_HEADER: &str = "x-api-key";

/// How a request to a dynamic endpoint was admitted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessContext {
    /// Model does not require a key
    Public,

    /// Admitted with an API key, one use recorded
    ApiKey,
}

/// Extract the API key header, if present and readable
pub fn extract_api_key(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
}

/// Authenticate a request against a model
pub async fn authenticate(
    headers: &HeaderMap,
    model: &ApiModel,
    keys: &dyn ApiKeyService,
) -> ApiResult<AccessContext> {
    if !model.requires_auth {
        return Ok(AccessContext::Public);
    }

    let key = extract_api_key(headers).ok_or(AuthError::MissingKey)?;

    let outcome = match keys.authorize(key, &model.id).await? {
        KeyCheck::Accepted => return Ok(AccessContext::ApiKey),
        KeyCheck::Unknown => AuthError::InvalidKey,
        KeyCheck::WrongModel => AuthError::WrongModel,
        KeyCheck::Disabled => AuthError::Disabled,
        KeyCheck::QuotaExceeded { used, limit } => AuthError::QuotaExceeded { used, limit },
    };

    tracing::debug!(model = %model.name, reason = %outcome, "API key rejected");
    Err(outcome.into())
}
