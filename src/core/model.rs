//! API model definitions
//!
//! An [`ApiModel`] is one dynamically created endpoint: its normalized name
//! becomes the path segment under `/api/` and its schema governs what records
//! it accepts.

use crate::core::schema::{Schema, SchemaError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// A dynamically created API
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ApiModel {
    pub id: Uuid,

    /// Normalized name, unique across models
    pub name: String,

    /// Schema as submitted (a JSON string)
    pub schema: String,

    #[serde(rename = "generatedByAI")]
    pub generated_by_ai: bool,
    pub ai_prompt: Option<String>,
    pub requires_auth: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ApiModel {
    /// Build a model from a validated creation request
    pub fn new(request: &NewApiModel) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: normalize_name(&request.name),
            schema: request.schema.clone(),
            generated_by_ai: request.generated_by_ai,
            ai_prompt: request.ai_prompt.clone().filter(|p| !p.is_empty()),
            requires_auth: request.requires_auth,
            created_at: now,
            updated_at: now,
        }
    }

    /// Parse the stored schema
    pub fn parsed_schema(&self) -> Result<Schema, SchemaError> {
        Schema::from_json_str(&self.schema)
    }
}

/// Input for creating a model
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewApiModel {
    #[validate(length(min = 1, max = 128))]
    pub name: String,

    #[validate(length(min = 1))]
    pub schema: String,

    #[serde(default, rename = "generatedByAI", alias = "generatedByAi")]
    pub generated_by_ai: bool,

    #[serde(default)]
    pub ai_prompt: Option<String>,

    #[serde(default)]
    pub requires_auth: bool,
}

/// Normalize an API name for use as a path segment
///
/// Lowercases and replaces every character outside `[a-z0-9-]` with `-`.
pub fn normalize_name(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' {
                c
            } else {
                '-'
            }
        })
        .collect()
}
