//! API keys protecting dynamic endpoints
//!
//! Keys have the form `ak_` followed by 32 characters from the URL-safe
//! alphabet `[A-Za-z0-9_-]`. Each key belongs to one model, can be disabled,
//! and carries a usage counter checked against a limit on every request.

use chrono::{DateTime, Utc};
use rand::Rng;
use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;
use uuid::Uuid;

/// Prefix of every generated key
pub const KEY_PREFIX: &str = "ak_";

/// Number of random characters after the prefix
pub const KEY_RANDOM_LEN: usize = 32;

const KEY_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789_-";

/// Generate a new API key
pub fn generate_api_key() -> String {
    let mut rng = rand::thread_rng();
    let random: String = (0..KEY_RANDOM_LEN)
        .map(|_| KEY_ALPHABET[rng.gen_range(0..KEY_ALPHABET.len())] as char)
        .collect();
    format!("{}{}", KEY_PREFIX, random)
}

/// Check that a string has the shape of a generated key
pub fn is_valid_api_key_format(key: &str) -> bool {
    static KEY_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = KEY_REGEX.get_or_init(|| {
        Regex::new(r"^ak_[A-Za-z0-9_-]{32}$").expect("API key pattern is a valid regex")
    });
    regex.is_match(key)
}

/// Mask a key for display: first 8 characters, `...`, last 4
pub fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 12 {
        return format!("{}...", chars.iter().take(4).collect::<String>());
    }
    let head: String = chars[..8].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

/// An API key record
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ApiKey {
    pub id: Uuid,
    pub key: String,
    pub name: String,
    pub model_id: Uuid,
    pub is_active: bool,
    pub usage_count: u64,
    pub usage_limit: u64,
    pub last_used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl ApiKey {
    /// Create a fresh active key for a model
    pub fn new(model_id: Uuid, name: impl Into<String>, usage_limit: u64) -> Self {
        Self {
            id: Uuid::new_v4(),
            key: generate_api_key(),
            name: name.into(),
            model_id,
            is_active: true,
            usage_count: 0,
            usage_limit,
            last_used_at: None,
            created_at: Utc::now(),
        }
    }

    /// Copy with the key masked, for listings
    pub fn masked(&self) -> Self {
        Self {
            key: mask_key(&self.key),
            ..self.clone()
        }
    }

    pub fn quota_exhausted(&self) -> bool {
        self.usage_count >= self.usage_limit
    }

    pub fn usage(&self) -> KeyUsage {
        KeyUsage::new(self.usage_count, self.usage_limit)
    }
}

/// Usage statistics for a key
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct KeyUsage {
    pub usage_count: u64,
    pub usage_limit: u64,
    pub percent_used: u64,
    pub remaining: u64,
}

impl KeyUsage {
    pub fn new(usage_count: u64, usage_limit: u64) -> Self {
        let percent_used = if usage_limit == 0 {
            100
        } else {
            ((usage_count as f64 / usage_limit as f64) * 100.0).round() as u64
        };
        Self {
            usage_count,
            usage_limit,
            percent_used,
            remaining: usage_limit.saturating_sub(usage_count),
        }
    }
}

/// Result of checking a presented key against the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyCheck {
    /// Key accepted, usage recorded
    Accepted,
    /// No key with that value
    Unknown,
    /// Key belongs to another model
    WrongModel,
    /// Key disabled
    Disabled,
    /// Usage limit reached
    QuotaExceeded { used: u64, limit: u64 },
}
