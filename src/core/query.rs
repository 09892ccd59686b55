//! Query parameters, filter/sort building and pagination utilities
//!
//! Dynamic endpoints accept arbitrary query parameters:
//!
//! ```text
//! GET /api/products?price_gt=100&in-stock=true&name_contains=phone&sort=price&order=asc&page=2
//! ```
//!
//! [`build_filter`] turns the field parameters into a [`FilterExpression`]
//! and [`build_sort`] derives the [`SortSpec`]. Both are permissive: a
//! parameter they cannot use is dropped, never reported.

use crate::core::filter::{
    DEFAULT_SORT_FIELD, FilterCondition, FilterExpression, FilterOp, SortDirection, SortSpec,
};
use crate::core::schema::{FieldType, Schema};
use serde::Serialize;
use serde_json::{Number, Value};
use std::collections::HashMap;

/// Keys that never become filters
pub const RESERVED_KEYS: [&str; 3] = ["page", "limit", "id"];

/// Build a filter expression from URL query parameters
///
/// Supported suffixes: `_gt`, `_lt`, `_gte`, `_lte`, `_contains`,
/// `_startsWith`, `_endsWith`. A key without a suffix is an equality filter.
/// Keys whose base field is not in the schema are dropped, as are `number`
/// values that do not parse.
pub fn build_filter(params: &HashMap<String, String>, schema: &Schema) -> FilterExpression {
    let mut filter = FilterExpression::new();

    for (key, raw) in params {
        if RESERVED_KEYS.contains(&key.as_str()) {
            continue;
        }

        let (field, op) = FilterOp::split_key(key);

        let Some(field_type) = schema.get(field) else {
            continue;
        };

        let condition = match field_type {
            FieldType::Number => {
                let Some(number) = parse_number(raw) else {
                    continue;
                };
                comparison(op, Value::Number(number), false)
            }
            FieldType::Boolean => comparison(op, Value::Bool(raw.eq_ignore_ascii_case("true")), false),
            FieldType::String | FieldType::Array | FieldType::Object => {
                let insensitive = op.is_some_and(|op| op.is_text_match());
                comparison(op, Value::String(raw.clone()), insensitive)
            }
        };

        filter.push(field, condition);
    }

    filter
}

/// Derive the sort specification from `sort` and `order`
///
/// `sort` defaults to `default_field`; `order` is ascending only for the
/// exact value `asc`. When the sort field is not in the schema the result is
/// always `createdAt` descending, whatever `order` says.
pub fn build_sort(
    params: &HashMap<String, String>,
    schema: &Schema,
    default_field: &str,
) -> SortSpec {
    let field = params
        .get("sort")
        .map(String::as_str)
        .filter(|s| !s.is_empty())
        .unwrap_or(default_field);
    let direction = SortDirection::parse(params.get("order").map(String::as_str));

    if schema.contains(field) {
        SortSpec::new(field, direction)
    } else {
        SortSpec::default_order()
    }
}

fn comparison(op: Option<FilterOp>, value: Value, case_insensitive: bool) -> FilterCondition {
    match op {
        None => FilterCondition::Equals(value),
        Some(op) => FilterCondition::Compare {
            op,
            value,
            case_insensitive,
        },
    }
}

/// Parse a decimal literal, keeping integral values as JSON integers
fn parse_number(raw: &str) -> Option<Number> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(int) = trimmed.parse::<i64>() {
        return Some(Number::from(int));
    }

    let float = trimmed.parse::<f64>().ok().filter(|f| f.is_finite())?;
    if float.fract() == 0.0 && float.abs() < i64::MAX as f64 {
        return Some(Number::from(float as i64));
    }
    Number::from_f64(float)
}

/// Query parameters of a dynamic endpoint request
///
/// Wraps the raw parameter map and exposes the pagination and lookup keys.
#[derive(Debug, Clone)]
pub struct QueryParams {
    raw: HashMap<String, String>,
    default_limit: usize,
    max_limit: usize,
}

impl QueryParams {
    /// Create from a raw parameter map with the default pagination bounds
    pub fn new(raw: HashMap<String, String>) -> Self {
        Self::with_limits(raw, 10, 100)
    }

    /// Create with explicit pagination bounds
    pub fn with_limits(raw: HashMap<String, String>, default_limit: usize, max_limit: usize) -> Self {
        Self {
            raw,
            default_limit: default_limit.max(1),
            max_limit: max_limit.max(1),
        }
    }

    pub fn raw(&self) -> &HashMap<String, String> {
        &self.raw
    }

    /// Record id lookup (`?id=`)
    pub fn id(&self) -> Option<&str> {
        self.raw.get("id").map(String::as_str).filter(|s| !s.is_empty())
    }

    /// `?page=`, never below 1
    pub fn page(&self) -> usize {
        self.raw
            .get("page")
            .and_then(|p| p.trim().parse::<usize>().ok())
            .unwrap_or(1)
            .max(1)
    }

    /// Get limit, clamped to the configured bounds
    pub fn limit(&self) -> usize {
        self.raw
            .get("limit")
            .and_then(|l| l.trim().parse::<usize>().ok())
            .unwrap_or(self.default_limit)
            .clamp(1, self.max_limit)
    }

    /// Number of records to skip for the current page
    pub fn offset(&self) -> usize {
        (self.page() - 1).saturating_mul(self.limit())
    }

    pub fn filter(&self, schema: &Schema) -> FilterExpression {
        build_filter(&self.raw, schema)
    }

    pub fn sort(&self, schema: &Schema) -> SortSpec {
        build_sort(&self.raw, schema, DEFAULT_SORT_FIELD)
    }
}

/// One page of records plus where it sits in the full result
#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub pagination: PaginationMeta,
}

/// Page position, rendered as `{page, limit, total, totalPages, hasNext, hasPrev}`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    /// 1-based
    pub page: usize,
    pub limit: usize,
    /// Matching records, counted after filtering
    pub total: usize,
    pub total_pages: usize,
    pub has_next: bool,
    pub has_prev: bool,
}

impl PaginationMeta {
    pub fn new(page: usize, limit: usize, total: usize) -> Self {
        let limit = limit.max(1);
        let page = page.max(1);
        let total_pages = if total == 0 { 0 } else { total.div_ceil(limit) };
        let start = (page - 1).saturating_mul(limit);

        Self {
            page,
            limit,
            total,
            total_pages,
            has_next: start.saturating_add(limit) < total,
            has_prev: page > 1,
        }
    }
}
