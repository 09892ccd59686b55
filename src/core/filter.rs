//! Filter expressions and sort specifications for record queries
//!
//! These are the structured outputs of the query builder in
//! [`query`](crate::core::query). Storage backends translate them into their
//! own query language; the in-memory store evaluates them directly with
//! [`FilterExpression::matches`] and [`SortSpec::compare`].

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value, json};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Field used when no valid sort field is requested
pub const DEFAULT_SORT_FIELD: &str = "createdAt";

/// Comparison operator carried by a non-equality condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum FilterOp {
    #[serde(rename = "gt")]
    GreaterThan,
    #[serde(rename = "lt")]
    LessThan,
    #[serde(rename = "gte")]
    GreaterOrEqual,
    #[serde(rename = "lte")]
    LessOrEqual,
    #[serde(rename = "contains")]
    Contains,
    #[serde(rename = "startsWith")]
    StartsWith,
    #[serde(rename = "endsWith")]
    EndsWith,
}

impl FilterOp {
    /// Query-string suffixes, in matching order
    pub const SUFFIXES: [(&'static str, FilterOp); 7] = [
        ("_gt", FilterOp::GreaterThan),
        ("_lt", FilterOp::LessThan),
        ("_gte", FilterOp::GreaterOrEqual),
        ("_lte", FilterOp::LessOrEqual),
        ("_contains", FilterOp::Contains),
        ("_startsWith", FilterOp::StartsWith),
        ("_endsWith", FilterOp::EndsWith),
    ];

    /// Split a parameter key into its base field and operator, if any
    pub fn split_key(key: &str) -> (&str, Option<FilterOp>) {
        for (suffix, op) in Self::SUFFIXES {
            if let Some(field) = key.strip_suffix(suffix) {
                return (field, Some(op));
            }
        }
        (key, None)
    }

    /// Name used in the JSON rendering of a filter
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOp::GreaterThan => "gt",
            FilterOp::LessThan => "lt",
            FilterOp::GreaterOrEqual => "gte",
            FilterOp::LessOrEqual => "lte",
            FilterOp::Contains => "contains",
            FilterOp::StartsWith => "startsWith",
            FilterOp::EndsWith => "endsWith",
        }
    }

    /// Whether this is one of the substring operators
    pub fn is_text_match(&self) -> bool {
        matches!(
            self,
            FilterOp::Contains | FilterOp::StartsWith | FilterOp::EndsWith
        )
    }
}

/// A single condition on one field
#[derive(Debug, Clone, PartialEq)]
pub enum FilterCondition {
    /// Field equals the literal value
    Equals(Value),

    /// Field compares to the value with `op`
    Compare {
        op: FilterOp,
        value: Value,
        case_insensitive: bool,
    },
}

impl FilterCondition {
    /// Operator of the condition, `None` for equality
    pub fn op(&self) -> Option<FilterOp> {
        match self {
            FilterCondition::Equals(_) => None,
            FilterCondition::Compare { op, .. } => Some(*op),
        }
    }

    /// Check the condition against a field value
    pub fn matches(&self, actual: &Value) -> bool {
        match self {
            FilterCondition::Equals(expected) => values_equal(actual, expected),
            FilterCondition::Compare {
                op,
                value,
                case_insensitive,
            } => {
                if op.is_text_match() {
                    return text_match(*op, actual, value, *case_insensitive);
                }

                match compare_values(actual, value) {
                    Some(ordering) => match op {
                        FilterOp::GreaterThan => ordering == Ordering::Greater,
                        FilterOp::LessThan => ordering == Ordering::Less,
                        FilterOp::GreaterOrEqual => ordering != Ordering::Less,
                        FilterOp::LessOrEqual => ordering != Ordering::Greater,
                        _ => false,
                    },
                    None => false,
                }
            }
        }
    }
}

/// Field name → conditions; a record must satisfy all of them
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterExpression {
    conditions: BTreeMap<String, Vec<FilterCondition>>,
}

impl FilterExpression {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a condition on a field
    ///
    /// A field's conditions stay ordered by operator, equality first, so the
    /// expression does not depend on the order conditions arrive in. A second
    /// condition with the same operator replaces the first.
    pub fn push(&mut self, field: impl Into<String>, condition: FilterCondition) {
        let conditions = self.conditions.entry(field.into()).or_default();
        match conditions.binary_search_by_key(&condition.op(), FilterCondition::op) {
            Ok(index) => conditions[index] = condition,
            Err(index) => conditions.insert(index, condition),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    pub fn contains_field(&self, field: &str) -> bool {
        self.conditions.contains_key(field)
    }

    /// Conditions attached to a field
    pub fn conditions(&self, field: &str) -> &[FilterCondition] {
        self.conditions
            .get(field)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.conditions.keys().map(String::as_str)
    }

    /// Evaluate the expression against a record's data
    pub fn matches(&self, record: &Map<String, Value>) -> bool {
        self.conditions.iter().all(|(field, conditions)| {
            record
                .get(field)
                .is_some_and(|actual| conditions.iter().all(|c| c.matches(actual)))
        })
    }

    /// Render as a query-language style JSON object
    ///
    /// Equality renders as `field: value`. Operators render as
    /// `field: { op: value }`, with `mode: "insensitive"` for the substring
    /// operators. Several conditions on one field merge into one object, an
    /// equality among them becoming `equals`.
    pub fn to_json(&self) -> Value {
        let mut out = Map::new();

        for (field, conditions) in &self.conditions {
            let rendered = match conditions.as_slice() {
                [FilterCondition::Equals(value)] => value.clone(),
                _ => {
                    let mut ops = Map::new();
                    for condition in conditions {
                        match condition {
                            FilterCondition::Equals(value) => {
                                ops.insert("equals".to_string(), value.clone());
                            }
                            FilterCondition::Compare {
                                op,
                                value,
                                case_insensitive,
                            } => {
                                ops.insert(op.as_str().to_string(), value.clone());
                                if *case_insensitive {
                                    ops.insert("mode".to_string(), json!("insensitive"));
                                }
                            }
                        }
                    }
                    Value::Object(ops)
                }
            };
            out.insert(field.clone(), rendered);
        }

        Value::Object(out)
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    /// `"asc"` is ascending, anything else descending
    pub fn parse(order: Option<&str>) -> Self {
        match order {
            Some("asc") => SortDirection::Asc,
            _ => SortDirection::Desc,
        }
    }
}

/// Field and direction to order records by
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SortSpec {
    pub field: String,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }

    /// The fallback ordering: newest first
    pub fn default_order() -> Self {
        Self::new(DEFAULT_SORT_FIELD, SortDirection::Desc)
    }

    pub fn to_json(&self) -> Value {
        let mut out = Map::new();
        out.insert(self.field.clone(), json!(self.direction));
        Value::Object(out)
    }

    /// Compare two records' sort keys in this sort's direction
    ///
    /// Missing keys sort before present ones in ascending order.
    pub fn compare(&self, a: Option<&Value>, b: Option<&Value>) -> Ordering {
        let ordering = match (a, b) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(a), Some(b)) => total_order(a, b),
        };

        match self.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

impl Default for SortSpec {
    fn default() -> Self {
        Self::default_order()
    }
}

/// Sort key for a timestamp, comparable with [`total_order`]
pub fn timestamp_key(ts: &DateTime<Utc>) -> Value {
    Value::String(ts.to_rfc3339_opts(chrono::SecondsFormat::Nanos, true))
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) if a.is_number() && b.is_number() => x == y,
        _ => a == b,
    }
}

fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

fn text_match(op: FilterOp, actual: &Value, needle: &Value, case_insensitive: bool) -> bool {
    let (Some(haystack), Some(needle)) = (actual.as_str(), needle.as_str()) else {
        return false;
    };

    let (haystack, needle) = if case_insensitive {
        (haystack.to_lowercase(), needle.to_lowercase())
    } else {
        (haystack.to_string(), needle.to_string())
    };

    match op {
        FilterOp::Contains => haystack.contains(&needle),
        FilterOp::StartsWith => haystack.starts_with(&needle),
        FilterOp::EndsWith => haystack.ends_with(&needle),
        _ => false,
    }
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

fn total_order(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.total_cmp(&y)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => type_rank(a)
            .cmp(&type_rank(b))
            .then_with(|| a.to_string().cmp(&b.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(value: Value) -> Map<String, Value> {
        value.as_object().cloned().expect("object")
    }

    #[test]
    fn test_split_key_recognizes_suffixes() {
        assert_eq!(FilterOp::split_key("price_gt"), ("price", Some(FilterOp::GreaterThan)));
        assert_eq!(FilterOp::split_key("price_gte"), ("price", Some(FilterOp::GreaterOrEqual)));
        assert_eq!(FilterOp::split_key("name_startsWith"), ("name", Some(FilterOp::StartsWith)));
        assert_eq!(FilterOp::split_key("in-stock"), ("in-stock", None));
    }

    #[test]
    fn test_split_key_is_case_sensitive() {
        assert_eq!(FilterOp::split_key("name_startswith"), ("name_startswith", None));
    }

    #[test]
    fn test_equality_compares_numbers_numerically() {
        let c = FilterCondition::Equals(json!(100));
        assert!(c.matches(&json!(100.0)));
        assert!(!c.matches(&json!("100")));
    }

    #[test]
    fn test_ordering_operators() {
        let gt = FilterCondition::Compare {
            op: FilterOp::GreaterThan,
            value: json!(10),
            case_insensitive: false,
        };
        let lte = FilterCondition::Compare {
            op: FilterOp::LessOrEqual,
            value: json!(10),
            case_insensitive: false,
        };
        assert!(gt.matches(&json!(10.5)));
        assert!(!gt.matches(&json!(10)));
        assert!(lte.matches(&json!(10)));
        assert!(!lte.matches(&json!("9")));
    }

    #[test]
    fn test_insensitive_contains() {
        let c = FilterCondition::Compare {
            op: FilterOp::Contains,
            value: json!("Phone"),
            case_insensitive: true,
        };
        assert!(c.matches(&json!("smartphone case")));
        assert!(!c.matches(&json!(42)));
    }

    #[test]
    fn test_sensitive_text_match() {
        let c = FilterCondition::Compare {
            op: FilterOp::EndsWith,
            value: json!("Case"),
            case_insensitive: false,
        };
        assert!(!c.matches(&json!("smartphone case")));
        assert!(c.matches(&json!("Phone Case")));
    }

    #[test]
    fn test_expression_requires_every_field() {
        let mut expr = FilterExpression::new();
        expr.push("in-stock", FilterCondition::Equals(json!(true)));
        expr.push(
            "price",
            FilterCondition::Compare {
                op: FilterOp::LessThan,
                value: json!(50),
                case_insensitive: false,
            },
        );

        assert!(expr.matches(&record(json!({"in-stock": true, "price": 20}))));
        assert!(!expr.matches(&record(json!({"in-stock": true, "price": 80}))));
        assert!(!expr.matches(&record(json!({"price": 20}))));
    }

    #[test]
    fn test_empty_expression_matches_everything() {
        assert!(FilterExpression::new().matches(&record(json!({}))));
    }

    #[test]
    fn test_to_json_rendering() {
        let mut expr = FilterExpression::new();
        expr.push("in-stock", FilterCondition::Equals(json!(true)));
        expr.push(
            "price",
            FilterCondition::Compare {
                op: FilterOp::GreaterThan,
                value: json!(100),
                case_insensitive: false,
            },
        );
        expr.push(
            "name",
            FilterCondition::Compare {
                op: FilterOp::Contains,
                value: json!("phone"),
                case_insensitive: true,
            },
        );

        assert_eq!(
            expr.to_json(),
            json!({
                "price": {"gt": 100},
                "in-stock": true,
                "name": {"contains": "phone", "mode": "insensitive"}
            })
        );
    }

    #[test]
    fn test_to_json_merges_range() {
        let mut expr = FilterExpression::new();
        for (op, v) in [(FilterOp::GreaterOrEqual, 1), (FilterOp::LessThan, 5)] {
            expr.push(
                "qty",
                FilterCondition::Compare {
                    op,
                    value: json!(v),
                    case_insensitive: false,
                },
            );
        }
        assert_eq!(expr.to_json(), json!({"qty": {"gte": 1, "lt": 5}}));
    }

    #[test]
    fn test_push_order_does_not_matter() {
        let gt = FilterCondition::Compare {
            op: FilterOp::GreaterThan,
            value: json!(1),
            case_insensitive: false,
        };
        let eq = FilterCondition::Equals(json!(3));

        let mut a = FilterExpression::new();
        a.push("qty", gt.clone());
        a.push("qty", eq.clone());
        let mut b = FilterExpression::new();
        b.push("qty", eq);
        b.push("qty", gt);

        assert_eq!(a, b);
    }

    #[test]
    fn test_same_operator_replaces_condition() {
        let mut expr = FilterExpression::new();
        expr.push("qty", FilterCondition::Equals(json!(1)));
        expr.push("qty", FilterCondition::Equals(json!(2)));
        assert_eq!(expr.conditions("qty"), &[FilterCondition::Equals(json!(2))]);
    }

    #[test]
    fn test_sort_direction_parse() {
        assert_eq!(SortDirection::parse(Some("asc")), SortDirection::Asc);
        assert_eq!(SortDirection::parse(Some("ASC")), SortDirection::Desc);
        assert_eq!(SortDirection::parse(None), SortDirection::Desc);
    }

    #[test]
    fn test_sort_compare_directions() {
        let asc = SortSpec::new("price", SortDirection::Asc);
        let desc = SortSpec::new("price", SortDirection::Desc);
        let (a, b) = (json!(1), json!(2));
        assert_eq!(asc.compare(Some(&a), Some(&b)), Ordering::Less);
        assert_eq!(desc.compare(Some(&a), Some(&b)), Ordering::Greater);
        assert_eq!(asc.compare(None, Some(&a)), Ordering::Less);
    }

    #[test]
    fn test_sort_spec_json() {
        assert_eq!(SortSpec::default().to_json(), json!({"createdAt": "desc"}));
    }
}
