//! Smoke tests for generated APIs
//!
//! Test cases are plain HTTP requests with an expected status and a list of
//! fields the JSON response must carry. Without explicit cases the runner
//! lists the API and creates one record from sample data.

use crate::core::schema::{FieldType, Schema, SchemaError};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::collections::HashMap;
use std::time::{Duration, Instant};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TestMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl TestMethod {
    fn as_method(&self) -> Method {
        match self {
            TestMethod::Get => Method::GET,
            TestMethod::Post => Method::POST,
            TestMethod::Put => Method::PUT,
            TestMethod::Delete => Method::DELETE,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TestMethod::Get => "GET",
            TestMethod::Post => "POST",
            TestMethod::Put => "PUT",
            TestMethod::Delete => "DELETE",
        }
    }
}

fn default_status() -> u16 {
    200
}

/// One request to send
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    pub method: TestMethod,
    /// Absolute URL
    pub endpoint: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, String>,
    #[serde(default = "default_status")]
    pub expected_status: u16,
    #[serde(default)]
    pub expected_fields: Vec<String>,
}

impl TestCase {
    fn label(&self) -> String {
        format!("{} {}", self.method.as_str(), self.endpoint)
    }
}

/// Input of a test run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiTestConfig {
    pub api_name: String,
    /// Schema document (tag or `{type}` entries)
    pub schema: Value,
    #[serde(default)]
    pub test_cases: Option<Vec<TestCase>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CaseResult {
    pub test: String,
    pub passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Summary of a test run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    pub success: bool,
    pub total_tests: usize,
    pub passed: usize,
    pub failed: usize,
    pub results: Vec<CaseResult>,
    /// Milliseconds
    pub execution_time: u64,
}

/// Sample record satisfying a schema
pub fn generate_sample_data(schema: &Schema) -> Map<String, Value> {
    schema
        .iter()
        .map(|(field, field_type)| {
            let value = match field_type {
                FieldType::String => json!(format!("sample_{}", field)),
                FieldType::Number => json!(123),
                FieldType::Boolean => json!(true),
                FieldType::Array => json!([]),
                FieldType::Object => json!({}),
            };
            (field.to_string(), value)
        })
        .collect()
}

/// List the API, then create a record from sample data
pub fn default_tests(base_url: &str, api_name: &str, schema: &Schema) -> Vec<TestCase> {
    let endpoint = format!("{}/api/{}", base_url.trim_end_matches('/'), api_name);
    vec![
        TestCase {
            method: TestMethod::Get,
            endpoint: endpoint.clone(),
            body: None,
            headers: HashMap::new(),
            expected_status: 200,
            expected_fields: Vec::new(),
        },
        TestCase {
            method: TestMethod::Post,
            endpoint,
            body: Some(Value::Object(generate_sample_data(schema))),
            headers: HashMap::new(),
            expected_status: 201,
            expected_fields: vec!["id".to_string()],
        },
    ]
}

/// HTTP runner for test cases
#[derive(Debug, Clone)]
pub struct ApiTestRunner {
    client: reqwest::Client,
    base_url: String,
}

impl ApiTestRunner {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Run the given cases, or the defaults for the API
    pub async fn test_api(&self, config: &ApiTestConfig) -> Result<TestResult, SchemaError> {
        let cases = match &config.test_cases {
            Some(cases) => cases.clone(),
            None => {
                let schema = Schema::from_value(&config.schema)?;
                default_tests(&self.base_url, &config.api_name, &schema)
            }
        };
        Ok(self.run_cases(&cases).await)
    }

    /// Run the default suite for an API
    pub async fn run_validation_suite(&self, api_name: &str, schema: &Schema) -> TestResult {
        let cases = default_tests(&self.base_url, api_name, schema);
        self.run_cases(&cases).await
    }

    pub async fn run_cases(&self, cases: &[TestCase]) -> TestResult {
        let started = Instant::now();
        let mut results = Vec::with_capacity(cases.len());

        for case in cases {
            let outcome = self.run_case(case).await;
            results.push(CaseResult {
                test: case.label(),
                passed: outcome.is_ok(),
                error: outcome.err(),
            });
        }

        let passed = results.iter().filter(|r| r.passed).count();
        let failed = results.len() - passed;
        tracing::info!(total = results.len(), passed, failed, "API tests finished");

        TestResult {
            success: failed == 0,
            total_tests: results.len(),
            passed,
            failed,
            results,
            execution_time: started.elapsed().as_millis() as u64,
        }
    }

    async fn run_case(&self, case: &TestCase) -> Result<(), String> {
        let mut request = self.client.request(case.method.as_method(), &case.endpoint);
        for (name, value) in &case.headers {
            request = request.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &case.body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| e.to_string())?;
        let status = response.status().as_u16();
        let body: Value = response.json().await.unwrap_or(Value::Null);

        if status != case.expected_status {
            return Err(format!(
                "Expected status {}, got {}",
                case.expected_status, status
            ));
        }

        let missing = missing_fields(&body, &case.expected_fields);
        if !missing.is_empty() {
            return Err(format!("Missing fields: {}", missing.join(", ")));
        }
        Ok(())
    }
}

/// Expected fields absent from the body and from its `data` object
fn missing_fields<'a>(body: &Value, expected: &'a [String]) -> Vec<&'a str> {
    let data = body.get("data").and_then(Value::as_object);
    expected
        .iter()
        .filter(|field| {
            body.get(field.as_str()).is_none()
                && data.is_none_or(|data| !data.contains_key(field.as_str()))
        })
        .map(String::as_str)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> Schema {
        Schema::from_value(&json!({
            "name": "string",
            "price": {"type": "number"},
            "inStock": "boolean",
            "tags": "array",
            "meta": "object"
        }))
        .unwrap()
    }

    #[test]
    fn test_generate_sample_data() {
        let data = generate_sample_data(&schema());
        assert_eq!(
            Value::Object(data),
            json!({
                "name": "sample_name",
                "price": 123,
                "inStock": true,
                "tags": [],
                "meta": {}
            })
        );
    }

    #[test]
    fn test_default_tests() {
        let tests = default_tests("http://localhost:3000/", "products", &schema());
        assert_eq!(tests.len(), 2);
        assert_eq!(tests[0].method, TestMethod::Get);
        assert_eq!(tests[0].endpoint, "http://localhost:3000/api/products");
        assert_eq!(tests[0].expected_status, 200);
        assert_eq!(tests[1].method, TestMethod::Post);
        assert_eq!(tests[1].expected_status, 201);
        assert_eq!(tests[1].expected_fields, vec!["id"]);
        assert!(tests[1].body.is_some());
    }

    #[test]
    fn test_case_defaults_when_deserialized() {
        let case: TestCase = serde_json::from_value(json!({
            "method": "DELETE",
            "endpoint": "http://localhost/api/x?id=1"
        }))
        .unwrap();
        assert_eq!(case.method, TestMethod::Delete);
        assert_eq!(case.expected_status, 200);
        assert!(case.expected_fields.is_empty());
    }

    #[test]
    fn test_missing_fields_looks_inside_data() {
        let expected = vec!["id".to_string(), "message".to_string(), "color".to_string()];
        let body = json!({"message": "ok", "data": {"id": "1"}});
        assert_eq!(missing_fields(&body, &expected), vec!["color"]);
        assert_eq!(missing_fields(&Value::Null, &expected[..1]), vec!["id"]);
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_fails_case() {
        let runner = ApiTestRunner::new("http://127.0.0.1:9");
        let cases = vec![TestCase {
            method: TestMethod::Get,
            endpoint: "http://127.0.0.1:9/api/nothing".to_string(),
            body: None,
            headers: HashMap::new(),
            expected_status: 200,
            expected_fields: Vec::new(),
        }];

        let result = runner.run_cases(&cases).await;
        assert!(!result.success);
        assert_eq!(result.failed, 1);
        assert_eq!(result.results[0].test, "GET http://127.0.0.1:9/api/nothing");
        assert!(result.results[0].error.is_some());
    }
}
