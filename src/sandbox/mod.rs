//! Code execution sandbox and API smoke-test runner

pub mod executor;
pub mod test_runner;

pub use executor::{CodeCheck, ExecutionConfig, ExecutionResult, Language, Sandbox, SandboxError, validate_code};
pub use test_runner::{
    ApiTestConfig, ApiTestRunner, CaseResult, TestCase, TestMethod, TestResult, default_tests,
    generate_sample_data,
};
