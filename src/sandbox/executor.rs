//! Run code snippets in a child process
//!
//! Each run gets its own directory under the sandbox root holding
//! `code.js`. The interpreter runs with a cleared environment and is killed
//! when the timeout expires. The directory is removed however the run ends.
//!
//! This is process isolation only. [`validate_code`] screens for a few
//! obviously dangerous patterns and is not a security boundary.

use crate::config::SandboxConfig;
use rand::Rng;
use rand::distributions::Alphanumeric;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::OnceLock;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;

const DEFAULT_MEMORY_MB: u64 = 128;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Javascript,
    Typescript,
}

/// Input of a sandbox run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionConfig {
    pub code: String,

    /// Milliseconds; the sandbox default when absent
    #[serde(default)]
    pub timeout: Option<u64>,

    /// e.g. `128MB`; the sandbox default when absent
    #[serde(default)]
    pub memory_limit: Option<String>,

    /// Accepted for compatibility; the child is not network-restricted
    #[serde(default)]
    pub allow_network: bool,

    #[serde(default)]
    pub language: Language,
}

impl ExecutionConfig {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            timeout: None,
            memory_limit: None,
            allow_network: false,
            language: Language::Javascript,
        }
    }

    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout = Some(timeout_ms);
        self
    }
}

/// Outcome of a sandbox run
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Milliseconds
    pub execution_time: u64,
    pub timed_out: bool,
}

/// Result of the static code screen
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CodeCheck {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Error)]
pub enum SandboxError {
    #[error("failed to prepare sandbox directory {path}: {source}")]
    Prepare {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to start {interpreter}: {source}")]
    Spawn {
        interpreter: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to wait for child process: {0}")]
    Wait(#[source] std::io::Error),
}

/// Output of a finished child process
struct ChildOutput {
    stdout: String,
    stderr: String,
    success: bool,
    timed_out: bool,
}

/// Sandbox settings shared by all runs
#[derive(Debug, Clone)]
pub struct Sandbox {
    interpreter: String,
    root_dir: PathBuf,
    default_timeout_ms: u64,
    default_memory: String,
}

impl Sandbox {
    pub fn new(config: &SandboxConfig) -> Self {
        Self {
            interpreter: config.interpreter.clone(),
            root_dir: config.root_dir.clone(),
            default_timeout_ms: config.default_timeout_ms,
            default_memory: config.default_memory.clone(),
        }
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// Requested timeout, or the default when it is missing or zero
    fn timeout_ms(&self, config: &ExecutionConfig) -> u64 {
        config
            .timeout
            .filter(|&ms| ms > 0)
            .unwrap_or(self.default_timeout_ms)
    }

    /// Run a snippet and report the outcome
    ///
    /// Failures to set up or start the child are reported in the result,
    /// never as an error.
    pub async fn execute(&self, config: &ExecutionConfig) -> ExecutionResult {
        let started = Instant::now();
        let timeout_ms = self.timeout_ms(config);
        let memory = config
            .memory_limit
            .as_deref()
            .unwrap_or(&self.default_memory);
        let run_dir = self.root_dir.join(run_id());

        let outcome = self
            .run_in(&run_dir, &config.code, timeout_ms, parse_memory_mb(memory))
            .await;
        cleanup(&run_dir).await;

        let execution_time = started.elapsed().as_millis() as u64;
        match outcome {
            Ok(output) => {
                tracing::debug!(
                    success = output.success,
                    timed_out = output.timed_out,
                    execution_time,
                    "sandbox run finished"
                );
                ExecutionResult {
                    success: output.success && !output.timed_out,
                    output: Some(output.stdout),
                    error: Some(output.stderr).filter(|s| !s.is_empty()),
                    execution_time,
                    timed_out: output.timed_out,
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "sandbox run failed");
                ExecutionResult {
                    success: false,
                    output: None,
                    error: Some(e.to_string()),
                    execution_time,
                    timed_out: false,
                }
            }
        }
    }

    async fn run_in(
        &self,
        run_dir: &Path,
        code: &str,
        timeout_ms: u64,
        memory_mb: u64,
    ) -> Result<ChildOutput, SandboxError> {
        let prepare = |source| SandboxError::Prepare {
            path: run_dir.to_path_buf(),
            source,
        };
        tokio::fs::create_dir_all(run_dir).await.map_err(prepare)?;
        let code_file = run_dir.join("code.js");
        tokio::fs::write(&code_file, code).await.map_err(prepare)?;

        let mut child = Command::new(&self.interpreter)
            .arg(format!("--max-old-space-size={}", memory_mb))
            .arg(&code_file)
            .current_dir(run_dir)
            .env_clear()
            .env("NODE_ENV", "sandbox")
            .env("PATH", std::env::var_os("PATH").unwrap_or_default())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| SandboxError::Spawn {
                interpreter: self.interpreter.clone(),
                source,
            })?;

        let stdout = tokio::spawn(read_all(child.stdout.take()));
        let stderr = tokio::spawn(read_all(child.stderr.take()));

        let (success, timed_out) =
            match tokio::time::timeout(Duration::from_millis(timeout_ms), child.wait()).await {
                Ok(status) => (status.map_err(SandboxError::Wait)?.success(), false),
                Err(_) => {
                    if let Err(e) = child.kill().await {
                        tracing::warn!(error = %e, "failed to kill timed out child");
                    }
                    (false, true)
                }
            };

        Ok(ChildOutput {
            stdout: stdout.await.unwrap_or_default(),
            stderr: stderr.await.unwrap_or_default(),
            success,
            timed_out,
        })
    }
}

impl Default for Sandbox {
    fn default() -> Self {
        Self::new(&SandboxConfig::default())
    }
}

async fn read_all<R: AsyncRead + Unpin>(reader: Option<R>) -> String {
    let mut buf = Vec::new();
    if let Some(mut reader) = reader {
        let _ = reader.read_to_end(&mut buf).await;
    }
    String::from_utf8_lossy(&buf).into_owned()
}

async fn cleanup(dir: &Path) {
    if let Err(e) = tokio::fs::remove_dir_all(dir).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!(path = %dir.display(), error = %e, "failed to clean up sandbox directory");
        }
    }
}

fn run_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(10)
        .map(char::from)
        .collect()
}

/// `"128MB"` → 128; digits only, falling back to 128
pub fn parse_memory_mb(limit: &str) -> u64 {
    let digits: String = limit.chars().filter(char::is_ascii_digit).collect();
    digits
        .parse::<u64>()
        .ok()
        .filter(|mb| *mb > 0)
        .unwrap_or(DEFAULT_MEMORY_MB)
}

/// Screen code for obviously dangerous patterns
pub fn validate_code(code: &str) -> CodeCheck {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    let patterns = PATTERNS.get_or_init(|| {
        [
            r#"require\s*\(\s*['"]child_process['"]\s*\)"#,
            r#"require\s*\(\s*['"]fs['"]\s*\)"#,
            r"process\.exit",
            r"eval\s*\(",
            r"Function\s*\(",
        ]
        .iter()
        .filter_map(|p| Regex::new(p).ok())
        .collect()
    });

    match patterns.iter().find(|p| p.is_match(code)) {
        Some(pattern) => CodeCheck {
            valid: false,
            reason: Some(format!(
                "Code contains potentially dangerous pattern: {}",
                pattern.as_str()
            )),
        },
        None => CodeCheck {
            valid: true,
            reason: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sandbox_in(root: &Path, interpreter: &str) -> Sandbox {
        Sandbox::new(&SandboxConfig {
            interpreter: interpreter.to_string(),
            root_dir: root.to_path_buf(),
            default_timeout_ms: 5000,
            default_memory: "128MB".to_string(),
        })
    }

    #[test]
    fn test_parse_memory_mb() {
        assert_eq!(parse_memory_mb("128MB"), 128);
        assert_eq!(parse_memory_mb("256"), 256);
        assert_eq!(parse_memory_mb("lots"), 128);
        assert_eq!(parse_memory_mb("0MB"), 128);
    }

    #[test]
    fn test_validate_code_flags_dangerous_patterns() {
        for code in [
            "const cp = require('child_process')",
            "const fs = require(\"fs\")",
            "process.exit(1)",
            "eval ('2+2')",
            "new Function('return 1')",
        ] {
            let check = validate_code(code);
            assert!(!check.valid, "{code}");
            assert!(
                check
                    .reason
                    .unwrap()
                    .starts_with("Code contains potentially dangerous pattern:")
            );
        }
    }

    #[test]
    fn test_validate_code_accepts_plain_code() {
        let check = validate_code("const total = [1, 2, 3].reduce((a, b) => a + b, 0);\nconsole.log(total);");
        assert!(check.valid);
        assert!(check.reason.is_none());
    }

    #[test]
    fn test_execution_config_defaults() {
        let config: ExecutionConfig =
            serde_json::from_value(serde_json::json!({"code": "1"})).unwrap();
        assert!(config.timeout.is_none());
        assert!(!config.allow_network);
        assert_eq!(config.language, Language::Javascript);
    }

    #[test]
    fn test_zero_timeout_uses_default() {
        let root = tempfile::tempdir().unwrap();
        let sandbox = sandbox_in(root.path(), "node");

        assert_eq!(sandbox.timeout_ms(&ExecutionConfig::new("").with_timeout(0)), 5000);
        assert_eq!(sandbox.timeout_ms(&ExecutionConfig::new("")), 5000);
        assert_eq!(sandbox.timeout_ms(&ExecutionConfig::new("").with_timeout(250)), 250);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_zero_timeout_does_not_kill_child() {
        let bin = tempfile::tempdir().unwrap();
        let root = tempfile::tempdir().unwrap();
        let interpreter = script(bin.path(), "quick-node", "sleep 0.1; echo done");
        let sandbox = sandbox_in(root.path(), &interpreter);

        let result = sandbox
            .execute(&ExecutionConfig::new("").with_timeout(0))
            .await;

        assert!(!result.timed_out);
        assert!(result.success, "{:?}", result);
        assert_eq!(result.output.as_deref().map(str::trim), Some("done"));
    }

    #[tokio::test]
    async fn test_missing_interpreter_is_reported() {
        let root = tempfile::tempdir().unwrap();
        let sandbox = sandbox_in(root.path(), "dynapi-no-such-interpreter");

        let result = sandbox.execute(&ExecutionConfig::new("console.log(1)")).await;

        assert!(!result.success);
        assert!(!result.timed_out);
        assert!(result.error.unwrap().contains("dynapi-no-such-interpreter"));
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[cfg(unix)]
    fn script(dir: &Path, name: &str, body: &str) -> String {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_output_collected_and_dir_removed() {
        let bin = tempfile::tempdir().unwrap();
        let root = tempfile::tempdir().unwrap();
        // $1 is the memory flag, $2 the code file
        let interpreter = script(bin.path(), "fake-node", r#"cat "$2"; echo "$NODE_ENV" >&2"#);
        let sandbox = sandbox_in(root.path(), &interpreter);

        let result = sandbox.execute(&ExecutionConfig::new("hello sandbox")).await;

        assert!(result.success, "{:?}", result);
        assert_eq!(result.output.as_deref(), Some("hello sandbox"));
        assert_eq!(result.error.as_deref().map(str::trim), Some("sandbox"));
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_nonzero_exit_is_failure() {
        let bin = tempfile::tempdir().unwrap();
        let root = tempfile::tempdir().unwrap();
        let interpreter = script(bin.path(), "failing-node", "echo boom >&2; exit 3");
        let sandbox = sandbox_in(root.path(), &interpreter);

        let result = sandbox.execute(&ExecutionConfig::new("")).await;

        assert!(!result.success);
        assert!(!result.timed_out);
        assert_eq!(result.error.as_deref().map(str::trim), Some("boom"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout_kills_child() {
        let bin = tempfile::tempdir().unwrap();
        let root = tempfile::tempdir().unwrap();
        let interpreter = script(bin.path(), "slow-node", "exec sleep 10");
        let sandbox = sandbox_in(root.path(), &interpreter);

        let result = sandbox
            .execute(&ExecutionConfig::new("").with_timeout(200))
            .await;

        assert!(result.timed_out);
        assert!(!result.success);
        assert!(result.execution_time < 5000);
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }
}
