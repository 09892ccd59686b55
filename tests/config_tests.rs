//! Configuration loading from YAML files

use dynapi::config::ServerConfig;
use std::io::Write;
use tempfile::NamedTempFile;

fn write_config(yaml: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(yaml.as_bytes()).expect("Failed to write config");
    file
}

#[test]
fn test_load_full_config_file() {
    let file = write_config(
        r#"
server:
  bind: "0.0.0.0:8080"
  agent_role: "catalog-builder"
  environment: "production"
keys:
  default_usage_limit: 500
pagination:
  default_limit: 20
  max_limit: 50
sandbox:
  interpreter: "/usr/local/bin/node"
  root_dir: "/var/tmp/dynapi"
  default_timeout_ms: 2000
  default_memory: "64MB"
test_runner:
  base_url: "http://localhost:8080"
"#,
    );

    let config = ServerConfig::from_yaml_file(file.path()).unwrap();
    assert_eq!(config.bind_addr().unwrap().port(), 8080);
    assert_eq!(config.server.agent_role, "catalog-builder");
    assert_eq!(config.keys.default_usage_limit, 500);
    assert_eq!(config.pagination.default_limit, 20);
    assert_eq!(config.pagination.max_limit, 50);
    assert_eq!(config.sandbox.interpreter, "/usr/local/bin/node");
    assert_eq!(config.sandbox.root_dir.to_str(), Some("/var/tmp/dynapi"));
    assert_eq!(config.sandbox.default_timeout_ms, 2000);
    assert_eq!(config.test_runner.base_url, "http://localhost:8080");
}

#[test]
fn test_empty_file_gives_defaults() {
    let file = write_config("");
    let config = ServerConfig::from_yaml_file(file.path()).unwrap();
    assert_eq!(config.server.bind, "127.0.0.1:3000");
    assert_eq!(config.server.environment, "development");
}

#[test]
fn test_missing_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = ServerConfig::from_yaml_file(dir.path().join("absent.yaml")).unwrap_err();
    assert!(err.to_string().contains("Failed to read"));
}

#[test]
fn test_malformed_yaml_is_an_error() {
    let file = write_config("server: [not, a, map");
    assert!(ServerConfig::from_yaml_file(file.path()).is_err());
}

#[test]
fn test_invalid_base_url_is_rejected() {
    let file = write_config("test_runner:\n  base_url: \"not a url\"\n");
    let err = ServerConfig::from_yaml_file(file.path()).unwrap_err();
    assert!(err.to_string().contains("Invalid configuration"));
}
