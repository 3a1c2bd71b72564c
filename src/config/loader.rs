//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::ConsoleConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ConsoleConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Build the effective configuration of a binary: the file at `path` (or the
/// defaults), then `base_url` from the command line if given, validated last.
pub fn resolve_config(path: Option<&Path>, base_url: Option<&str>) -> Result<ConsoleConfig, ConfigError> {
    let mut config = match path {
        Some(path) => load_config(path)?,
        None => ConsoleConfig::default(),
    };
    if let Some(base_url) = base_url {
        config.server.base_url = base_url.to_string();
    }

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<ConsoleConfig, ConfigError> {
    let config: ConsoleConfig = toml::from_str(content)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_temp(content: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("diag-console-{}.toml", uuid::Uuid::new_v4()));
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_file_base_url_used_without_override() {
        let path = write_temp("[server]\nbase_url = \"http://127.0.0.1:9\"\n");
        let config = resolve_config(Some(path.as_path()), None).unwrap();
        fs::remove_file(&path).unwrap();

        assert_eq!(config.server.base_url, "http://127.0.0.1:9");
    }

    #[test]
    fn test_base_url_override_wins_over_file() {
        let path = write_temp("[server]\nbase_url = \"http://127.0.0.1:9\"\nrequest_timeout_ms = 750\n");
        let config = resolve_config(Some(path.as_path()), Some("http://10.1.2.3:8080")).unwrap();
        fs::remove_file(&path).unwrap();

        assert_eq!(config.server.base_url, "http://10.1.2.3:8080");
        assert_eq!(config.server.request_timeout_ms, 750);
    }

    #[test]
    fn test_base_url_override_is_validated() {
        let err = resolve_config(None, Some("not a url")).unwrap_err();
        match err {
            ConfigError::Validation(errors) => {
                assert_eq!(errors, vec![ValidationError::InvalidBaseUrl("not a url".into())]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_defaults_without_file_or_override() {
        let config = resolve_config(None, None).unwrap();
        assert_eq!(config.server.base_url, "http://localhost:8080");
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_config(Path::new("/nonexistent/console.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_validation_errors_are_joined() {
        let err = parse_config(
            r#"
            [sync]
            poll_interval_ms = 0
            recovery_ms = 0
            "#,
        )
        .unwrap_err();

        let message = err.to_string();
        assert!(message.starts_with("Validation failed: "));
        assert!(message.contains("sync.poll_interval_ms"));
        assert!(message.contains("sync.recovery_ms"));
    }

    #[test]
    fn test_sample_config_is_valid() {
        let config = parse_config(include_str!("../../console.toml")).unwrap();
        assert_eq!(config.sync.recovery_ms, 2000);
        assert_eq!(config.endpoints.readiness, "/ready");
    }

    #[test]
    fn test_bad_toml_is_parse_error() {
        let err = parse_config("[server\nbase_url = 1").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
