//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (intervals and timeouts > 0)
//! - Check the base URL and endpoint paths are usable for request building
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ConsoleConfig → Result<(), Vec<ValidationError>>

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::ConsoleConfig;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("server.base_url '{0}' is not a valid http(s) URL")]
    InvalidBaseUrl(String),

    #[error("{field} must be greater than zero")]
    ZeroDuration { field: &'static str },

    #[error("endpoints.{name} '{path}' must start with '/'")]
    RelativeEndpoint { name: &'static str, path: String },

    #[error("observability.metrics_address '{0}' is not a socket address")]
    InvalidMetricsAddress(String),
}

/// Validate a parsed configuration.
pub fn validate_config(config: &ConsoleConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    match Url::parse(&config.server.base_url) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => {}
        _ => errors.push(ValidationError::InvalidBaseUrl(config.server.base_url.clone())),
    }

    for (field, value) in [
        ("server.request_timeout_ms", config.server.request_timeout_ms),
        ("sync.poll_interval_ms", config.sync.poll_interval_ms),
        ("sync.recovery_ms", config.sync.recovery_ms),
    ] {
        if value == 0 {
            errors.push(ValidationError::ZeroDuration { field });
        }
    }

    for (name, path) in config.endpoints.entries() {
        if !path.starts_with('/') {
            errors.push(ValidationError::RelativeEndpoint {
                name,
                path: path.to_string(),
            });
        }
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
