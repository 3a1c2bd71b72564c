//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the console.
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the diagnostic console.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Target server settings.
    pub server: ServerConfig,

    /// Polling and connectivity timing.
    pub sync: SyncConfig,

    /// Paths of the individual diagnostic endpoints.
    pub endpoints: EndpointConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Target server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Base URL of the inspected server (e.g., "http://localhost:8080").
    pub base_url: String,

    /// Per-request timeout in milliseconds. A timed-out request is a transport failure.
    pub request_timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            request_timeout_ms: 5000,
        }
    }
}

impl ServerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Polling and connection-recovery timing.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Interval between two poll ticks of the same resource.
    pub poll_interval_ms: u64,

    /// Quiet period after the last failure before the console reports connected again.
    pub recovery_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1000,
            recovery_ms: 2000,
        }
    }
}

impl SyncConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn recovery(&self) -> Duration {
        Duration::from_millis(self.recovery_ms)
    }
}

/// Endpoint paths, relative to `server.base_url`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EndpointConfig {
    /// Liveness probe base (its API lives under `<liveness>/api`).
    pub liveness: String,

    /// Readiness probe base.
    pub readiness: String,

    /// Key generation workload.
    pub workload: String,

    /// Message queue server base (stats at `<queue>/stats`).
    pub queue: String,

    /// Memory statistics API.
    pub memory: String,

    /// Environment API.
    pub env: String,

    /// DNS query API.
    pub dns: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            liveness: "/healthy".to_string(),
            readiness: "/ready".to_string(),
            workload: "/keygen".to_string(),
            queue: "/memq/server".to_string(),
            memory: "/mem/api".to_string(),
            env: "/env/api".to_string(),
            dns: "/dns/api".to_string(),
        }
    }
}

impl EndpointConfig {
    /// All endpoint paths with their config key, for validation and logging.
    pub fn entries(&self) -> [(&'static str, &str); 7] {
        [
            ("liveness", self.liveness.as_str()),
            ("readiness", self.readiness.as_str()),
            ("workload", self.workload.as_str()),
            ("queue", self.queue.as_str()),
            ("memory", self.memory.as_str()),
            ("env", self.env.as_str()),
            ("dns", self.dns.as_str()),
        ]
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Pretty,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log line format.
    pub log_format: LogFormat,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Compact,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9091".to_string(),
        }
    }
}
