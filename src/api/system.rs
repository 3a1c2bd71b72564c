//! Memory, environment and DNS endpoints.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::null_as_default;

/// Response of `GET <memory>`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryStatus {
    pub mem_stats: MemStats,
}

/// The subset of the server's runtime memory statistics the console shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MemStats {
    #[serde(default)]
    pub heap_alloc: u64,
    #[serde(default)]
    pub heap_idle: u64,
    #[serde(default)]
    pub heap_released: u64,
    #[serde(default)]
    pub stack_inuse: u64,
}

/// Response of `GET <env>`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvStatus {
    #[serde(default, deserialize_with = "null_as_default")]
    pub command_line: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub env: BTreeMap<String, String>,
}

/// Body of `POST <dns>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsQuery {
    #[serde(rename = "type")]
    pub record_type: String,
    pub name: String,
}

impl Default for DnsQuery {
    fn default() -> Self {
        Self {
            record_type: "A".to_string(),
            name: String::new(),
        }
    }
}

/// Response of `POST <dns>`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsResponse {
    #[serde(default)]
    pub result: String,
}
