//! Key generation workload API: `GET|PUT <workload>`.

use serde::{Deserialize, Serialize};

use super::null_as_default;

/// Workload parameters. Replaced wholesale by every GET/PUT response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkloadConfig {
    #[serde(rename = "enable")]
    pub enabled: bool,
    /// Keys to generate; 0 means no limit.
    #[serde(rename = "numToGen")]
    pub num_to_generate: u64,
    /// Target run time in seconds; 0 means no limit.
    #[serde(rename = "timeToRun")]
    pub time_to_run_secs: u64,
    pub exit_on_complete: bool,
    pub exit_code: i32,
    /// Queue server to draw work items from, if any.
    #[serde(rename = "memQServer", default, skip_serializing_if = "String::is_empty")]
    pub memq_server: String,
    #[serde(rename = "memQQueue", default, skip_serializing_if = "String::is_empty")]
    pub memq_queue: String,
}

/// One generated key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyRecord {
    pub id: u64,
    pub data: String,
}

/// Response of GET and PUT.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkloadStatus {
    pub config: WorkloadConfig,
    #[serde(default, deserialize_with = "null_as_default")]
    pub history: Vec<KeyRecord>,
}
