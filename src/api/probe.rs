//! Probe failure-injection API: `GET|PUT <probe>/api`.

use serde::{Deserialize, Serialize};

use super::null_as_default;

/// Combined probe state as returned by GET (and by PUT on servers that echo it).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeStatus {
    #[serde(default)]
    pub probe_path: String,
    /// 0: succeeding; > 0: failing for that many more checks; < 0: failing permanently.
    pub fail_next: i64,
    /// In server order; never reordered by the console.
    #[serde(default, deserialize_with = "null_as_default")]
    pub history: Vec<ProbeHistoryEntry>,
}

/// One recorded probe invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeHistoryEntry {
    #[serde(default)]
    pub id: u64,
    pub when: String,
    #[serde(rename = "relWhen")]
    pub relative_when: String,
    pub code: u16,
}

/// Body of `PUT <probe>/api`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeConfigRequest {
    pub fail_next: i64,
}
