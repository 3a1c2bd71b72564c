//! Request failure taxonomy.
//!
//! Transport failures, non-2xx statuses and undecodable bodies are all the
//! same `NetworkError` to callers. The cause is kept for logs and metrics only.

use thiserror::Error;
use uuid::Uuid;

/// Why a request failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FailureCause {
    /// The server could not be reached, or the request timed out.
    #[error("transport error: {0}")]
    Transport(String),

    /// The server answered with a status outside 2xx. The body is never parsed.
    #[error("server returned {status}")]
    Server { status: u16 },

    /// A 2xx response whose body is not the expected JSON.
    #[error("malformed response body: {0}")]
    Decode(String),
}

impl FailureCause {
    /// Short label used for metrics.
    pub fn label(&self) -> &'static str {
        match self {
            FailureCause::Transport(_) => "transport",
            FailureCause::Server { .. } => "server",
            FailureCause::Decode(_) => "decode",
        }
    }
}

/// A failed Resource Client call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{method} {url} failed ({request_id}): {cause}")]
pub struct NetworkError {
    pub method: String,
    pub url: String,
    pub request_id: Uuid,
    #[source]
    pub cause: FailureCause,
}

impl NetworkError {
    pub fn new(method: &str, url: impl Into<String>, request_id: Uuid, cause: FailureCause) -> Self {
        Self {
            method: method.to_string(),
            url: url.into(),
            request_id,
            cause,
        }
    }
}

/// Result type for Resource Client operations.
pub type NetworkResult<T> = Result<T, NetworkError>;
