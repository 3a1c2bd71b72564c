//! Message queue API under `<queue>`: stats and queue operations.

use serde::{Deserialize, Serialize};

use super::null_as_default;

/// Response of `GET <queue>/stats`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStats {
    #[serde(default)]
    pub kind: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub queues: Vec<QueueStat>,
}

/// Counters of one queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStat {
    pub name: String,
    pub depth: u64,
    pub enqueued: u64,
    pub dequeued: u64,
    pub drained: u64,
}

/// A queued message, returned by enqueue and dequeue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub kind: String,
    pub id: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub created: String,
}
