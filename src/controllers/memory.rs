//! Memory controller: polled runtime memory stats and allocation pressure.

use std::time::Duration;

use reqwest::Method;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::api::system::{MemStats, MemoryStatus};
use crate::client::{NetworkResult, ResourceClient};
use crate::sync::{PollSession, Resource, SyncedResource};

/// Allocation size offered by the console.
pub const DEFAULT_ALLOC_BYTES: u64 = 500 * 1024 * 1024;

/// Render a byte count with binary units, e.g. `500.00 MiB`.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 6] = ["B", "KiB", "MiB", "GiB", "TiB", "PiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.2} {}", UNITS[unit])
}

/// One line of the memory table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemoryRow {
    pub key: &'static str,
    pub bytes: u64,
    pub display: String,
}

impl MemoryRow {
    fn new(key: &'static str, bytes: u64) -> Self {
        Self {
            key,
            bytes,
            display: format_bytes(bytes),
        }
    }
}

/// Heap in use, heap retained but not returned to the OS, stacks, and their total.
pub fn summarize(stats: &MemStats) -> Vec<MemoryRow> {
    let retained = stats.heap_idle.saturating_sub(stats.heap_released);
    let total = stats
        .heap_alloc
        .saturating_add(retained)
        .saturating_add(stats.stack_inuse);
    vec![
        MemoryRow::new("HeapAlloc", stats.heap_alloc),
        MemoryRow::new("HeapIdle - HeapReleased", retained),
        MemoryRow::new("StackInuse", stats.stack_inuse),
        MemoryRow::new("Total", total),
    ]
}

pub struct MemoryResource {
    client: ResourceClient,
    path: String,
}

impl Resource for MemoryResource {
    type State = MemStats;

    fn name(&self) -> &str {
        "memory"
    }

    async fn fetch(&self) -> NetworkResult<MemStats> {
        let status: MemoryStatus = self.client.get(&self.path).await?;
        Ok(status.mem_stats)
    }
}

pub struct MemoryController {
    client: ResourceClient,
    path: String,
    synced: SyncedResource<MemoryResource>,
}

impl MemoryController {
    pub fn new(client: ResourceClient, path: &str, interval: Duration, shutdown: CancellationToken) -> Self {
        let path = path.trim_end_matches('/').to_string();
        let resource = MemoryResource {
            client: client.clone(),
            path: path.clone(),
        };
        Self {
            client,
            path,
            synced: SyncedResource::new(resource, interval, shutdown),
        }
    }

    pub fn synced(&self) -> &SyncedResource<MemoryResource> {
        &self.synced
    }

    pub fn subscribe<F>(&self, on_update: F) -> PollSession
    where
        F: FnMut(&MemStats) + Send + 'static,
    {
        self.synced.subscribe(on_update)
    }

    pub async fn refresh(&self) -> NetworkResult<MemStats> {
        self.synced.refresh().await
    }

    pub fn rows(&self) -> Option<Vec<MemoryRow>> {
        self.synced.store().state().map(|stats| summarize(&stats))
    }

    /// Ask the server to allocate and hold `bytes`.
    pub async fn allocate(&self, bytes: u64) -> NetworkResult<()> {
        tracing::info!(bytes, "Requesting server allocation");
        self.client
            .send_empty(Method::POST, &format!("{}/alloc?size={bytes}", self.path))
            .await
    }

    /// Ask the server to release everything it was asked to hold.
    pub async fn clear(&self) -> NetworkResult<()> {
        tracing::info!("Requesting server memory release");
        self.client
            .send_empty(Method::POST, &format!("{}/clear", self.path))
            .await
    }
}
