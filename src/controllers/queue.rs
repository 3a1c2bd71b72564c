//! Queue monitor: polled stats plus queue operations.

use std::time::Duration;

use reqwest::Method;
use tokio_util::sync::CancellationToken;

use crate::api::queue::{Message, QueueStat, QueueStats};
use crate::client::{NetworkResult, ResourceClient};
use crate::sync::{PollSession, Resource, SyncedResource};

/// Percent-encode a queue name for use as one path segment.
fn encode_segment(name: &str) -> String {
    url::form_urlencoded::byte_serialize(name.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

/// `<queue>/stats`, sorted by queue name on decode.
pub struct QueueResource {
    client: ResourceClient,
    stats_path: String,
}

impl Resource for QueueResource {
    type State = QueueStats;

    fn name(&self) -> &str {
        "queue"
    }

    async fn fetch(&self) -> NetworkResult<QueueStats> {
        let mut stats: QueueStats = self.client.get(&self.stats_path).await?;
        stats.queues.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(stats)
    }
}

pub struct QueueMonitor {
    client: ResourceClient,
    base_path: String,
    synced: SyncedResource<QueueResource>,
}

impl QueueMonitor {
    pub fn new(client: ResourceClient, base_path: &str, interval: Duration, shutdown: CancellationToken) -> Self {
        let base_path = base_path.trim_end_matches('/').to_string();
        let resource = QueueResource {
            client: client.clone(),
            stats_path: format!("{base_path}/stats"),
        };
        Self {
            client,
            base_path,
            synced: SyncedResource::new(resource, interval, shutdown),
        }
    }

    pub fn synced(&self) -> &SyncedResource<QueueResource> {
        &self.synced
    }

    pub fn subscribe<F>(&self, on_update: F) -> PollSession
    where
        F: FnMut(&QueueStats) + Send + 'static,
    {
        self.synced.subscribe(on_update)
    }

    pub async fn refresh(&self) -> NetworkResult<QueueStats> {
        self.synced.refresh().await
    }

    /// Queues in name order; empty until the first successful fetch.
    pub fn queues(&self) -> Vec<QueueStat> {
        self.synced
            .store()
            .state()
            .map(|stats| stats.queues)
            .unwrap_or_default()
    }

    fn queue_path(&self, queue: &str, action: Option<&str>) -> String {
        let mut path = format!("{}/queues/{}", self.base_path, encode_segment(queue));
        if let Some(action) = action {
            path.push('/');
            path.push_str(action);
        }
        path
    }

    /// Stats are re-read after every successful operation. A failed re-read is
    /// already reported and recorded; the operation itself still succeeded.
    async fn refresh_after(&self, operation: &str, queue: &str) {
        tracing::info!(operation, queue, "Queue operation completed");
        let _ = self.synced.refresh().await;
    }

    pub async fn create(&self, queue: &str) -> NetworkResult<()> {
        self.client.send_empty(Method::PUT, &self.queue_path(queue, None)).await?;
        self.refresh_after("create", queue).await;
        Ok(())
    }

    pub async fn delete(&self, queue: &str) -> NetworkResult<()> {
        self.client
            .send_empty(Method::DELETE, &self.queue_path(queue, None))
            .await?;
        self.refresh_after("delete", queue).await;
        Ok(())
    }

    pub async fn drain(&self, queue: &str) -> NetworkResult<()> {
        self.client
            .send_empty(Method::POST, &self.queue_path(queue, Some("drain")))
            .await?;
        self.refresh_after("drain", queue).await;
        Ok(())
    }

    pub async fn enqueue(&self, queue: &str, body: &str) -> NetworkResult<Message> {
        let message = self
            .client
            .send_text(Method::POST, &self.queue_path(queue, Some("enqueue")), body)
            .await?;
        self.refresh_after("enqueue", queue).await;
        Ok(message)
    }

    /// `None` when the queue is empty (204 No Content).
    pub async fn dequeue(&self, queue: &str) -> NetworkResult<Option<Message>> {
        let message = self
            .client
            .send_optional::<(), Message>(Method::POST, &self.queue_path(queue, Some("dequeue")), None)
            .await?;
        self.refresh_after("dequeue", queue).await;
        Ok(message)
    }
}
