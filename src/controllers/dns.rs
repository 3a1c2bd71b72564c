//! Server-side DNS query.

use reqwest::Method;

use crate::api::system::{DnsQuery, DnsResponse};
use crate::client::{NetworkResult, ResourceClient};

pub struct DnsController {
    client: ResourceClient,
    path: String,
}

impl DnsController {
    pub fn new(client: ResourceClient, path: &str) -> Self {
        Self {
            client,
            path: path.to_string(),
        }
    }

    /// Resolve `name` on the server. The result is the resolver's text dump.
    pub async fn query(&self, query: &DnsQuery) -> NetworkResult<DnsResponse> {
        tracing::debug!(record_type = %query.record_type, name = %query.name, "DNS query");
        self.client.send(Method::POST, &self.path, query).await
    }
}
