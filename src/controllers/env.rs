//! Environment view: fetched once per view, never polled.

use serde::Serialize;

use crate::api::system::EnvStatus;
use crate::client::{NetworkResult, ResourceClient};

/// Command line and environment of the inspected process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnvView {
    pub command_line: Vec<String>,
    /// Sorted by variable name.
    pub variables: Vec<(String, String)>,
}

impl From<EnvStatus> for EnvView {
    fn from(status: EnvStatus) -> Self {
        Self {
            command_line: status.command_line,
            variables: status.env.into_iter().collect(),
        }
    }
}

pub struct EnvController {
    client: ResourceClient,
    path: String,
}

impl EnvController {
    pub fn new(client: ResourceClient, path: &str) -> Self {
        Self {
            client,
            path: path.to_string(),
        }
    }

    pub async fn load(&self) -> NetworkResult<EnvView> {
        let status: EnvStatus = self.client.get(&self.path).await?;
        Ok(status.into())
    }
}
