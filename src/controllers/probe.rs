//! Probe controller: failure-injection state of a liveness or readiness probe.
//!
//! # States
//! ```text
//! failNext == 0  → Succeeding
//! failNext  > 0  → Failing { remaining: failNext }   (server decrements per check)
//! failNext  < 0  → FailingPermanent
//! ```
//!
//! # Design Decisions
//! - The console never predicts `failNext`; it shows what the server confirmed
//! - Only a fixed menu of injections can be configured
//! - History is kept in server order; only the view reverses it

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use reqwest::Method;
use serde::Serialize;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::api::probe::{ProbeConfigRequest, ProbeHistoryEntry, ProbeStatus};
use crate::client::{NetworkResult, ResourceClient};
use crate::sync::{Mutable, PollSession, Resource, SyncedResource};

/// Positive fail counts offered to the operator.
pub const FAIL_COUNT_MENU: [u32; 5] = [1, 2, 3, 5, 10];

/// Classification of a probe's `failNext` counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "kebab-case")]
pub enum ProbeMode {
    Succeeding,
    Failing { remaining: u64 },
    FailingPermanent,
}

impl ProbeMode {
    pub fn from_fail_next(fail_next: i64) -> Self {
        match fail_next {
            0 => ProbeMode::Succeeding,
            n if n > 0 => ProbeMode::Failing {
                remaining: n.unsigned_abs(),
            },
            _ => ProbeMode::FailingPermanent,
        }
    }

    pub fn describe(self) -> String {
        match self {
            ProbeMode::Succeeding => "Probe will permanently succeed".to_string(),
            ProbeMode::Failing { remaining } => format!("Probe will fail for next {remaining} calls"),
            ProbeMode::FailingPermanent => "Probe will permanently fail".to_string(),
        }
    }
}

/// An operator-selectable failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureInjection {
    Succeed,
    Fail,
    FailNext(u32),
}

#[derive(Debug, Error)]
pub enum ConfigureError {
    #[error("unsupported failure injection '{0}': expected succeed, fail, or one of 1, 2, 3, 5, 10")]
    Unsupported(String),
}

impl FailureInjection {
    /// Every injection the console offers, in menu order.
    pub fn menu() -> Vec<FailureInjection> {
        let mut menu = vec![FailureInjection::Succeed, FailureInjection::Fail];
        menu.extend(FAIL_COUNT_MENU.iter().map(|&n| FailureInjection::FailNext(n)));
        menu
    }

    /// The `failNext` value written to the server.
    pub fn fail_next(self) -> i64 {
        match self {
            FailureInjection::Succeed => 0,
            FailureInjection::Fail => -1,
            FailureInjection::FailNext(n) => i64::from(n),
        }
    }
}

impl TryFrom<i64> for FailureInjection {
    type Error = ConfigureError;

    fn try_from(fail_next: i64) -> Result<Self, Self::Error> {
        match fail_next {
            0 => Ok(FailureInjection::Succeed),
            -1 => Ok(FailureInjection::Fail),
            n => FAIL_COUNT_MENU
                .iter()
                .find(|&&allowed| i64::from(allowed) == n)
                .map(|&allowed| FailureInjection::FailNext(allowed))
                .ok_or_else(|| ConfigureError::Unsupported(n.to_string())),
        }
    }
}

impl FromStr for FailureInjection {
    type Err = ConfigureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "succeed" => Ok(FailureInjection::Succeed),
            "fail" => Ok(FailureInjection::Fail),
            other => other
                .parse::<i64>()
                .map_err(|_| ConfigureError::Unsupported(s.to_string()))
                .and_then(FailureInjection::try_from),
        }
    }
}

impl fmt::Display for FailureInjection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureInjection::Succeed => f.write_str("succeed"),
            FailureInjection::Fail => f.write_str("fail"),
            FailureInjection::FailNext(n) => write!(f, "fail next {n}"),
        }
    }
}

/// `<probe>/api` on the inspected server.
pub struct ProbeResource {
    client: ResourceClient,
    name: String,
    api_path: String,
}

impl ProbeResource {
    pub fn new(client: ResourceClient, name: impl Into<String>, base_path: &str) -> Self {
        Self {
            client,
            name: name.into(),
            api_path: format!("{}/api", base_path.trim_end_matches('/')),
        }
    }
}

impl Resource for ProbeResource {
    type State = ProbeStatus;

    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self) -> NetworkResult<ProbeStatus> {
        self.client.get(&self.api_path).await
    }
}

impl Mutable for ProbeResource {
    type Payload = FailureInjection;

    /// PUT the new counter. Servers that answer without a body are re-read.
    async fn mutate(&self, injection: FailureInjection) -> NetworkResult<ProbeStatus> {
        let request = ProbeConfigRequest {
            fail_next: injection.fail_next(),
        };
        let echoed = self
            .client
            .send_optional(Method::PUT, &self.api_path, Some(&request))
            .await?;

        match echoed {
            Some(status) => Ok(status),
            None => self.client.get(&self.api_path).await,
        }
    }
}

/// What the probe panel renders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeView {
    pub title: String,
    pub path: String,
    pub fail_next: i64,
    pub mode: ProbeMode,
    pub description: String,
    /// Newest first.
    pub history: Vec<ProbeHistoryEntry>,
}

impl ProbeView {
    pub fn new(title: &str, path: &str, status: &ProbeStatus) -> Self {
        let mode = ProbeMode::from_fail_next(status.fail_next);
        Self {
            title: title.to_string(),
            path: path.to_string(),
            fail_next: status.fail_next,
            mode,
            description: mode.describe(),
            history: status.history.iter().rev().cloned().collect(),
        }
    }
}

pub struct ProbeController {
    title: String,
    path: String,
    synced: SyncedResource<ProbeResource>,
}

impl ProbeController {
    pub fn new(
        client: ResourceClient,
        title: &str,
        path: &str,
        interval: Duration,
        shutdown: CancellationToken,
    ) -> Self {
        let resource = ProbeResource::new(client, path, path);
        Self {
            title: title.to_string(),
            path: path.to_string(),
            synced: SyncedResource::new(resource, interval, shutdown),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn synced(&self) -> &SyncedResource<ProbeResource> {
        &self.synced
    }

    /// Poll `{failNext, history}` on the fixed interval.
    pub fn subscribe<F>(&self, on_update: F) -> PollSession
    where
        F: FnMut(&ProbeStatus) + Send + 'static,
    {
        self.synced.subscribe(on_update)
    }

    pub async fn refresh(&self) -> NetworkResult<ProbeStatus> {
        self.synced.refresh().await
    }

    /// Apply a failure injection and adopt the server's confirmed state.
    pub async fn configure(&self, injection: FailureInjection) -> NetworkResult<ProbeStatus> {
        tracing::info!(probe = %self.path, injection = %injection, "Configuring probe");
        self.synced.mutate(injection).await
    }

    pub fn status(&self) -> Option<ProbeStatus> {
        self.synced.store().state()
    }

    pub fn view(&self) -> Option<ProbeView> {
        self.status()
            .map(|status| ProbeView::new(&self.title, &self.path, &status))
    }
}
