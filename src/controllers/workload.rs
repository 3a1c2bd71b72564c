//! Workload controller: key generation config and history.
//!
//! The server state (baseline) is polled like any other resource. Local form
//! edits live in a separate draft so a background poll never overwrites what
//! the operator is typing; only the response to the operator's own submit
//! replaces the draft.

use std::fmt;
use std::str::FromStr;
use std::sync::Mutex;
use std::time::Duration;

use reqwest::Method;
use serde::Serialize;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::api::workload::{KeyRecord, WorkloadConfig, WorkloadStatus};
use crate::client::{NetworkError, NetworkResult, ResourceClient};
use crate::sync::{Mutable, PollSession, Resource, SyncedResource};

/// An editable workload form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkloadField {
    Enabled,
    NumToGenerate,
    TimeToRun,
    ExitOnComplete,
    ExitCode,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WorkloadEditError {
    #[error("unknown workload field '{0}'")]
    UnknownField(String),

    #[error("invalid value '{value}' for {field}")]
    InvalidValue { field: WorkloadField, value: String },
}

impl FromStr for WorkloadField {
    type Err = WorkloadEditError;

    /// Accepts the wire names used by the server.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "enable" | "enabled" => Ok(WorkloadField::Enabled),
            "numToGen" => Ok(WorkloadField::NumToGenerate),
            "timeToRun" => Ok(WorkloadField::TimeToRun),
            "exitOnComplete" => Ok(WorkloadField::ExitOnComplete),
            "exitCode" => Ok(WorkloadField::ExitCode),
            other => Err(WorkloadEditError::UnknownField(other.to_string())),
        }
    }
}

impl fmt::Display for WorkloadField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WorkloadField::Enabled => "enable",
            WorkloadField::NumToGenerate => "numToGen",
            WorkloadField::TimeToRun => "timeToRun",
            WorkloadField::ExitOnComplete => "exitOnComplete",
            WorkloadField::ExitCode => "exitCode",
        };
        f.write_str(name)
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Some(true),
        "false" | "off" | "no" | "0" => Some(false),
        _ => None,
    }
}

impl WorkloadField {
    /// Parse form text into `config`.
    pub fn apply(self, config: &mut WorkloadConfig, raw: &str) -> Result<(), WorkloadEditError> {
        let invalid = || WorkloadEditError::InvalidValue {
            field: self,
            value: raw.to_string(),
        };
        let trimmed = raw.trim();

        match self {
            WorkloadField::Enabled => config.enabled = parse_flag(raw).ok_or_else(invalid)?,
            WorkloadField::ExitOnComplete => config.exit_on_complete = parse_flag(raw).ok_or_else(invalid)?,
            WorkloadField::NumToGenerate => config.num_to_generate = trimmed.parse().map_err(|_| invalid())?,
            WorkloadField::TimeToRun => config.time_to_run_secs = trimmed.parse().map_err(|_| invalid())?,
            WorkloadField::ExitCode => config.exit_code = trimmed.parse().map_err(|_| invalid())?,
        }
        Ok(())
    }
}

/// The workload endpoint on the inspected server.
pub struct WorkloadResource {
    client: ResourceClient,
    path: String,
}

impl WorkloadResource {
    pub fn new(client: ResourceClient, path: &str) -> Self {
        Self {
            client,
            path: path.to_string(),
        }
    }
}

impl Resource for WorkloadResource {
    type State = WorkloadStatus;

    fn name(&self) -> &str {
        "workload"
    }

    async fn fetch(&self) -> NetworkResult<WorkloadStatus> {
        self.client.get(&self.path).await
    }
}

impl Mutable for WorkloadResource {
    type Payload = WorkloadConfig;

    async fn mutate(&self, config: WorkloadConfig) -> NetworkResult<WorkloadStatus> {
        self.client.send(Method::PUT, &self.path, &config).await
    }
}

/// What the workload panel renders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkloadView {
    /// Draft if an edit is in progress, otherwise the server's config.
    pub config: WorkloadConfig,
    pub editing: bool,
    /// Newest first.
    pub history: Vec<KeyRecord>,
}

pub struct WorkloadController {
    synced: SyncedResource<WorkloadResource>,
    draft: Mutex<Option<WorkloadConfig>>,
}

impl WorkloadController {
    pub fn new(client: ResourceClient, path: &str, interval: Duration, shutdown: CancellationToken) -> Self {
        Self {
            synced: SyncedResource::new(WorkloadResource::new(client, path), interval, shutdown),
            draft: Mutex::new(None),
        }
    }

    pub fn synced(&self) -> &SyncedResource<WorkloadResource> {
        &self.synced
    }

    /// Poll the baseline. The draft is never touched by polls.
    pub fn subscribe<F>(&self, on_update: F) -> PollSession
    where
        F: FnMut(&WorkloadStatus) + Send + 'static,
    {
        self.synced.subscribe(on_update)
    }

    pub async fn refresh(&self) -> NetworkResult<WorkloadStatus> {
        self.synced.refresh().await
    }

    fn draft(&self) -> std::sync::MutexGuard<'_, Option<WorkloadConfig>> {
        match self.draft.lock() {
            Ok(draft) => draft,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Server-confirmed config, if any has been fetched.
    pub fn baseline(&self) -> Option<WorkloadConfig> {
        self.synced.store().state().map(|status| status.config)
    }

    pub fn is_editing(&self) -> bool {
        self.draft().is_some()
    }

    /// Edit the draft, starting it from the current baseline if needed.
    pub fn edit(&self, f: impl FnOnce(&mut WorkloadConfig)) {
        let baseline = self.baseline();
        let mut draft = self.draft();
        let config = draft.get_or_insert_with(|| baseline.unwrap_or_default());
        f(config);
    }

    /// Apply one form field's raw text to the draft.
    pub fn edit_field(&self, field: WorkloadField, raw: &str) -> Result<(), WorkloadEditError> {
        let mut result = Ok(());
        self.edit(|config| result = field.apply(config, raw));
        result
    }

    pub fn discard_edits(&self) {
        self.draft().take();
    }

    /// Draft if editing, otherwise the baseline.
    pub fn effective_config(&self) -> Option<WorkloadConfig> {
        self.draft().clone().or_else(|| self.baseline())
    }

    /// Submit the effective config. On success the response replaces both the
    /// baseline and the draft; on failure the draft is kept.
    pub async fn submit(&self) -> Result<WorkloadStatus, NetworkError> {
        let config = self.effective_config().unwrap_or_default();
        tracing::info!(
            enabled = config.enabled,
            num_to_generate = config.num_to_generate,
            time_to_run_secs = config.time_to_run_secs,
            "Submitting workload config"
        );

        let status = self.synced.mutate(config).await?;
        self.draft().take();
        Ok(status)
    }

    pub fn view(&self) -> Option<WorkloadView> {
        let status = self.synced.store().state();
        let draft = self.draft().clone();
        if status.is_none() && draft.is_none() {
            return None;
        }

        let editing = draft.is_some();
        let (baseline, history) = match status {
            Some(status) => (Some(status.config), status.history),
            None => (None, Vec::new()),
        };
        Some(WorkloadView {
            config: draft.or(baseline).unwrap_or_default(),
            editing,
            history: history.into_iter().rev().collect(),
        })
    }
}
