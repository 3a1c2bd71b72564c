//! Console session context.
//!
//! Owns the one Connection Monitor and Resource Client of a session and hands
//! them to every controller. Nothing here is global: two consoles in one
//! process are fully independent.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::watch;

use crate::client::{ClientBuildError, ResourceClient};
use crate::config::validation::validate_config;
use crate::config::{ConfigError, ConsoleConfig};
use crate::controllers::{
    DnsController, EnvController, MemoryController, ProbeController, QueueMonitor,
    WorkloadController,
};
use crate::health::{ConnectionMonitor, ConnectionStatus};
use crate::lifecycle::Shutdown;

/// Error building a console session.
#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Client(#[from] ClientBuildError),
}

pub struct Console {
    config: ConsoleConfig,
    monitor: Arc<ConnectionMonitor>,
    client: ResourceClient,
    shutdown: Shutdown,
    liveness: ProbeController,
    readiness: ProbeController,
    workload: WorkloadController,
    queue: QueueMonitor,
    memory: MemoryController,
    env: EnvController,
    dns: DnsController,
}

impl Console {
    /// Validate `config` and build the session. Nothing is polled until a
    /// controller is subscribed.
    pub fn new(config: ConsoleConfig) -> Result<Self, ConsoleError> {
        validate_config(&config).map_err(ConfigError::Validation)?;

        let monitor = ConnectionMonitor::new(config.sync.recovery());
        let client = ResourceClient::new(&config.server, monitor.clone())?;
        let shutdown = Shutdown::new();
        let interval = config.sync.poll_interval();
        let endpoints = &config.endpoints;

        let liveness = ProbeController::new(
            client.clone(),
            "Liveness Check",
            &endpoints.liveness,
            interval,
            shutdown.subscribe(),
        );
        let readiness = ProbeController::new(
            client.clone(),
            "Readiness Check",
            &endpoints.readiness,
            interval,
            shutdown.subscribe(),
        );
        let workload = WorkloadController::new(
            client.clone(),
            &endpoints.workload,
            interval,
            shutdown.subscribe(),
        );
        let queue = QueueMonitor::new(client.clone(), &endpoints.queue, interval, shutdown.subscribe());
        let memory = MemoryController::new(client.clone(), &endpoints.memory, interval, shutdown.subscribe());
        let env = EnvController::new(client.clone(), &endpoints.env);
        let dns = DnsController::new(client.clone(), &endpoints.dns);

        tracing::debug!(base_url = %client.base_url(), "Console session created");

        Ok(Self {
            config,
            monitor,
            client,
            shutdown,
            liveness,
            readiness,
            workload,
            queue,
            memory,
            env,
            dns,
        })
    }

    pub fn config(&self) -> &ConsoleConfig {
        &self.config
    }

    pub fn client(&self) -> &ResourceClient {
        &self.client
    }

    pub fn monitor(&self) -> &Arc<ConnectionMonitor> {
        &self.monitor
    }

    pub fn connection_status(&self) -> ConnectionStatus {
        self.monitor.status()
    }

    pub fn subscribe_connection(&self) -> watch::Receiver<ConnectionStatus> {
        self.monitor.subscribe()
    }

    pub fn liveness(&self) -> &ProbeController {
        &self.liveness
    }

    pub fn readiness(&self) -> &ProbeController {
        &self.readiness
    }

    /// Both probes, liveness first.
    pub fn probes(&self) -> [&ProbeController; 2] {
        [&self.liveness, &self.readiness]
    }

    pub fn workload(&self) -> &WorkloadController {
        &self.workload
    }

    pub fn queue(&self) -> &QueueMonitor {
        &self.queue
    }

    pub fn memory(&self) -> &MemoryController {
        &self.memory
    }

    pub fn env(&self) -> &EnvController {
        &self.env
    }

    pub fn dns(&self) -> &DnsController {
        &self.dns
    }

    /// Stop every poll session and tear the monitor down. Idempotent.
    pub fn shutdown(&self) {
        if !self.shutdown.is_triggered() {
            tracing::info!("Console shutting down");
        }
        self.shutdown.trigger();
        self.monitor.shutdown();
    }
}

impl Drop for Console {
    fn drop(&mut self) {
        self.shutdown();
    }
}
