//! Connection monitor.
//!
//! # Responsibilities
//! - Reduce the outcome of every Resource Client call to one status
//! - Debounce recovery: only a quiet period with no failures reconnects
//! - Publish the status to any number of readers
//!
//! # Design Decisions
//! - The only write operation is reporting a failure
//! - Each recovery timer carries an epoch; a stale timer never flips the status
//! - Teardown aborts the pending timer and ignores later reports

use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::client::error::NetworkError;
use crate::health::state::ConnectionStatus;
use crate::observability::metrics;

#[derive(Default)]
struct RecoveryTimer {
    epoch: u64,
    handle: Option<JoinHandle<()>>,
    closed: bool,
}

/// Process-wide connectivity status shared by every poller and mutation.
pub struct ConnectionMonitor {
    status: watch::Sender<ConnectionStatus>,
    recovery: Duration,
    timer: Mutex<RecoveryTimer>,
}

impl ConnectionMonitor {
    /// Create a monitor in the `Connected` state.
    pub fn new(recovery: Duration) -> Arc<Self> {
        let (status, _) = watch::channel(ConnectionStatus::Connected);
        metrics::record_connection(true);
        Arc::new(Self {
            status,
            recovery,
            timer: Mutex::new(RecoveryTimer::default()),
        })
    }

    /// Current status.
    pub fn status(&self) -> ConnectionStatus {
        *self.status.borrow()
    }

    pub fn is_disconnected(&self) -> bool {
        !self.status().is_connected()
    }

    /// Subscribe to status changes.
    pub fn subscribe(&self) -> watch::Receiver<ConnectionStatus> {
        self.status.subscribe()
    }

    /// Feed the outcome of a Resource Client call into the monitor.
    ///
    /// Successes are only traced; they never end a disconnect early.
    pub fn observe<T>(self: &Arc<Self>, outcome: &Result<T, NetworkError>) {
        match outcome {
            Ok(_) => tracing::trace!(status = %self.status(), "Request succeeded"),
            Err(e) => self.report_failure(e),
        }
    }

    /// Report a failed call: enter `Disconnected` now and (re)arm the recovery timer.
    pub fn report_failure(self: &Arc<Self>, error: &NetworkError) {
        let mut timer = match self.timer.lock() {
            Ok(timer) => timer,
            Err(poisoned) => poisoned.into_inner(),
        };
        if timer.closed {
            tracing::debug!(error = %error, "Failure reported after monitor shutdown, ignoring");
            return;
        }

        if let Some(previous) = timer.handle.take() {
            previous.abort();
        }
        timer.epoch += 1;

        let entered = self.status.send_if_modified(|status| {
            let changed = status.is_connected();
            *status = ConnectionStatus::Disconnected;
            changed
        });
        if entered {
            metrics::record_connection(false);
            tracing::warn!(error = %error, "Connection lost");
        } else {
            tracing::debug!(error = %error, "Failure while disconnected, recovery timer re-armed");
        }

        // Measured from the failure, not from when the timer task first runs.
        let deadline = Instant::now() + self.recovery;
        let epoch = timer.epoch;
        let monitor = Arc::downgrade(self);
        timer.handle = Some(tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            Self::recover(monitor, epoch);
        }));
    }

    fn recover(monitor: Weak<Self>, epoch: u64) {
        let Some(monitor) = monitor.upgrade() else {
            return;
        };
        let mut timer = match monitor.timer.lock() {
            Ok(timer) => timer,
            Err(poisoned) => poisoned.into_inner(),
        };
        if timer.closed || timer.epoch != epoch {
            return;
        }
        timer.handle = None;

        monitor.status.send_replace(ConnectionStatus::Connected);
        metrics::record_connection(true);
        tracing::info!("Connection restored");
    }

    /// Tear the monitor down: cancel any pending recovery. Idempotent.
    pub fn shutdown(&self) {
        let mut timer = match self.timer.lock() {
            Ok(timer) => timer,
            Err(poisoned) => poisoned.into_inner(),
        };
        timer.closed = true;
        if let Some(handle) = timer.handle.take() {
            handle.abort();
        }
    }
}

impl Drop for ConnectionMonitor {
    fn drop(&mut self) {
        self.shutdown();
    }
}
