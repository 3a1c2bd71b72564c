//! Sequence-guarded state store for one resource.
//!
//! # Responsibilities
//! - Hold the last-known-good state and the most recent error
//! - Hand out sequence numbers for requests
//! - Refuse to apply a response older than the one already applied
//!
//! # Design Decisions
//! - Polls take their sequence number when issued, mutations when confirmed,
//!   so a confirmed write is never overwritten by a read issued before it landed
//! - A failure never touches the state, only `last_error`
//! - Readers get snapshots through a watch channel

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::watch;

use crate::client::NetworkError;
use crate::observability::metrics;

/// What a view sees of a resource.
#[derive(Debug, Clone)]
pub struct Snapshot<S> {
    /// Last-known-good state; `None` until the first success.
    pub state: Option<S>,
    /// Error of the latest failed request, cleared by the next applied success.
    pub last_error: Option<NetworkError>,
    /// Sequence number of the request that produced `state`.
    pub seq: u64,
}

impl<S> Default for Snapshot<S> {
    fn default() -> Self {
        Self {
            state: None,
            last_error: None,
            seq: 0,
        }
    }
}

pub struct ResourceStore<S> {
    name: String,
    next_seq: AtomicU64,
    tx: watch::Sender<Snapshot<S>>,
}

impl<S: Clone + Send + Sync + 'static> ResourceStore<S> {
    pub fn new(name: impl Into<String>) -> Arc<Self> {
        let (tx, _) = watch::channel(Snapshot::default());
        Arc::new(Self {
            name: name.into(),
            next_seq: AtomicU64::new(0),
            tx,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Allocate the next request sequence number.
    pub fn issue(&self) -> u64 {
        self.next_seq.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Apply a successful response. Returns false if a newer response was already applied.
    pub fn apply(&self, seq: u64, state: S) -> bool {
        let applied = self.tx.send_if_modified(|snapshot| {
            if seq <= snapshot.seq {
                return false;
            }
            snapshot.state = Some(state);
            snapshot.last_error = None;
            snapshot.seq = seq;
            true
        });

        if !applied {
            metrics::record_stale_response(&self.name);
            tracing::debug!(resource = %self.name, seq, "Discarding stale response");
        }
        applied
    }

    /// Record a failed request. The state is left untouched.
    pub fn record_error(&self, seq: u64, error: NetworkError) {
        self.tx.send_if_modified(|snapshot| {
            if seq <= snapshot.seq {
                return false;
            }
            snapshot.last_error = Some(error);
            true
        });
    }

    pub fn snapshot(&self) -> Snapshot<S> {
        self.tx.borrow().clone()
    }

    pub fn state(&self) -> Option<S> {
        self.tx.borrow().state.clone()
    }

    pub fn last_error(&self) -> Option<NetworkError> {
        self.tx.borrow().last_error.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot<S>> {
        self.tx.subscribe()
    }
}
