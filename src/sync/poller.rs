//! Interval-driven state puller.
//!
//! # Responsibilities
//! - Fetch immediately on start, then once per interval
//! - Keep at most one request in flight per session
//! - Apply successes to the store and notify the subscriber
//! - Stop cleanly, discarding whatever is still in flight
//!
//! # Design Decisions
//! - A tick that fires while a request is outstanding is dropped, not queued
//! - The in-flight request lives inside the session task, so cancelling the
//!   task drops it before it can complete
//! - Failures are reported to the Connection Monitor by the Resource Client;
//!   the poller only records them on the store

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::OptionFuture;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::client::NetworkResult;
use crate::observability::metrics;
use crate::sync::resource::Resource;
use crate::sync::store::ResourceStore;

type Fetch<'a, S> = Pin<Box<dyn Future<Output = NetworkResult<S>> + Send + 'a>>;

/// Counters of one poll session.
#[derive(Debug, Default)]
pub struct SessionStats {
    pub requests_issued: AtomicU64,
    pub ticks_skipped: AtomicU64,
}

/// Binds a resource to its store and a fixed interval.
pub struct Poller<R: Resource> {
    resource: Arc<R>,
    store: Arc<ResourceStore<R::State>>,
    interval: Duration,
}

impl<R: Resource> Clone for Poller<R> {
    fn clone(&self) -> Self {
        Self {
            resource: self.resource.clone(),
            store: self.store.clone(),
            interval: self.interval,
        }
    }
}

impl<R: Resource> Poller<R> {
    pub fn new(resource: Arc<R>, store: Arc<ResourceStore<R::State>>, interval: Duration) -> Self {
        Self {
            resource,
            store,
            interval,
        }
    }

    pub fn store(&self) -> &Arc<ResourceStore<R::State>> {
        &self.store
    }

    /// Start polling until `cancel` fires or the returned session is stopped or dropped.
    pub fn start<F>(&self, cancel: CancellationToken, on_update: F) -> PollSession
    where
        F: FnMut(&R::State) + Send + 'static,
    {
        let stats = Arc::new(SessionStats::default());

        let task = tokio::spawn(run(
            self.resource.clone(),
            self.store.clone(),
            self.interval,
            cancel.clone(),
            on_update,
            stats.clone(),
        ));

        PollSession { cancel, task, stats }
    }
}

async fn run<R, F>(
    resource: Arc<R>,
    store: Arc<ResourceStore<R::State>>,
    interval: Duration,
    cancel: CancellationToken,
    mut on_update: F,
    stats: Arc<SessionStats>,
) where
    R: Resource,
    F: FnMut(&R::State) + Send + 'static,
{
    let name = resource.name().to_string();
    tracing::debug!(resource = %name, interval_ms = interval.as_millis() as u64, "Poll session started");

    let mut ticker = time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut in_flight: Option<Fetch<'_, R::State>> = None;
    let mut in_flight_seq = 0;

    loop {
        tokio::select! {
            biased;

            _ = cancel.cancelled() => break,

            Some(outcome) = OptionFuture::from(in_flight.as_mut()), if in_flight.is_some() => {
                in_flight = None;
                if cancel.is_cancelled() {
                    break;
                }
                match outcome {
                    Ok(state) => {
                        if store.apply(in_flight_seq, state.clone()) {
                            on_update(&state);
                        }
                    }
                    Err(e) => {
                        tracing::debug!(resource = %name, seq = in_flight_seq, error = %e, "Poll failed, keeping last known state");
                        store.record_error(in_flight_seq, e);
                    }
                }
            }

            _ = ticker.tick() => {
                if in_flight.is_some() {
                    stats.ticks_skipped.fetch_add(1, Ordering::Relaxed);
                    metrics::record_skipped_tick(&name);
                    tracing::trace!(resource = %name, seq = in_flight_seq, "Previous poll still in flight, skipping tick");
                    continue;
                }
                in_flight_seq = store.issue();
                stats.requests_issued.fetch_add(1, Ordering::Relaxed);
                in_flight = Some(Box::pin(resource.fetch()));
            }
        }
    }

    tracing::debug!(resource = %name, "Poll session stopped");
}

/// Scoped subscription to a polled resource.
///
/// Stopping is idempotent and also happens on drop, so the timer is cancelled
/// on every teardown path.
pub struct PollSession {
    cancel: CancellationToken,
    task: JoinHandle<()>,
    stats: Arc<SessionStats>,
}

impl PollSession {
    pub fn stop(&self) {
        self.cancel.cancel();
        self.task.abort();
    }

    /// False once stopped, cancelled, or if the session task has ended for any reason.
    pub fn is_running(&self) -> bool {
        !self.cancel.is_cancelled() && !self.task.is_finished()
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }
}

impl Drop for PollSession {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{FailureCause, NetworkError};
    use crate::sync::resource::Mutable;
    use std::collections::VecDeque;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;
    use tokio::sync::oneshot;
    use uuid::Uuid;

    const INTERVAL: Duration = Duration::from_millis(1000);

    /// A resource whose responses are released by the test, one request at a time.
    #[derive(Default)]
    struct Scripted {
        pending: Mutex<VecDeque<oneshot::Sender<NetworkResult<u32>>>>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl Scripted {
        fn respond(&self, outcome: NetworkResult<u32>) {
            let tx = self.pending.lock().unwrap().pop_front().expect("no request in flight");
            let _ = tx.send(outcome);
        }

        fn outstanding(&self) -> usize {
            self.pending.lock().unwrap().len()
        }
    }

    impl Resource for Scripted {
        type State = u32;

        fn name(&self) -> &str {
            "scripted"
        }

        async fn fetch(&self) -> NetworkResult<u32> {
            let (tx, rx) = oneshot::channel();
            self.pending.lock().unwrap().push_back(tx);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);

            let outcome = rx.await.unwrap_or_else(|_| Err(failure()));
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            outcome
        }
    }

    impl Mutable for Scripted {
        type Payload = u32;

        async fn mutate(&self, payload: u32) -> NetworkResult<u32> {
            Ok(payload)
        }
    }

    fn failure() -> NetworkError {
        NetworkError::new(
            "GET",
            "http://x/api",
            Uuid::nil(),
            FailureCause::Transport("unreachable".into()),
        )
    }

    async fn settle() {
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }
    }

    async fn advance(d: Duration) {
        time::advance(d).await;
        settle().await;
    }

    fn poller(resource: &Arc<Scripted>) -> Poller<Scripted> {
        Poller::new(resource.clone(), ResourceStore::new("scripted"), INTERVAL)
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_fetch_is_immediate() {
        let resource = Arc::new(Scripted::default());
        let poller = poller(&resource);
        let _session = poller.start(CancellationToken::new(), |_| {});

        settle().await;
        assert_eq!(resource.outstanding(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_skipped_while_request_outstanding() {
        let resource = Arc::new(Scripted::default());
        let poller = poller(&resource);
        let updates = Arc::new(AtomicUsize::new(0));
        let counter = updates.clone();
        let session = poller.start(CancellationToken::new(), move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        settle().await;
        advance(INTERVAL).await;
        advance(INTERVAL).await;
        assert_eq!(resource.outstanding(), 1);
        assert_eq!(resource.max_in_flight.load(Ordering::SeqCst), 1);
        assert_eq!(session.stats().ticks_skipped.load(Ordering::Relaxed), 2);

        resource.respond(Ok(7));
        settle().await;
        assert_eq!(poller.store().state(), Some(7));
        assert_eq!(updates.load(Ordering::SeqCst), 1);

        advance(INTERVAL).await;
        assert_eq!(resource.outstanding(), 1);
        assert_eq!(session.stats().requests_issued.load(Ordering::Relaxed), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_keeps_last_good_state_and_skips_update() {
        let resource = Arc::new(Scripted::default());
        let poller = poller(&resource);
        let updates = Arc::new(AtomicUsize::new(0));
        let counter = updates.clone();
        let _session = poller.start(CancellationToken::new(), move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        settle().await;
        resource.respond(Ok(5));
        settle().await;

        advance(INTERVAL).await;
        resource.respond(Err(failure()));
        settle().await;

        let snapshot = poller.store().snapshot();
        assert_eq!(snapshot.state, Some(5));
        assert!(snapshot.last_error.is_some());
        assert_eq!(updates.load(Ordering::SeqCst), 1);

        advance(INTERVAL).await;
        resource.respond(Ok(6));
        settle().await;
        assert_eq!(poller.store().state(), Some(6));
        assert!(poller.store().last_error().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_issued_before_confirmed_mutation_is_discarded() {
        let resource = Arc::new(Scripted::default());
        let poller = poller(&resource);
        let _session = poller.start(CancellationToken::new(), |_| {});
        settle().await;

        // A mutation confirms while the first poll is still outstanding.
        let confirmed = resource.mutate(42).await.unwrap();
        let store = poller.store();
        assert!(store.apply(store.issue(), confirmed));

        resource.respond(Ok(1));
        settle().await;
        assert_eq!(store.state(), Some(42));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_discards_in_flight_response() {
        let resource = Arc::new(Scripted::default());
        let poller = poller(&resource);
        let session = poller.start(CancellationToken::new(), |_| {});
        settle().await;
        assert!(session.is_running());

        session.stop();
        session.stop();
        settle().await;
        assert!(!session.is_running());

        // The fetch future was dropped with the task; nothing can be applied.
        assert_eq!(resource.in_flight.load(Ordering::SeqCst), 1);
        advance(INTERVAL * 3).await;
        assert_eq!(poller.store().state(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_whose_task_died_is_not_running() {
        let resource = Arc::new(Scripted::default());
        // A zero period makes the session task panic on its first poll.
        let poller = Poller::new(resource.clone(), ResourceStore::new("scripted"), Duration::ZERO);
        let session = poller.start(CancellationToken::new(), |_| {});
        settle().await;

        assert!(!session.is_running());
        assert_eq!(resource.outstanding(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_parent_cancellation_stops_session() {
        let resource = Arc::new(Scripted::default());
        let poller = poller(&resource);
        let root = CancellationToken::new();
        let session = poller.start(root.child_token(), |_| {});
        settle().await;

        root.cancel();
        settle().await;
        assert!(!session.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_timer() {
        let resource = Arc::new(Scripted::default());
        let poller = poller(&resource);
        {
            let _session = poller.start(CancellationToken::new(), |_| {});
            settle().await;
        }
        settle().await;

        resource.pending.lock().unwrap().clear();
        advance(INTERVAL * 5).await;
        assert_eq!(resource.outstanding(), 0);
    }
}
