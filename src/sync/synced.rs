//! A resource together with its store, poller and shutdown scope.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::client::NetworkResult;
use crate::sync::poller::{PollSession, Poller};
use crate::sync::resource::{Mutable, Resource};
use crate::sync::store::{ResourceStore, Snapshot};

pub struct SyncedResource<R: Resource> {
    resource: Arc<R>,
    poller: Poller<R>,
    shutdown: CancellationToken,
}

impl<R: Resource> SyncedResource<R> {
    pub fn new(resource: R, interval: Duration, shutdown: CancellationToken) -> Self {
        let resource = Arc::new(resource);
        let store = ResourceStore::new(resource.name());
        let poller = Poller::new(resource.clone(), store, interval);
        Self {
            resource,
            poller,
            shutdown,
        }
    }

    pub fn resource(&self) -> &Arc<R> {
        &self.resource
    }

    pub fn store(&self) -> &Arc<ResourceStore<R::State>> {
        self.poller.store()
    }

    pub fn snapshot(&self) -> Snapshot<R::State> {
        self.store().snapshot()
    }

    /// Start a poll session scoped to this console's shutdown.
    pub fn subscribe<F>(&self, on_update: F) -> PollSession
    where
        F: FnMut(&R::State) + Send + 'static,
    {
        self.poller.start(self.shutdown.child_token(), on_update)
    }

    /// Fetch once outside the poll schedule.
    pub async fn refresh(&self) -> NetworkResult<R::State> {
        let store = self.store();
        let seq = store.issue();
        match self.resource.fetch().await {
            Ok(state) => {
                store.apply(seq, state.clone());
                Ok(state)
            }
            Err(e) => {
                store.record_error(seq, e.clone());
                Err(e)
            }
        }
    }

    /// Adopt a state the server has just confirmed.
    ///
    /// The sequence number is taken now, so any poll issued before this point
    /// can no longer overwrite it.
    pub fn adopt(&self, state: R::State) {
        let store = self.store();
        store.apply(store.issue(), state);
    }
}

impl<R: Mutable> SyncedResource<R> {
    /// Write to the server and adopt exactly what it confirms.
    pub async fn mutate(&self, payload: R::Payload) -> NetworkResult<R::State> {
        match self.resource.mutate(payload).await {
            Ok(state) => {
                self.adopt(state.clone());
                Ok(state)
            }
            Err(e) => {
                let store = self.store();
                store.record_error(store.issue(), e.clone());
                Err(e)
            }
        }
    }
}
