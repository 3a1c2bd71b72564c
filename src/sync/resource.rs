//! The poll + mutate interface shared by every backend resource.

use std::future::Future;

use crate::client::NetworkResult;

/// A remote resource whose state can be fetched.
///
/// Each concrete resource supplies its own decode (via its wire types); the
/// Poller and Connection Monitor machinery stays shared.
pub trait Resource: Send + Sync + 'static {
    /// Decoded snapshot of the remote state.
    type State: Clone + Send + Sync + 'static;

    /// Name used in logs and metrics.
    fn name(&self) -> &str;

    /// Fetch the current state.
    fn fetch(&self) -> impl Future<Output = NetworkResult<Self::State>> + Send;
}

/// A resource that accepts writes and answers with its confirmed state.
pub trait Mutable: Resource {
    type Payload: Send;

    /// Apply `payload` on the server and return the state the server confirms.
    fn mutate(&self, payload: Self::Payload) -> impl Future<Output = NetworkResult<Self::State>> + Send;
}
