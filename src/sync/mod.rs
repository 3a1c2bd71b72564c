//! Client-side synchronization engine.
//!
//! # Data Flow
//! ```text
//! subscribe() ──▶ PollSession (poller.rs)
//!                   │ tick (immediately, then every interval; dropped if busy)
//!                   ▼
//!                 Resource::fetch (resource.rs) ──▶ ResourceClient
//!                   │
//!                   ▼
//!                 ResourceStore::apply(seq, state) (store.rs)
//!                   │ stale seq → discarded
//!                   ▼
//!                 watch snapshot + on_update callback
//!
//! mutate() ──▶ Mutable::mutate ──▶ confirmed state ──▶ adopt (fresh seq)
//! ```
//!
//! # Design Decisions
//! - One generic engine; resources only supply fetch/mutate and their wire types
//! - Failures never modify state; the last-known-good snapshot stays visible
//! - Sessions are scoped: stop on demand, on drop, or when the console shuts down

pub mod poller;
pub mod resource;
pub mod store;
pub mod synced;

pub use poller::{PollSession, Poller, SessionStats};
pub use resource::{Mutable, Resource};
pub use store::{ResourceStore, Snapshot};
pub use synced::SyncedResource;
