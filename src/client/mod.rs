//! Resource Client subsystem.
//!
//! # Data Flow
//! ```text
//! Poller tick / controller mutation
//!     → resource.rs (build URL, attach request id, send)
//!     → classify: transport | non-2xx | decode | ok
//!     → ConnectionMonitor::observe
//!     → Result<T, NetworkError> back to the caller
//! ```

pub mod error;
pub mod resource;

pub use error::{FailureCause, NetworkError, NetworkResult};
pub use resource::{ClientBuildError, ResourceClient};
