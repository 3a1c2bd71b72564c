//! Connectivity health subsystem.
//!
//! # Data Flow
//! ```text
//! Every Resource Client call (poll or mutation):
//!     → ConnectionMonitor::observe (monitor.rs)
//!     → failure: state.rs Connected → Disconnected, recovery timer (re)armed
//!     → timer elapses with no new failure: Disconnected → Connected
//!
//! View layer:
//!     ConnectionMonitor::subscribe → watch::Receiver<ConnectionStatus>
//! ```
//!
//! # Design Decisions
//! - One monitor per console session, passed by Arc, never a global
//! - Entering Disconnected is immediate; leaving it is debounced
//! - Successful calls never shorten the recovery period

pub mod monitor;
pub mod state;

pub use monitor::ConnectionMonitor;
pub use state::ConnectionStatus;
