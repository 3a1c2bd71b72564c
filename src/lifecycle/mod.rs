//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Console::shutdown
//!
//! Shutdown (shutdown.rs):
//!     trigger → root token cancelled → every poll session stops
//!             → Connection Monitor recovery timer cleared
//! ```

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
