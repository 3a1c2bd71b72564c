//! Diagnostic console synchronization engine.
//!
//! Polls a diagnostic server's resources, applies operator mutations with the
//! server's confirmed response, and reduces every request outcome to one
//! connectivity signal.

pub mod api;
pub mod client;
pub mod config;
pub mod console;
pub mod controllers;
pub mod health;
pub mod lifecycle;
pub mod observability;
pub mod sync;

pub use config::ConsoleConfig;
pub use console::{Console, ConsoleError};
pub use health::{ConnectionMonitor, ConnectionStatus};
pub use lifecycle::Shutdown;
