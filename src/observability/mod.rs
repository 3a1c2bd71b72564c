//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Resource Client, Poller and Connection Monitor produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → stdout (compact or pretty)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through every request span and error
//! - Metrics are cheap (recorder is a no-op until an exporter is installed)

pub mod logging;
pub mod metrics;
