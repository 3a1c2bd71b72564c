//! Per-panel controllers built on the sync engine.
//!
//! Polled: probes, workload, queue, memory. One-shot: environment, DNS.

pub mod dns;
pub mod env;
pub mod memory;
pub mod probe;
pub mod queue;
pub mod workload;

pub use dns::DnsController;
pub use env::{EnvController, EnvView};
pub use memory::MemoryController;
pub use probe::{FailureInjection, ProbeController, ProbeMode, ProbeView};
pub use queue::QueueMonitor;
pub use workload::{WorkloadController, WorkloadField, WorkloadView};
