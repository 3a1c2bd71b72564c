//! Diagnostic console watcher.
//!
//! Headless front end of the synchronization engine: subscribes to every
//! polled resource of the inspected server and logs what a view would render.
//!
//! ```text
//!   probes ──┐
//!   workload ├─▶ PollSession ─▶ ResourceStore ─▶ log view changes
//!   queue    │        │
//!   memory ──┘        └─▶ ResourceClient ─▶ ConnectionMonitor ─▶ log status changes
//! ```

use std::path::PathBuf;

use clap::Parser;

use diag_console::config::resolve_config;
use diag_console::controllers::memory::summarize;
use diag_console::controllers::ProbeView;
use diag_console::lifecycle::signals::wait_for_termination;
use diag_console::observability::{logging, metrics};
use diag_console::Console;

#[derive(Parser)]
#[command(name = "diag-console")]
#[command(about = "Watch a diagnostic server's probes, workload, queues and memory", long_about = None)]
struct Args {
    /// TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `server.base_url`.
    #[arg(short, long)]
    url: Option<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = resolve_config(args.config.as_deref(), args.url.as_deref())?;

    logging::init_logging(&config.observability);
    tracing::info!("diag-console v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        base_url = %config.server.base_url,
        poll_interval_ms = config.sync.poll_interval_ms,
        recovery_ms = config.sync.recovery_ms,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let console = Console::new(config)?;

    match console.env().load().await {
        Ok(env) => tracing::info!(
            command_line = ?env.command_line,
            variables = env.variables.len(),
            "Environment loaded"
        ),
        Err(e) => tracing::warn!(error = %e, "Environment unavailable"),
    }

    let mut sessions = Vec::new();
    for probe in console.probes() {
        let title = probe.title().to_string();
        let path = probe.path().to_string();
        let mut last_fail_next = None;
        sessions.push(probe.subscribe(move |status| {
            if last_fail_next == Some(status.fail_next) {
                return;
            }
            last_fail_next = Some(status.fail_next);
            let view = ProbeView::new(&title, &path, status);
            tracing::info!(probe = %view.title, fail_next = view.fail_next, history = view.history.len(), "{}", view.description);
        }));
    }

    let mut last_config = None;
    sessions.push(console.workload().subscribe(move |status| {
        if last_config.as_ref() != Some(&status.config) {
            tracing::info!(config = ?status.config, "Workload config");
            last_config = Some(status.config.clone());
        }
        if let Some(latest) = status.history.last() {
            tracing::debug!(id = latest.id, keys = status.history.len(), "Workload history");
        }
    }));

    let mut last_queues = None;
    sessions.push(console.queue().subscribe(move |stats| {
        if last_queues.as_ref() == Some(&stats.queues) {
            return;
        }
        for queue in &stats.queues {
            tracing::info!(
                queue = %queue.name,
                depth = queue.depth,
                enqueued = queue.enqueued,
                dequeued = queue.dequeued,
                drained = queue.drained,
                "Queue stats"
            );
        }
        last_queues = Some(stats.queues.clone());
    }));

    sessions.push(console.memory().subscribe(|stats| {
        for row in summarize(stats) {
            tracing::trace!(key = row.key, value = %row.display, "Memory");
        }
    }));

    let mut connection = console.subscribe_connection();
    let watch_connection = async {
        while connection.changed().await.is_ok() {
            let status = *connection.borrow_and_update();
            tracing::info!(status = %status, "Connectivity changed");
        }
    };

    tokio::select! {
        _ = wait_for_termination() => {}
        _ = watch_connection => {}
    }

    for session in &sessions {
        session.stop();
    }
    console.shutdown();

    tracing::info!("Shutdown complete");
    Ok(())
}
