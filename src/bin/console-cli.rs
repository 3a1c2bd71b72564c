use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;

use diag_console::api::system::DnsQuery;
use diag_console::client::NetworkError;
use diag_console::config::resolve_config;
use diag_console::controllers::memory::{summarize, DEFAULT_ALLOC_BYTES};
use diag_console::controllers::{FailureInjection, ProbeController, ProbeView, WorkloadField};
use diag_console::Console;

#[derive(Parser)]
#[command(name = "console-cli")]
#[command(about = "One-shot management CLI for a diagnostic server", long_about = None)]
struct Cli {
    /// Server base URL. Overrides `server.base_url` of the config file;
    /// defaults to http://localhost:8080 when neither is given.
    #[arg(short, long)]
    url: Option<String>,

    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum ProbeKind {
    Liveness,
    Readiness,
}

#[derive(Subcommand)]
enum Commands {
    /// Show or configure failure injection of a probe
    Probe {
        #[arg(value_enum)]
        kind: ProbeKind,
        /// succeed | fail | 1 | 2 | 3 | 5 | 10. Omit to show the current state.
        injection: Option<FailureInjection>,
    },
    /// Show or update the key generation workload
    Workload {
        /// Field assignments such as `enable=true numToGen=100`
        assignments: Vec<String>,
    },
    /// Inspect and operate message queues
    Queue {
        #[command(subcommand)]
        action: QueueAction,
    },
    /// Show memory stats, or allocate/clear server memory
    Mem {
        #[command(subcommand)]
        action: Option<MemAction>,
    },
    /// Show the server's command line and environment
    Env,
    /// Run a DNS query on the server
    Dns {
        name: String,
        #[arg(short = 't', long = "type", default_value = "A")]
        record_type: String,
    },
}

#[derive(Subcommand)]
enum QueueAction {
    Stats,
    Create { queue: String },
    Delete { queue: String },
    Drain { queue: String },
    Enqueue { queue: String, body: String },
    Dequeue { queue: String },
}

#[derive(Subcommand)]
enum MemAction {
    Alloc {
        #[arg(default_value_t = DEFAULT_ALLOC_BYTES)]
        bytes: u64,
    },
    Clear,
}

#[derive(Debug)]
enum CliError {
    Network(NetworkError),
    Other(Box<dyn std::error::Error>),
}

impl From<NetworkError> for CliError {
    fn from(e: NetworkError) -> Self {
        CliError::Network(e)
    }
}

fn other(e: impl std::error::Error + 'static) -> CliError {
    CliError::Other(Box::new(e))
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value).map_err(other)?);
    Ok(())
}

async fn show_probe(probe: &ProbeController, injection: Option<FailureInjection>) -> Result<(), CliError> {
    let status = match injection {
        Some(injection) => probe.configure(injection).await?,
        None => probe.refresh().await?,
    };
    print_json(&ProbeView::new(probe.title(), probe.path(), &status))
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config = resolve_config(cli.config.as_deref(), cli.url.as_deref()).map_err(other)?;
    let console = Console::new(config).map_err(other)?;

    match cli.command {
        Commands::Probe { kind, injection } => {
            let probe = match kind {
                ProbeKind::Liveness => console.liveness(),
                ProbeKind::Readiness => console.readiness(),
            };
            show_probe(probe, injection).await?;
        }
        Commands::Workload { assignments } => {
            let workload = console.workload();
            workload.refresh().await?;
            if !assignments.is_empty() {
                for assignment in &assignments {
                    let (field, value) = assignment
                        .split_once('=')
                        .ok_or_else(|| CliError::Other(format!("expected field=value, got '{assignment}'").into()))?;
                    let field: WorkloadField = field.parse().map_err(other)?;
                    workload.edit_field(field, value).map_err(other)?;
                }
                workload.submit().await?;
            }
            print_json(&workload.view())?;
        }
        Commands::Queue { action } => {
            let queue = console.queue();
            match action {
                QueueAction::Stats => {
                    queue.refresh().await?;
                }
                QueueAction::Create { queue: name } => queue.create(&name).await?,
                QueueAction::Delete { queue: name } => queue.delete(&name).await?,
                QueueAction::Drain { queue: name } => queue.drain(&name).await?,
                QueueAction::Enqueue { queue: name, body } => {
                    print_json(&queue.enqueue(&name, &body).await?)?;
                }
                QueueAction::Dequeue { queue: name } => match queue.dequeue(&name).await? {
                    Some(message) => print_json(&message)?,
                    None => println!("queue '{name}' is empty"),
                },
            }
            print_json(&queue.queues())?;
        }
        Commands::Mem { action } => {
            let memory = console.memory();
            match action {
                Some(MemAction::Alloc { bytes }) => memory.allocate(bytes).await?,
                Some(MemAction::Clear) => memory.clear().await?,
                None => {}
            }
            print_json(&summarize(&memory.refresh().await?))?;
        }
        Commands::Env => {
            print_json(&console.env().load().await?)?;
        }
        Commands::Dns { name, record_type } => {
            let response = console.dns().query(&DnsQuery { record_type, name }).await?;
            println!("{}", response.result);
        }
    }

    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(CliError::Network(e)) => {
            eprintln!("Error: server unavailable: {e}");
            ExitCode::FAILURE
        }
        Err(CliError::Other(e)) => {
            eprintln!("Error: {e}");
            ExitCode::from(2)
        }
    }
}
