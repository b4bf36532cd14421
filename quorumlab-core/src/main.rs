use std::error::Error;
use std::path::Path;

use clap::Parser;
use quorumlab::cli::{BftAction, Cli, Commands, GlobalArgs, RaftAction, DEFAULT_LOG_FILTER};
use quorumlab::{save_audit, AuditData, Scenario, ScenarioReport, SimConfig, Simulator};
use quorumlab_bloom::BloomFilter;
use quorumlab_common::{EventSink, ProtocolEvent, SimError};
use quorumlab_consensus::{Operation, OperationOutcome, ProtocolKind};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let _guard = init_tracing(cli.global.log_file.as_deref());

    let result = match cli.command {
        Commands::InitConfig { path } => init_config(&path),
        Commands::Bloom { add, check, size, hashes } => {
            run_bloom(&add, &check, size, hashes);
            Ok(())
        }
        command => run_simulation(&cli.global, command).await,
    };

    if let Err(e) = &result {
        error!("❌ {}", e);
    }
    result
}

/// Stdout gets everything but the `consensus` mirror, which the renderer
/// already prints. The optional file captures only `consensus`.
fn init_tracing(log_file: Option<&Path>) -> Option<WorkerGuard> {
    use tracing_subscriber::prelude::*;

    let (consensus_layer, guard) = match log_file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let name = path
                .file_name()
                .map(|n| n.to_os_string())
                .unwrap_or_else(|| "consensus.log".into());
            let file_appender = tracing_appender::rolling::never(dir, name);
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_filter(tracing_subscriber::filter::filter_fn(|metadata| {
                    metadata.target() == "consensus"
                }));
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let stdout_layer = tracing_subscriber::fmt::layer().with_filter(
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
    );

    tracing_subscriber::registry()
        .with(consensus_layer)
        .with(stdout_layer)
        .init();

    guard
}

fn init_config(path: &Path) -> Result<(), Box<dyn Error>> {
    SimConfig::default().save_to_file(path)?;
    info!("📝 Default config written to {}", path.display());
    Ok(())
}

fn run_bloom(add: &[String], check: &[String], size: usize, hashes: usize) {
    let mut bf = BloomFilter::new(size, hashes);
    for item in add {
        bf.add(item);
        println!("➕ Added '{}'.", item);
    }
    for item in check {
        println!("🔎 '{}': {}", item, bf.check(item));
    }

    println!("Filter Size: {} bits | Hash Functions: {}", bf.size(), bf.hashes());
    println!("Items Added: {:?}", bf.items());
    println!("{}", bf.bit_string());
    println!(
        "Estimated false positive rate: {:.2}%",
        bf.estimated_false_positive_rate() * 100.0
    );
}

/// Prints events as they arrive and hands the full stream back once every
/// sender is gone.
fn spawn_renderer(mut rx: UnboundedReceiver<ProtocolEvent>) -> JoinHandle<Vec<ProtocolEvent>> {
    tokio::spawn(async move {
        let mut seen = Vec::new();
        while let Some(event) = rx.recv().await {
            println!("{}", event);
            seen.push(event);
        }
        seen
    })
}

async fn run_simulation(global: &GlobalArgs, command: Commands) -> Result<(), Box<dyn Error>> {
    let mut config = match &global.config {
        Some(path) => SimConfig::load_from_file(path)?,
        None => SimConfig::default(),
    };
    config.apply(&global.overrides());
    info!("--- QUORUMLAB: {} nodes, quorum {} ---", config.nodes, config.quorum_policy().quorum_size);

    let (events, rx) = EventSink::channel();
    let renderer = spawn_renderer(rx);

    let mut sim = Simulator::from_config(&config, events)?;
    sim.inject_faults(&global.crash, &global.byzantine)?;

    let result = execute(&mut sim, command).await;
    if let Err(e) = &result {
        for group in e.groups() {
            println!("   {}", group);
        }
    }

    let mut audit = AuditData::capture(&sim, Vec::new());
    // Dropping the simulator closes the last event sender.
    drop(sim);
    audit.events = renderer.await?;

    if let Some(path) = &global.audit_out {
        audit.scenario = result.as_ref().ok().cloned().flatten();
        save_audit(path, &audit)?;
        info!("🗂️ Audit written to {}", path.display());
    }

    result.map(|_| ()).map_err(Into::into)
}

async fn execute(sim: &mut Simulator, command: Commands) -> Result<Option<ScenarioReport>, SimError> {
    match command {
        Commands::Bft { action } => {
            let operation = match action {
                BftAction::Write { key, value } => Operation::Write { key, value },
                BftAction::Read { key } => Operation::Read { key },
            };
            print_outcome(&sim.run(ProtocolKind::Bft, operation).await?)?;
        }
        Commands::Raft { action } => match action {
            RaftAction::Elect => {
                print_outcome(&sim.run(ProtocolKind::Raft, Operation::Elect).await?)?;
            }
            RaftAction::Replicate { key, value, elect } => {
                if elect {
                    print_outcome(&sim.run(ProtocolKind::Raft, Operation::Elect).await?)?;
                }
                print_outcome(&sim.run(ProtocolKind::Raft, Operation::Replicate { key, value }).await?)?;
            }
        },
        Commands::TwoPhase { key, value } => {
            print_outcome(&sim.run(ProtocolKind::TwoPhase, Operation::Transaction { key, value }).await?)?;
        }
        Commands::Scenario { path } => {
            let scenario = Scenario::load_from_file(&path)?;
            let report = sim.run_scenario(&scenario).await;
            println!("{}", serde_json::to_string_pretty(&report)?);
            return Ok(Some(report));
        }
        Commands::Status => print_status(sim),
        Commands::InitConfig { .. } | Commands::Bloom { .. } => {}
    }
    Ok(None)
}

fn print_outcome(outcome: &OperationOutcome) -> Result<(), SimError> {
    println!("{}", serde_json::to_string_pretty(outcome)?);
    Ok(())
}

fn print_status(sim: &Simulator) {
    let raft = sim.raft();
    match raft.leader() {
        Some(leader) => println!("Raft term {} | leader: Node {}", raft.term(), leader),
        None => println!("Raft term {} | leader: none", raft.term()),
    }
    for view in sim.cluster().view() {
        let state = match &view.state {
            Some(state) => serde_json::to_string(state).unwrap_or_default(),
            None => "(unavailable)".to_string(),
        };
        println!("Node {} [{}] {}", view.id, view.status, state);
    }
}
